//! Code generation from AST to stack-machine bytecode.
//!
//! The generator walks the tree recursively and appends to the currently
//! open unit. The value discipline is strict: a node visited in expression
//! position leaves exactly one value on the evaluation stack, a node visited
//! in statement position leaves zero.

mod fold;


use tracing::debug;

use crate::Error;
use crate::ast::*;
use crate::compiler::assembler::{Assembler, ObjectFile, Unit};
use crate::compiler::bytecode::{Instruction, Label, OpCode, Operand};

/// Jump targets of one enclosing loop.
#[derive(Debug, Clone, Copy)]
struct LoopLabels {
    /// Where break lands
    end: Label,
    /// Where continue lands (the loop test)
    test: Label,
}

/// Per-compilation mutable state threaded through the walk.
#[derive(Debug, Default)]
struct Context {
    /// Whether the open unit is the toplevel program
    toplevel: bool,
    /// Enclosing loops, innermost last
    loops: Vec<LoopLabels>,
}

/// Compiles a resolved program into an object file.
///
/// Each globally declared function becomes its own unit; the remaining
/// toplevel statements become the program unit. Compilation is synchronous
/// and single-threaded; the active assembler handle is held exclusively by
/// the in-progress unit and released on every exit path.
pub struct CodeGenerator {
    object_file: ObjectFile,
    asm: Option<Assembler>,
    context: Context,
}

impl CodeGenerator {
    /// Creates a new code generator.
    pub fn new() -> Self {
        Self {
            object_file: ObjectFile::new(),
            asm: None,
            context: Context::default(),
        }
    }

    /// Compiles `program` and returns the populated object file.
    pub fn compile(mut self, program: &Program) -> Result<ObjectFile, Error> {
        for function in &program.functions {
            self.compile_function(function)?;
        }
        self.compile_toplevel(program)?;
        Ok(self.object_file)
    }

    fn compile_function(&mut self, function: &FunctionDeclaration) -> Result<(), Error> {
        if self.object_file.function(&function.name).is_some() {
            return Err(Error::Semantic(format!(
                "function '{}' declared twice",
                function.name
            )));
        }
        debug!(function = %function.name, "compiling function unit");

        let unit = self.open_unit(
            function.scope.clone(),
            &function.source_name,
            function.line,
            |this| {
                for statement in &function.body {
                    this.emit_statement(statement)?;
                }
                Ok(())
            },
        )?;
        self.object_file.add_function(&function.name, unit);
        Ok(())
    }

    fn compile_toplevel(&mut self, program: &Program) -> Result<(), Error> {
        debug!(source = %program.source_name, "compiling toplevel unit");
        self.context.toplevel = true;
        let outcome = self.open_unit(
            program.scope.clone(),
            &program.source_name,
            program.line,
            |this| {
                for statement in &program.body {
                    this.emit_statement(statement)?;
                }
                Ok(())
            },
        );
        self.context.toplevel = false;
        self.object_file.set_toplevel(outcome?);
        Ok(())
    }

    /// Opens a fresh unit, emits its body, and always seals it.
    ///
    /// The body's error takes precedence over a sealing error; a unit whose
    /// body failed is sealed but never returned for registration.
    fn open_unit<F>(
        &mut self,
        scope: Scope,
        source_name: &str,
        line: u32,
        body: F,
    ) -> Result<Unit, Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Error>,
    {
        self.asm = Some(Assembler::new(Unit::new(
            scope,
            source_name.to_string(),
            line,
        )));
        let outcome = body(self);
        let sealed = match self.asm.take() {
            Some(asm) => asm.stop(),
            None => Err(Error::Internal(
                "active unit vanished during compilation".to_string(),
            )),
        };
        outcome?;
        sealed
    }

    /// The assembler of the currently open unit.
    fn asm(&mut self) -> Result<&mut Assembler, Error> {
        self.asm
            .as_mut()
            .ok_or_else(|| Error::Internal("no unit open for emission".to_string()))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn emit_statement(&mut self, statement: &Statement) -> Result<(), Error> {
        match statement {
            Statement::Expression(stmt) => {
                self.emit_expression(&stmt.expression)?;
                self.pop_statement_value()
            }
            Statement::Empty => Ok(()),
            Statement::Block(block) => {
                for statement in &block.body {
                    self.emit_statement(statement)?;
                }
                Ok(())
            }
            Statement::Return(stmt) => {
                self.emit_expression(&stmt.argument)?;
                self.asm()?.emit(Instruction::simple(OpCode::Return));
                Ok(())
            }
            Statement::While(stmt) => self.emit_while(stmt),
            Statement::Break => {
                let labels = self.innermost_loop("break")?;
                self.asm()?.emit(Instruction::with_operand(
                    OpCode::Goto,
                    Operand::Target(labels.end),
                ));
                Ok(())
            }
            Statement::Continue => {
                let labels = self.innermost_loop("continue")?;
                self.asm()?.emit(Instruction::with_operand(
                    OpCode::Goto,
                    Operand::Target(labels.test),
                ));
                Ok(())
            }
            Statement::FunctionDeclaration(function) => {
                if self.context.toplevel {
                    // Already compiled into its own unit by the first pass.
                    Ok(())
                } else {
                    Err(Error::Semantic(format!(
                        "nested function '{}' is not allowed",
                        function.name
                    )))
                }
            }
            Statement::VariableDeclaration(_) => {
                Err(Error::NotImplemented("variable declaration"))
            }
            Statement::If(_) => Err(Error::NotImplemented("if statement")),
            Statement::DoWhile(_) => Err(Error::NotImplemented("do-while statement")),
            Statement::For(_) => Err(Error::NotImplemented("for statement")),
            Statement::ForIn(_) => Err(Error::NotImplemented("for-in statement")),
            Statement::Switch(_) => Err(Error::NotImplemented("switch statement")),
            Statement::Labeled(_) => Err(Error::NotImplemented("labeled statement")),
            Statement::Try(_) => Err(Error::NotImplemented("try statement")),
            Statement::Throw(_) => Err(Error::NotImplemented("throw statement")),
            Statement::With(_) => Err(Error::NotImplemented("with statement")),
        }
    }

    /// Discards a statement's value. The toplevel unit publishes the value
    /// as the program result; function units discard it outright.
    fn pop_statement_value(&mut self) -> Result<(), Error> {
        let opcode = if self.context.toplevel {
            OpCode::PopV
        } else {
            OpCode::Pop
        };
        self.asm()?.emit(Instruction::simple(opcode));
        Ok(())
    }

    /// Lowers `while (test) body` as a bottom-tested loop reached through an
    /// initial jump to the test, so the condition still runs before any
    /// iteration:
    ///
    /// ```text
    ///         goto test
    /// body:   <body>
    /// test:   <test>
    ///         ifeq end
    ///         goto body
    /// end:
    /// ```
    fn emit_while(&mut self, stmt: &WhileStatement) -> Result<(), Error> {
        let asm = self.asm()?;
        let end = asm.lazy_location();
        let test = asm.lazy_location();

        self.context.loops.push(LoopLabels { end, test });
        let outcome = self.emit_loop_shape(stmt, end, test);
        self.context.loops.pop();
        outcome
    }

    fn emit_loop_shape(&mut self, stmt: &WhileStatement, end: Label, test: Label) -> Result<(), Error> {
        let asm = self.asm()?;
        asm.emit(Instruction::with_operand(
            OpCode::Goto,
            Operand::Target(test),
        ));
        let body_start = asm.location();

        self.emit_statement(&stmt.body)?;

        self.asm()?.fix_location(test)?;
        self.emit_expression(&stmt.test)?;

        let asm = self.asm()?;
        asm.emit(Instruction::with_operand(
            OpCode::IfEq,
            Operand::Target(end),
        ));
        asm.emit(Instruction::with_operand(
            OpCode::Goto,
            Operand::Target(body_start),
        ));
        asm.fix_location(end)?;
        Ok(())
    }

    fn innermost_loop(&self, keyword: &str) -> Result<LoopLabels, Error> {
        self.context
            .loops
            .last()
            .copied()
            .ok_or_else(|| Error::Semantic(format!("{keyword} outside of a loop")))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn emit_expression(&mut self, expression: &Expression) -> Result<(), Error> {
        match expression {
            Expression::Literal(literal) => self.emit_literal(literal),
            Expression::Identifier(reference) => self.emit_identifier(reference),
            Expression::This => {
                self.asm()?.emit(Instruction::simple(OpCode::This));
                Ok(())
            }
            Expression::Grouping(inner) => self.emit_expression(inner),
            Expression::Binary(bin) => self.emit_binary(bin),
            Expression::Unary(unary) => self.emit_unary(unary),
            Expression::Conditional(cond) => self.emit_conditional(cond),
            Expression::Call(call) => self.emit_call(call),
            Expression::Comma(comma) => {
                self.emit_expression(&comma.left)?;
                self.asm()?.emit(Instruction::simple(OpCode::Pop));
                self.emit_expression(&comma.right)
            }
            Expression::Assignment(_) => Err(Error::NotImplemented("assignment expression")),
            Expression::Update(update) => Err(Error::NotImplemented(if update.prefix {
                "prefix increment/decrement"
            } else {
                "postfix increment/decrement"
            })),
            Expression::Member(_) => Err(Error::NotImplemented("member access")),
            Expression::New(_) => Err(Error::NotImplemented("new expression")),
            Expression::Array(_) => Err(Error::NotImplemented("array literal")),
            Expression::Object(_) => Err(Error::NotImplemented("object literal")),
            Expression::Function(_) => Err(Error::NotImplemented("function expression")),
        }
    }

    fn emit_literal(&mut self, literal: &Literal) -> Result<(), Error> {
        let instruction = match literal {
            Literal::Number(value) => Instruction::number(*value),
            Literal::String(value) => {
                Instruction::with_operand(OpCode::String, Operand::Str(value.clone()))
            }
            Literal::Boolean(true) => Instruction::simple(OpCode::True),
            Literal::Boolean(false) => Instruction::simple(OpCode::False),
            Literal::Null => Instruction::simple(OpCode::Null),
            Literal::RegExp { .. } => return Err(Error::NotImplemented("regexp literal")),
        };
        self.asm()?.emit(instruction);
        Ok(())
    }

    fn emit_identifier(&mut self, reference: &IdentifierReference) -> Result<(), Error> {
        let instruction = match &reference.variable {
            Variable::Parameter { index } => {
                Instruction::with_operand(OpCode::GetArg, Operand::Arg(*index))
            }
            Variable::Global => {
                Instruction::with_operand(OpCode::GetGname, Operand::Atom(reference.name.clone()))
            }
            Variable::Local { .. } => {
                return Err(Error::NotImplemented("local variable reference"));
            }
        };
        self.asm()?.emit(instruction);
        Ok(())
    }

    /// Only direct global-name callees are supported: push the function by
    /// name, evaluate arguments left to right, then call.
    fn emit_call(&mut self, call: &CallExpression) -> Result<(), Error> {
        let name = match call.callee.as_ref() {
            Expression::Identifier(reference)
                if reference.variable == Variable::Global =>
            {
                reference.name.clone()
            }
            Expression::Identifier(_) => {
                return Err(Error::NotImplemented("call through a non-global binding"));
            }
            _ => return Err(Error::NotImplemented("computed callee")),
        };
        let argc = u8::try_from(call.arguments.len())
            .map_err(|_| Error::Semantic("more than 255 call arguments".to_string()))?;

        self.asm()?.emit(Instruction::with_operand(
            OpCode::CallGname,
            Operand::Atom(name),
        ));
        for argument in &call.arguments {
            self.emit_expression(argument)?;
        }
        self.asm()?.emit(Instruction::with_operand(
            OpCode::Call,
            Operand::ArgCount(argc),
        ));
        Ok(())
    }

    /// Lowers `test ? consequent : alternate`; exactly one branch's code
    /// runs and either way one value remains.
    fn emit_conditional(&mut self, cond: &ConditionalExpression) -> Result<(), Error> {
        self.emit_expression(&cond.test)?;

        let asm = self.asm()?;
        let else_branch = asm.lazy_location();
        let end = asm.lazy_location();
        asm.emit(Instruction::with_operand(
            OpCode::IfEq,
            Operand::Target(else_branch),
        ));

        self.emit_expression(&cond.consequent)?;

        let asm = self.asm()?;
        asm.emit(Instruction::with_operand(
            OpCode::Goto,
            Operand::Target(end),
        ));
        asm.fix_location(else_branch)?;

        self.emit_expression(&cond.alternate)?;

        self.asm()?.fix_location(end)?;
        Ok(())
    }

    fn emit_binary(&mut self, bin: &BinaryExpression) -> Result<(), Error> {
        let opcode = match bin.operator {
            BinaryOperator::Add => return self.emit_addition(bin),
            BinaryOperator::Subtract => OpCode::Sub,
            BinaryOperator::Multiply => OpCode::Mul,
            BinaryOperator::Divide => OpCode::Div,
            BinaryOperator::Modulo => OpCode::Mod,
            BinaryOperator::Equal => OpCode::Eq,
            BinaryOperator::NotEqual => OpCode::Ne,
            BinaryOperator::StrictEqual => OpCode::StrictEq,
            BinaryOperator::StrictNotEqual => OpCode::StrictNe,
            BinaryOperator::Greater => OpCode::Gt,
            BinaryOperator::GreaterOrEqual => OpCode::Ge,
            BinaryOperator::Less => OpCode::Lt,
            BinaryOperator::LessOrEqual => OpCode::Le,
            BinaryOperator::LogicalAnd => OpCode::And,
            BinaryOperator::LogicalOr => OpCode::Or,
            BinaryOperator::BitwiseAnd => return Err(Error::NotImplemented("bitwise and")),
            BinaryOperator::BitwiseOr => return Err(Error::NotImplemented("bitwise or")),
            BinaryOperator::BitwiseXor => return Err(Error::NotImplemented("bitwise xor")),
            BinaryOperator::LeftShift => return Err(Error::NotImplemented("left shift")),
            BinaryOperator::RightShift => return Err(Error::NotImplemented("right shift")),
            BinaryOperator::UnsignedRightShift => {
                return Err(Error::NotImplemented("unsigned right shift"));
            }
            BinaryOperator::In => return Err(Error::NotImplemented("in operator")),
            BinaryOperator::InstanceOf => {
                return Err(Error::NotImplemented("instanceof operator"));
            }
        };

        self.emit_expression(&bin.left)?;
        self.emit_expression(&bin.right)?;
        self.asm()?.emit(Instruction::simple(opcode));
        Ok(())
    }

    /// Emits an addition, folding literal chains first.
    ///
    /// A fully folded chain becomes one literal push. A rebuilt node emits
    /// its right slot before its left slot; combined with the operand swap
    /// in [`fold::fold_addition`] this reproduces the operand order the
    /// compiled output is contracted to. The ordering is observable with
    /// side-effecting operands and must not be normalized.
    fn emit_addition(&mut self, bin: &BinaryExpression) -> Result<(), Error> {
        match fold::fold_addition(bin) {
            fold::Folded::Literal(value) => {
                self.asm()?.emit(Instruction::number(value));
                Ok(())
            }
            fold::Folded::Composite(Expression::Binary(rebuilt)) => {
                self.emit_expression(&rebuilt.right)?;
                self.emit_expression(&rebuilt.left)?;
                self.asm()?.emit(Instruction::simple(OpCode::Add));
                Ok(())
            }
            fold::Folded::Composite(other) => self.emit_expression(&other),
        }
    }

    fn emit_unary(&mut self, unary: &UnaryExpression) -> Result<(), Error> {
        match unary.operator {
            UnaryOperator::Plus => self.emit_expression(&unary.argument),
            UnaryOperator::Minus => {
                if let Expression::Literal(Literal::Number(value)) = unary.argument.as_ref() {
                    self.asm()?.emit(Instruction::number(-value));
                } else {
                    self.emit_expression(&unary.argument)?;
                    self.asm()?.emit(Instruction::simple(OpCode::Neg));
                }
                Ok(())
            }
            UnaryOperator::LogicalNot => Err(Error::NotImplemented("logical not")),
            UnaryOperator::BitwiseNot => Err(Error::NotImplemented("bitwise not")),
            UnaryOperator::Typeof => Err(Error::NotImplemented("typeof operator")),
            UnaryOperator::Void => Err(Error::NotImplemented("void operator")),
            UnaryOperator::Delete => Err(Error::NotImplemented("delete operator")),
        }
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}
