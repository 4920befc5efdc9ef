//! End-to-end compilation tests over whole programs.

use skink_compiler::ast::*;
use skink_compiler::compiler::bytecode::{Instruction, OpCode, Operand};
use skink_compiler::{CodeGenerator, Error};

fn num(value: f64) -> Expression {
    Expression::Literal(Literal::Number(value))
}

fn param(name: &str, index: u16) -> Expression {
    Expression::Identifier(IdentifierReference {
        name: name.to_string(),
        variable: Variable::Parameter { index },
    })
}

fn global_call(name: &str, arguments: Vec<Expression>) -> Expression {
    Expression::Call(CallExpression {
        callee: Box::new(Expression::Identifier(IdentifierReference {
            name: name.to_string(),
            variable: Variable::Global,
        })),
        arguments,
    })
}

fn expr_stmt(expression: Expression) -> Statement {
    Statement::Expression(ExpressionStatement { expression })
}

/// function add1(x) { return x + 1; }
fn add1() -> FunctionDeclaration {
    FunctionDeclaration {
        name: "add1".to_string(),
        params: vec!["x".to_string()],
        body: vec![Statement::Return(ReturnStatement {
            argument: Expression::Binary(BinaryExpression {
                operator: BinaryOperator::Add,
                left: Box::new(param("x", 0)),
                right: Box::new(num(1.0)),
            }),
        })],
        scope: Scope {
            params: vec!["x".to_string()],
            locals: Vec::new(),
        },
        source_name: "adder.js".to_string(),
        line: 1,
    }
}

#[test]
fn test_program_compiles_to_function_and_toplevel_units() {
    // function add1(x) { return x + 1; }
    // add1(7);
    let program = Program {
        source_name: "adder.js".to_string(),
        line: 1,
        scope: Scope::default(),
        functions: vec![add1()],
        body: vec![
            Statement::FunctionDeclaration(add1()),
            expr_stmt(global_call("add1", vec![num(7.0)])),
        ],
    };

    let object_file = CodeGenerator::new().compile(&program).unwrap();
    assert_eq!(object_file.units().len(), 2);

    let function = object_file.function("add1").unwrap();
    assert_eq!(function.source_name, "adder.js");
    assert_eq!(function.scope.params, vec!["x".to_string()]);
    assert_eq!(
        function.instructions,
        vec![
            Instruction::with_operand(OpCode::GetArg, Operand::Arg(0)),
            Instruction::simple(OpCode::One),
            Instruction::simple(OpCode::Add),
            Instruction::simple(OpCode::Return),
            Instruction::simple(OpCode::Stop),
        ]
    );

    let toplevel = object_file.toplevel().unwrap();
    assert_eq!(
        toplevel.instructions,
        vec![
            Instruction::with_operand(OpCode::CallGname, Operand::Atom("add1".to_string())),
            Instruction::with_operand(OpCode::Int8, Operand::Int8(7)),
            Instruction::with_operand(OpCode::Call, Operand::ArgCount(1)),
            Instruction::simple(OpCode::PopV),
            Instruction::simple(OpCode::Stop),
        ]
    );
}

#[test]
fn test_countdown_loop_program() {
    // while (n) { print(n); }
    let n = || {
        Expression::Identifier(IdentifierReference {
            name: "n".to_string(),
            variable: Variable::Global,
        })
    };
    let program = Program {
        source_name: "loop.js".to_string(),
        line: 1,
        scope: Scope::default(),
        functions: Vec::new(),
        body: vec![Statement::While(WhileStatement {
            test: n(),
            body: Box::new(Statement::Block(BlockStatement {
                body: vec![expr_stmt(global_call("print", vec![n()]))],
            })),
        })],
    };

    let object_file = CodeGenerator::new().compile(&program).unwrap();
    let toplevel = object_file.toplevel().unwrap();
    assert_eq!(
        toplevel.instructions,
        vec![
            Instruction::with_operand(OpCode::Goto, Operand::Jump(5)),
            Instruction::with_operand(OpCode::CallGname, Operand::Atom("print".to_string())),
            Instruction::with_operand(OpCode::GetGname, Operand::Atom("n".to_string())),
            Instruction::with_operand(OpCode::Call, Operand::ArgCount(1)),
            Instruction::simple(OpCode::PopV),
            Instruction::with_operand(OpCode::GetGname, Operand::Atom("n".to_string())),
            Instruction::with_operand(OpCode::IfEq, Operand::Jump(8)),
            Instruction::with_operand(OpCode::Goto, Operand::Jump(1)),
            Instruction::simple(OpCode::Stop),
        ]
    );
}

#[test]
fn test_failed_unit_surfaces_the_error() {
    let program = Program {
        source_name: "bad.js".to_string(),
        line: 1,
        scope: Scope::default(),
        functions: Vec::new(),
        body: vec![Statement::Throw(ThrowStatement {
            argument: num(1.0),
        })],
    };

    let err = CodeGenerator::new().compile(&program).unwrap_err();
    assert_eq!(err, Error::NotImplemented("throw statement"));
}
