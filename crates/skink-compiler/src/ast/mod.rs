//! Abstract Syntax Tree definitions for the compiled JavaScript subset.
//!
//! The node set is closed: it covers every kind the upstream parser can
//! produce, including kinds the code generator refuses, so that dispatch is
//! exhaustive and a refusal can name the construct. Nodes are read-only
//! input; the compiler never mutates a tree it was given.
//!
//! Scope resolution happens upstream. Every identifier reference arrives
//! with its [`Variable`] already resolved, and every compilation unit
//! (function or toplevel) carries the [`Scope`] it was resolved against.

/// A complete program: globally declared functions plus toplevel statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Source file the program came from
    pub source_name: String,
    /// First source line of the program
    pub line: u32,
    /// The resolved global scope
    pub scope: Scope,
    /// Every globally declared function, in declaration order
    pub functions: Vec<FunctionDeclaration>,
    /// The toplevel statements. Function declarations still appear here and
    /// are skipped by the toplevel pass.
    pub body: Vec<Statement>,
}

/// A globally declared function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    /// The function name
    pub name: String,
    /// The parameter names, in order
    pub params: Vec<String>,
    /// The function body
    pub body: Vec<Statement>,
    /// The resolved scope of the body
    pub scope: Scope,
    /// Source file the function came from
    pub source_name: String,
    /// Source line of the declaration
    pub line: u32,
}

/// Resolved scope information produced by the upstream resolver.
///
/// Consumed read-only; it travels into the compiled unit for the benefit of
/// the (external) object-file serializer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    /// Parameter names, in slot order
    pub params: Vec<String>,
    /// Local variable names, in slot order
    pub locals: Vec<String>,
}

/// Resolved identifier information attached to every identifier reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variable {
    /// A function parameter and its argument slot
    Parameter {
        /// The argument slot index
        index: u16,
    },
    /// A function-local variable and its slot
    Local {
        /// The local slot index
        index: u16,
    },
    /// A global binding, referenced by the identifier's name
    Global,
}

/// An identifier reference with its resolved variable.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierReference {
    /// The referenced name
    pub name: String,
    /// What the resolver decided the name refers to
    pub variable: Variable,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Expression statement
    Expression(ExpressionStatement),
    /// Empty statement (;)
    Empty,
    /// Block statement { ... }
    Block(BlockStatement),
    /// Return statement
    Return(ReturnStatement),
    /// While statement
    While(WhileStatement),
    /// Break statement
    Break,
    /// Continue statement
    Continue,
    /// Function declaration
    FunctionDeclaration(FunctionDeclaration),
    /// Variable declaration (var)
    VariableDeclaration(VariableDeclaration),
    /// If statement
    If(IfStatement),
    /// Do-while statement
    DoWhile(DoWhileStatement),
    /// For statement
    For(ForStatement),
    /// For-in statement
    ForIn(ForInStatement),
    /// Switch statement
    Switch(SwitchStatement),
    /// Labeled statement
    Labeled(LabeledStatement),
    /// Try statement
    Try(TryStatement),
    /// Throw statement
    Throw(ThrowStatement),
    /// With statement
    With(WithStatement),
}

/// An expression statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    /// The expression
    pub expression: Expression,
}

/// A block statement.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    /// The statements in the block
    pub body: Vec<Statement>,
}

/// A return statement. The subset requires an operand.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    /// The returned expression
    pub argument: Expression,
}

/// A while statement.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    /// The loop condition
    pub test: Expression,
    /// The loop body
    pub body: Box<Statement>,
}

/// A variable declaration statement.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    /// The declarators
    pub declarations: Vec<VariableDeclarator>,
}

/// A single variable declarator.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    /// The declared name
    pub name: String,
    /// Optional initializer expression
    pub init: Option<Expression>,
}

/// An if statement.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    /// The condition
    pub test: Expression,
    /// The then branch
    pub consequent: Box<Statement>,
    /// The optional else branch
    pub alternate: Option<Box<Statement>>,
}

/// A do-while statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DoWhileStatement {
    /// The loop body
    pub body: Box<Statement>,
    /// The condition
    pub test: Expression,
}

/// A for statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    /// The initializer
    pub init: Option<ForInit>,
    /// The condition
    pub test: Option<Expression>,
    /// The update expression
    pub update: Option<Expression>,
    /// The loop body
    pub body: Box<Statement>,
}

/// For loop initializer.
#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    /// Variable declaration
    Declaration(VariableDeclaration),
    /// Expression
    Expression(Expression),
}

/// A for-in statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ForInStatement {
    /// The left-hand side
    pub left: Box<Expression>,
    /// The object iterated over
    pub right: Expression,
    /// The loop body
    pub body: Box<Statement>,
}

/// A switch statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStatement {
    /// The discriminant expression
    pub discriminant: Expression,
    /// The case clauses
    pub cases: Vec<SwitchCase>,
}

/// A switch case clause.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// The test expression (None for default)
    pub test: Option<Expression>,
    /// The consequent statements
    pub consequent: Vec<Statement>,
}

/// A labeled statement.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledStatement {
    /// The label name
    pub label: String,
    /// The labeled body
    pub body: Box<Statement>,
}

/// A try statement.
#[derive(Debug, Clone, PartialEq)]
pub struct TryStatement {
    /// The try block
    pub block: BlockStatement,
    /// The catch clause
    pub handler: Option<CatchClause>,
    /// The finally block
    pub finalizer: Option<BlockStatement>,
}

/// A catch clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// The error parameter name
    pub param: String,
    /// The catch body
    pub body: BlockStatement,
}

/// A throw statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStatement {
    /// The thrown expression
    pub argument: Expression,
}

/// A with statement.
#[derive(Debug, Clone, PartialEq)]
pub struct WithStatement {
    /// The scope object expression
    pub object: Expression,
    /// The body statement
    pub body: Box<Statement>,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal value
    Literal(Literal),
    /// Identifier reference with resolved variable
    Identifier(IdentifierReference),
    /// this keyword
    This,
    /// Parenthesized expression. Preserved by the parser; the constant
    /// folder unwraps it.
    Grouping(Box<Expression>),
    /// Binary expression
    Binary(BinaryExpression),
    /// Unary expression
    Unary(UnaryExpression),
    /// Conditional (ternary) expression
    Conditional(ConditionalExpression),
    /// Function call expression
    Call(CallExpression),
    /// Comma expression
    Comma(CommaExpression),
    /// Assignment expression
    Assignment(AssignmentExpression),
    /// Update expression (++/--)
    Update(UpdateExpression),
    /// Member access expression
    Member(MemberExpression),
    /// new expression
    New(NewExpression),
    /// Array literal
    Array(ArrayExpression),
    /// Object literal
    Object(ObjectExpression),
    /// Function expression
    Function(FunctionExpression),
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),
    /// null literal
    Null,
    /// Regular expression literal
    RegExp {
        /// The pattern source
        pattern: String,
        /// The flags
        flags: String,
    },
}

/// A binary expression.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    /// The operator
    pub operator: BinaryOperator,
    /// The left operand
    pub left: Box<Expression>,
    /// The right operand
    pub right: Box<Expression>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    // Comparison
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    // Logical
    LogicalAnd,
    LogicalOr,
    // Bitwise
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    LeftShift,
    RightShift,
    UnsignedRightShift,
    // Other
    In,
    InstanceOf,
}

/// A unary expression.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    /// The operator
    pub operator: UnaryOperator,
    /// The operand
    pub argument: Box<Expression>,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// -
    Minus,
    /// +
    Plus,
    /// !
    LogicalNot,
    /// ~
    BitwiseNot,
    /// typeof
    Typeof,
    /// void
    Void,
    /// delete
    Delete,
}

/// A conditional (ternary) expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpression {
    /// The condition
    pub test: Box<Expression>,
    /// The branch taken when the condition holds
    pub consequent: Box<Expression>,
    /// The branch taken otherwise
    pub alternate: Box<Expression>,
}

/// A function call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    /// The callee expression
    pub callee: Box<Expression>,
    /// The arguments, left to right
    pub arguments: Vec<Expression>,
}

/// A comma expression: evaluate left, discard it, yield right.
#[derive(Debug, Clone, PartialEq)]
pub struct CommaExpression {
    /// The discarded operand
    pub left: Box<Expression>,
    /// The operand whose value is the result
    pub right: Box<Expression>,
}

/// An assignment expression.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentExpression {
    /// The operator
    pub operator: AssignmentOperator,
    /// The assignment target
    pub left: Box<Expression>,
    /// The assigned value
    pub right: Box<Expression>,
}

/// Assignment operators, plain and compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum AssignmentOperator {
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
    ModuloAssign,
    BitwiseAndAssign,
    BitwiseOrAssign,
    BitwiseXorAssign,
    LeftShiftAssign,
    RightShiftAssign,
    UnsignedRightShiftAssign,
}

/// An update expression (++/--).
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpression {
    /// The operator
    pub operator: UpdateOperator,
    /// The operand
    pub argument: Box<Expression>,
    /// Whether prefix (++x) or postfix (x++)
    pub prefix: bool,
}

/// Update operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    /// ++
    Increment,
    /// --
    Decrement,
}

/// A member access expression.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpression {
    /// The object
    pub object: Box<Expression>,
    /// The accessed property
    pub property: MemberProperty,
}

/// Member property access forms.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// Dot access by name
    Identifier(String),
    /// Bracket access by computed expression
    Expression(Box<Expression>),
}

/// A new expression.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpression {
    /// The constructor expression
    pub callee: Box<Expression>,
    /// The arguments
    pub arguments: Vec<Expression>,
}

/// An array literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpression {
    /// The elements
    pub elements: Vec<Expression>,
}

/// An object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectExpression {
    /// The properties
    pub properties: Vec<Property>,
}

/// An object literal property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// The property key
    pub key: String,
    /// The property value
    pub value: Expression,
}

/// A function expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpression {
    /// Optional name
    pub name: Option<String>,
    /// The parameter names
    pub params: Vec<String>,
    /// The body
    pub body: Vec<Statement>,
}
