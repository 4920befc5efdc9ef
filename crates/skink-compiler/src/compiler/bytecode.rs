//! Bytecode definitions for the stack machine.

/// A forward jump target allocated before its address is known.
///
/// Labels index the owning assembler's relocation table. Each label must be
/// fixed to an address exactly once before its unit is sealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(pub(crate) usize);

/// A single bytecode instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The operation code
    pub opcode: OpCode,
    /// Optional operand
    pub operand: Option<Operand>,
}

impl Instruction {
    /// Creates a new instruction with no operand.
    pub fn simple(opcode: OpCode) -> Self {
        Self {
            opcode,
            operand: None,
        }
    }

    /// Creates a new instruction with an operand.
    pub fn with_operand(opcode: OpCode, operand: Operand) -> Self {
        Self {
            opcode,
            operand: Some(operand),
        }
    }

    /// Selects the smallest push form that holds a numeric literal.
    ///
    /// The forms are semantically interchangeable; this is purely a size
    /// optimization. Classification is by range, mirroring the encoding
    /// boundaries of the instruction set: `1` has a dedicated opcode, then
    /// 8-bit signed, 16-bit unsigned, 24-bit unsigned, 32-bit signed.
    pub fn number(value: f64) -> Self {
        if value == 1.0 {
            Instruction::simple(OpCode::One)
        } else if (-128.0..=127.0).contains(&value) {
            Instruction::with_operand(OpCode::Int8, Operand::Int8(value as i8))
        } else if (0.0..=65535.0).contains(&value) {
            Instruction::with_operand(OpCode::Uint16, Operand::Uint16(value as u16))
        } else if (0.0..16777216.0).contains(&value) {
            Instruction::with_operand(OpCode::Uint24, Operand::Uint24(value as u32))
        } else {
            Instruction::with_operand(OpCode::Int32, Operand::Int32(value as i32))
        }
    }
}

/// Instruction operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Argument slot index
    Arg(u16),
    /// Interned global name
    Atom(String),
    /// Number of call arguments
    ArgCount(u8),
    /// 8-bit signed literal
    Int8(i8),
    /// 16-bit unsigned literal
    Uint16(u16),
    /// 24-bit unsigned literal
    Uint24(u32),
    /// 32-bit signed literal
    Int32(i32),
    /// String literal payload
    Str(String),
    /// Unresolved jump target; replaced by `Jump` when the unit is sealed
    Target(Label),
    /// Resolved jump address (instruction index within the unit)
    Jump(u32),
}

/// Operation codes for the stack machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    // Stack discipline
    /// Discard the top value
    Pop,
    /// Discard the top value, publishing it as the program result
    PopV,

    // Literal pushes
    /// Push the number one
    One,
    /// Push an 8-bit signed literal
    Int8,
    /// Push a 16-bit unsigned literal
    Uint16,
    /// Push a 24-bit unsigned literal
    Uint24,
    /// Push a 32-bit signed literal
    Int32,
    /// Push a string literal
    String,
    /// Push null
    Null,
    /// Push true
    True,
    /// Push false
    False,
    /// Push the this binding
    This,

    // Variable access
    /// Push an argument by slot index
    GetArg,
    /// Push a global by name
    GetGname,

    // Calls
    /// Push a global function (and its this) by name, ahead of a call
    CallGname,
    /// Call with an argument count
    Call,
    /// Return the top value from the current unit
    Return,

    // Arithmetic
    /// Add top two values
    Add,
    /// Subtract
    Sub,
    /// Multiply
    Mul,
    /// Divide
    Div,
    /// Modulo
    Mod,
    /// Negate (unary minus)
    Neg,

    // Comparison
    /// Equal (==)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Strict equal (===)
    StrictEq,
    /// Strict not equal (!==)
    StrictNe,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
    /// Less than
    Lt,
    /// Less than or equal
    Le,

    // Logical
    /// Logical AND
    And,
    /// Logical OR
    Or,

    // Control flow
    /// Unconditional jump
    Goto,
    /// Jump if the top value is false
    IfEq,

    // Termination
    /// Terminate the unit
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_one_has_dedicated_form() {
        assert_eq!(Instruction::number(1.0), Instruction::simple(OpCode::One));
    }

    #[test]
    fn test_number_int8_boundaries() {
        assert_eq!(
            Instruction::number(127.0),
            Instruction::with_operand(OpCode::Int8, Operand::Int8(127))
        );
        assert_eq!(
            Instruction::number(-128.0),
            Instruction::with_operand(OpCode::Int8, Operand::Int8(-128))
        );
        assert_eq!(
            Instruction::number(128.0),
            Instruction::with_operand(OpCode::Uint16, Operand::Uint16(128))
        );
    }

    #[test]
    fn test_number_uint16_boundaries() {
        assert_eq!(
            Instruction::number(65535.0),
            Instruction::with_operand(OpCode::Uint16, Operand::Uint16(65535))
        );
        assert_eq!(
            Instruction::number(65536.0),
            Instruction::with_operand(OpCode::Uint24, Operand::Uint24(65536))
        );
    }

    #[test]
    fn test_number_uint24_boundaries() {
        assert_eq!(
            Instruction::number(16777215.0),
            Instruction::with_operand(OpCode::Uint24, Operand::Uint24(16777215))
        );
        assert_eq!(
            Instruction::number(16777216.0),
            Instruction::with_operand(OpCode::Int32, Operand::Int32(16777216))
        );
    }

    #[test]
    fn test_number_negative_below_int8_uses_int32() {
        // Negative values skip the unsigned forms entirely.
        assert_eq!(
            Instruction::number(-129.0),
            Instruction::with_operand(OpCode::Int32, Operand::Int32(-129))
        );
    }

    #[test]
    fn test_number_zero_is_int8() {
        assert_eq!(
            Instruction::number(0.0),
            Instruction::with_operand(OpCode::Int8, Operand::Int8(0))
        );
    }
}
