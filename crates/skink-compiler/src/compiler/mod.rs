//! Bytecode compiler for the JavaScript subset.
//!
//! Transforms a resolved AST into stack-machine instruction streams.
//!
//! # Module Structure
//!
//! - `bytecode`: instruction, opcode and operand definitions
//! - `assembler`: instruction emission, jump patching, compiled units
//! - `codegen`: code generation from AST
//!   - `codegen::fold`: constant folding over additive chains

pub mod assembler;
pub mod bytecode;
pub mod codegen;

pub use assembler::{Assembler, ObjectFile, Unit};
pub use bytecode::{Instruction, Label, OpCode, Operand};
pub use codegen::CodeGenerator;
