// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # skink-compiler
//!
//! An AST-to-bytecode compiler for a bounded JavaScript subset, targeting a
//! SpiderMonkey-style stack machine.
//!
//! ## Overview
//!
//! This crate takes a parsed, scope-resolved AST and lowers it into linear
//! instruction streams, one per compilation unit:
//! - every globally declared function becomes its own unit
//! - the remaining toplevel statements become the program unit
//!
//! Lexing, parsing, scope resolution, object-file serialization and the
//! executing VM are external collaborators. The compiler consumes an AST in
//! which every identifier reference already carries its resolved [`ast::Variable`],
//! and produces a populated [`ObjectFile`].
//!
//! Constructs outside the supported subset fail compilation with an error
//! naming the construct; nothing is ever silently miscompiled.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use skink_compiler::CodeGenerator;
//!
//! let program = parse_and_resolve(source)?;
//! let object_file = CodeGenerator::new().compile(&program)?;
//! let unit = object_file.toplevel().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod compiler;

// Re-exports for convenience
pub use compiler::assembler::{Assembler, ObjectFile, Unit};
pub use compiler::bytecode::{Instruction, Label, OpCode, Operand};
pub use compiler::codegen::CodeGenerator;

/// Errors produced while lowering an AST to bytecode.
///
/// All three kinds abort compilation of the enclosing unit immediately; none
/// are caught or retried inside the code generator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A recognized node kind that the compiled subset does not cover.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// A construct that is structurally disallowed where it appears.
    #[error("semantic error: {0}")]
    Semantic(String),

    /// A broken invariant in the generator itself or an upstream collaborator.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_the_construct() {
        let err = Error::NotImplemented("for statement");
        assert_eq!(err.to_string(), "not implemented: for statement");
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        assert_ne!(
            Error::NotImplemented("with statement"),
            Error::Semantic("with statement".into())
        );
    }
}
