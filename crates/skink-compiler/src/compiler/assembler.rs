//! Instruction assembly, jump patching and compiled units.
//!
//! Jumps are emitted against lazily allocated [`Label`]s recorded in a
//! relocation table. Sealing a unit with [`Assembler::stop`] verifies that
//! every label was fixed and patches every `Target` operand into a concrete
//! `Jump` address in one pass.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::Error;
use crate::ast::Scope;
use crate::compiler::bytecode::{Instruction, Label, OpCode, Operand};

/// One compiled code object: a function body or the toplevel program.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    /// The resolved scope the unit was compiled against
    pub scope: Scope,
    /// Source file the unit came from
    pub source_name: String,
    /// First source line of the unit
    pub line: u32,
    /// The instruction stream, terminated by `Stop` once sealed
    pub instructions: Vec<Instruction>,
}

impl Unit {
    /// Creates an empty unit for the given scope and source position.
    pub fn new(scope: Scope, source_name: String, line: u32) -> Self {
        Self {
            scope,
            source_name,
            line,
            instructions: Vec::new(),
        }
    }
}

/// Emits instructions into one unit and resolves its jump targets.
#[derive(Debug)]
pub struct Assembler {
    unit: Unit,
    /// Relocation table: label index to resolved instruction address
    labels: Vec<Option<u32>>,
}

impl Assembler {
    /// Creates an assembler writing into `unit`.
    pub fn new(unit: Unit) -> Self {
        Self {
            unit,
            labels: Vec::new(),
        }
    }

    /// Appends an instruction and returns its index.
    pub fn emit(&mut self, instruction: Instruction) -> usize {
        let index = self.unit.instructions.len();
        self.unit.instructions.push(instruction);
        index
    }

    /// Allocates a jump target whose address is not yet known.
    pub fn lazy_location(&mut self) -> Label {
        let label = Label(self.labels.len());
        self.labels.push(None);
        label
    }

    /// Binds a label to the current emission position.
    ///
    /// Each label may be fixed at most once; a second fix is a defect in the
    /// caller.
    pub fn fix_location(&mut self, label: Label) -> Result<(), Error> {
        let slot = self
            .labels
            .get_mut(label.0)
            .ok_or_else(|| Error::Internal(format!("unknown jump target {}", label.0)))?;
        if slot.is_some() {
            return Err(Error::Internal(format!(
                "jump target {} fixed twice",
                label.0
            )));
        }
        *slot = Some(self.unit.instructions.len() as u32);
        Ok(())
    }

    /// Returns a label already bound to the current emission position, for
    /// backward jumps.
    pub fn location(&mut self) -> Label {
        let label = Label(self.labels.len());
        self.labels.push(Some(self.unit.instructions.len() as u32));
        label
    }

    /// Seals the unit: emits the terminator and resolves every jump.
    ///
    /// Fails if any label allocated during compilation was never fixed.
    pub fn stop(mut self) -> Result<Unit, Error> {
        self.emit(Instruction::simple(OpCode::Stop));

        if let Some(unfixed) = self.labels.iter().position(|slot| slot.is_none()) {
            return Err(Error::Internal(format!(
                "jump target {unfixed} never fixed in unit from {}:{}",
                self.unit.source_name, self.unit.line
            )));
        }

        for instruction in &mut self.unit.instructions {
            if let Some(Operand::Target(label)) = instruction.operand {
                // Every label is fixed at this point.
                let address = self.labels[label.0].unwrap_or_default();
                instruction.operand = Some(Operand::Jump(address));
            }
        }

        debug!(
            source = %self.unit.source_name,
            line = self.unit.line,
            instructions = self.unit.instructions.len(),
            "sealed unit"
        );
        Ok(self.unit)
    }
}

/// Container of compiled units produced by one code-generator run.
///
/// Holds one unit per global function, indexed by name, plus the toplevel
/// program unit. Serialization to a persisted object file happens elsewhere.
#[derive(Debug, Default)]
pub struct ObjectFile {
    units: Vec<Unit>,
    functions: FxHashMap<String, usize>,
    toplevel: Option<usize>,
}

impl ObjectFile {
    /// Creates an empty object file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sealed function unit under its name.
    pub fn add_function(&mut self, name: &str, unit: Unit) {
        let index = self.units.len();
        self.units.push(unit);
        self.functions.insert(name.to_string(), index);
    }

    /// Registers the sealed toplevel unit.
    pub fn set_toplevel(&mut self, unit: Unit) {
        let index = self.units.len();
        self.units.push(unit);
        self.toplevel = Some(index);
    }

    /// Looks up a function unit by name.
    pub fn function(&self, name: &str) -> Option<&Unit> {
        self.functions.get(name).map(|&index| &self.units[index])
    }

    /// Returns the toplevel program unit, if compiled.
    pub fn toplevel(&self) -> Option<&Unit> {
        self.toplevel.map(|index| &self.units[index])
    }

    /// All units in compilation order (functions first, toplevel last).
    pub fn units(&self) -> &[Unit] {
        &self.units
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_unit() -> Unit {
        Unit::new(Scope::default(), "test.js".to_string(), 1)
    }

    #[test]
    fn test_stop_terminates_the_stream() {
        let mut asm = Assembler::new(empty_unit());
        asm.emit(Instruction::simple(OpCode::Null));
        let unit = asm.stop().unwrap();
        assert_eq!(unit.instructions.last().unwrap().opcode, OpCode::Stop);
    }

    #[test]
    fn test_forward_jump_is_patched() {
        let mut asm = Assembler::new(empty_unit());
        let target = asm.lazy_location();
        asm.emit(Instruction::with_operand(
            OpCode::Goto,
            Operand::Target(target),
        ));
        asm.emit(Instruction::simple(OpCode::Null));
        asm.fix_location(target).unwrap();
        asm.emit(Instruction::simple(OpCode::Pop));

        let unit = asm.stop().unwrap();
        // The goto lands on the Pop, past the Null.
        assert_eq!(unit.instructions[0].operand, Some(Operand::Jump(2)));
    }

    #[test]
    fn test_backward_jump_through_location() {
        let mut asm = Assembler::new(empty_unit());
        asm.emit(Instruction::simple(OpCode::Null));
        let back = asm.location();
        asm.emit(Instruction::simple(OpCode::Pop));
        asm.emit(Instruction::with_operand(OpCode::Goto, Operand::Target(back)));

        let unit = asm.stop().unwrap();
        assert_eq!(unit.instructions[2].operand, Some(Operand::Jump(1)));
    }

    #[test]
    fn test_fixing_twice_is_an_error() {
        let mut asm = Assembler::new(empty_unit());
        let label = asm.lazy_location();
        asm.fix_location(label).unwrap();
        let err = asm.fix_location(label).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_unfixed_label_fails_at_stop() {
        let mut asm = Assembler::new(empty_unit());
        let label = asm.lazy_location();
        asm.emit(Instruction::with_operand(
            OpCode::Goto,
            Operand::Target(label),
        ));
        let err = asm.stop().unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_object_file_lookup() {
        let mut object_file = ObjectFile::new();
        object_file.add_function("f", empty_unit());
        object_file.set_toplevel(empty_unit());

        assert!(object_file.function("f").is_some());
        assert!(object_file.function("g").is_none());
        assert!(object_file.toplevel().is_some());
        assert_eq!(object_file.units().len(), 2);
    }
}
