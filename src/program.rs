use crate::disassembler::Disassembler;
use crate::instruction::Instruction;
use crate::interpreter::{Interpreter, RuntimeError};
use crate::vm::{Bindings, Scores, VM};
use std::io::{self, Write};

/// A compiled rule set. Immutable and shareable across threads; every run
/// gets its own registers and scores.
#[derive(Debug, Clone)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Program { instructions }
    }

    /// Execute against one set of variable bindings
    pub fn run<B: Bindings + ?Sized>(&self, vars: &B) -> Result<Scores, RuntimeError> {
        Interpreter::new(VM::new(&self.instructions, vars)).run()
    }

    /// Write the instruction table
    pub fn dump(&self, w: &mut dyn Write) -> io::Result<()> {
        Disassembler::new(&self.instructions).write_table(w)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}
