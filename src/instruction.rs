//! Instruction model shared by the generator and the interpreter.
//!
//! A compiled program is a flat `Vec<Instruction>`. Each instruction carries an
//! [`Operation`], a destination scratch [`Register`] (register 0 means the
//! result is discarded) and up to two typed [`Operand`]s. Jump targets are
//! absolute indices into the same vector.

use indexmap::IndexSet;
use regex::Regex;
use std::fmt;

use crate::rule_compiler::error::CompilerError;

/// Opcodes understood by the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Noop,
    IsEqual,
    IsNotEqual,
    IsGreaterThan,
    IsGreaterThanOrEqual,
    IsLessThan,
    IsLessThanOrEqual,
    Contains,
    DoesNotContain,
    Matches,
    DoesNotMatch,
    JumpIfFalse,
    JumpIfTrue,
    AddScore,
    SubScore,
    SetScore,
    Negate,
    Exit,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Noop => "nop",
            Operation::IsEqual => "eq",
            Operation::IsNotEqual => "ne",
            Operation::IsGreaterThan => "gt",
            Operation::IsGreaterThanOrEqual => "ge",
            Operation::IsLessThan => "lt",
            Operation::IsLessThanOrEqual => "le",
            Operation::Contains => "contains",
            Operation::DoesNotContain => "ncontains",
            Operation::Matches => "match",
            Operation::DoesNotMatch => "nmatch",
            Operation::JumpIfFalse => "jf",
            Operation::JumpIfTrue => "jt",
            Operation::AddScore => "add",
            Operation::SubScore => "sub",
            Operation::SetScore => "set",
            Operation::Negate => "not",
            Operation::Exit => "exit",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scratch register id. Register 0 is never allocated and means "no destination".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Register(pub u32);

impl Register {
    pub const NONE: Register = Register(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum Operand {
    Int(i64),
    Str(String),
    Regex(Regex),
    Scratch(Register),
    Score(String),
    Position(usize),
    Var(String),
}

impl Operand {
    /// Short kind name used in runtime errors
    pub fn kind(&self) -> &'static str {
        match self {
            Operand::Int(_) => "int",
            Operand::Str(_) => "string",
            Operand::Regex(_) => "regex",
            Operand::Scratch(_) => "scratch",
            Operand::Score(_) => "score",
            Operand::Position(_) => "position",
            Operand::Var(_) => "var",
        }
    }
}

// Regex has no PartialEq; patterns compare by source text.
impl PartialEq for Operand {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Operand::Int(a), Operand::Int(b)) => a == b,
            (Operand::Str(a), Operand::Str(b)) => a == b,
            (Operand::Regex(a), Operand::Regex(b)) => a.as_str() == b.as_str(),
            (Operand::Scratch(a), Operand::Scratch(b)) => a == b,
            (Operand::Score(a), Operand::Score(b)) => a == b,
            (Operand::Position(a), Operand::Position(b)) => a == b,
            (Operand::Var(a), Operand::Var(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Int(n) => write!(f, "{}", n),
            Operand::Str(s) => write!(f, "{:?}", s),
            Operand::Regex(r) => write!(f, "/{}/", r.as_str()),
            Operand::Scratch(reg) => write!(f, "{}", reg),
            Operand::Score(name) => write!(f, "score({})", name),
            Operand::Position(pos) => write!(f, "->{}", pos),
            Operand::Var(name) => write!(f, "var({})", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub operation: Operation,
    pub ret: Register,
    pub operand1: Option<Operand>,
    pub operand2: Option<Operand>,
}

impl Instruction {
    pub fn new(operation: Operation) -> Self {
        Instruction {
            operation,
            ret: Register::NONE,
            operand1: None,
            operand2: None,
        }
    }

    pub fn with_ret(mut self, ret: Register) -> Self {
        self.ret = ret;
        self
    }

    pub fn with_operands(mut self, operand1: Operand, operand2: Operand) -> Self {
        self.operand1 = Some(operand1);
        self.operand2 = Some(operand2);
        self
    }

    pub fn with_operand1(mut self, operand1: Operand) -> Self {
        self.operand1 = Some(operand1);
        self
    }

    /// Columns used by the program dump: op, ret, operand1, operand2.
    /// Empty strings for absent fields.
    pub fn columns(&self) -> [String; 4] {
        let ret = if self.ret.is_none() {
            String::new()
        } else {
            self.ret.to_string()
        };
        let operand = |op: &Option<Operand>| op.as_ref().map(|o| o.to_string()).unwrap_or_default();

        [
            self.operation.to_string(),
            ret,
            operand(&self.operand1),
            operand(&self.operand2),
        ]
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.operation)?;
        if !self.ret.is_none() {
            write!(f, " {} <-", self.ret)?;
        }
        if let Some(op) = &self.operand1 {
            write!(f, " {}", op)?;
        }
        if let Some(op) = &self.operand2 {
            write!(f, " {}", op)?;
        }
        Ok(())
    }
}

/// Append-only instruction arena with slot reservation for backpatching.
#[derive(Debug, Default)]
pub struct InstructionBuffer {
    instructions: Vec<Instruction>,
    unpatched: IndexSet<usize>,
}

impl InstructionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Append a placeholder and return its index for a later [`replace`](Self::replace)
    pub fn reserve(&mut self) -> usize {
        let pos = self.instructions.len();
        self.instructions.push(Instruction::new(Operation::Noop));
        self.unpatched.insert(pos);
        pos
    }

    pub fn replace(&mut self, pos: usize, instruction: Instruction) {
        log::debug!("backpatch {}: {}", pos, instruction);
        self.instructions[pos] = instruction;
        self.unpatched.shift_remove(&pos);
    }

    /// Index the next appended instruction will occupy
    pub fn head(&self) -> usize {
        self.instructions.len()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Hand out the finished sequence. Fails if any reserved slot was never replaced.
    pub fn finish(self) -> Result<Vec<Instruction>, CompilerError> {
        if let Some(&pos) = self.unpatched.first() {
            return Err(CompilerError::UnpatchedPlaceholder(pos));
        }
        Ok(self.instructions)
    }
}

#[cfg(test)]
#[path = "instruction_tests.rs"]
mod tests;
