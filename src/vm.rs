use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::instruction::{Instruction, Register};

/// Named integer scores produced by one run, in first-write order
pub type Scores = IndexMap<String, i64>;

/// Read-only variable bindings a program is run against
pub trait Bindings {
    fn lookup(&self, name: &str) -> Option<&str>;
}

impl<S: BuildHasher> Bindings for HashMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl<S: BuildHasher> Bindings for IndexMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl Bindings for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Per-run machine state. Everything mutable lives here; the instruction
/// sequence and the bindings are only borrowed.
pub struct VM<'a, B: Bindings + ?Sized> {
    /// The program being executed
    pub instructions: &'a [Instruction],
    /// Caller-supplied variables
    vars: &'a B,
    /// Scratch registers by id. Unwritten registers read false.
    scratch: IndexMap<Register, bool>,
    /// Scores written so far
    scores: Scores,
    /// Index of the next instruction to execute
    pub pc: usize,
}

impl<'a, B: Bindings + ?Sized> VM<'a, B> {
    pub fn new(instructions: &'a [Instruction], vars: &'a B) -> Self {
        VM {
            instructions,
            vars,
            scratch: IndexMap::new(),
            scores: Scores::new(),
            pc: 0,
        }
    }

    pub fn read_scratch(&self, reg: Register) -> bool {
        self.scratch.get(&reg).copied().unwrap_or(false)
    }

    /// Writes to register 0 are discarded
    pub fn write_scratch(&mut self, reg: Register, value: bool) {
        if reg.is_none() {
            return;
        }
        self.scratch.insert(reg, value);
    }

    /// Unset variables read as the empty string
    pub fn read_var(&self, name: &str) -> &'a str {
        let vars: &'a B = self.vars;
        vars.lookup(name).unwrap_or("")
    }

    /// Unset scores read as 0 without being created
    pub fn read_score(&self, name: &str) -> i64 {
        self.scores.get(name).copied().unwrap_or(0)
    }

    pub fn score_mut(&mut self, name: &str) -> &mut i64 {
        self.scores.entry(name.to_string()).or_insert(0)
    }

    pub fn into_scores(self) -> Scores {
        self.scores
    }
}
