#![crate_name = "scorecard"]

//! Scoring rules compiled to a small jump-based instruction set.
//!
//! ```
//! use std::collections::HashMap;
//!
//! let program = scorecard::compile(r#"
//!     when var(title) contains "football" then score(sports) += 10 done
//! "#).unwrap();
//!
//! let mut vars = HashMap::new();
//! vars.insert("title".to_string(), "college football".to_string());
//! let scores = program.run(&vars).unwrap();
//! assert_eq!(scores["sports"], 10);
//! ```

pub mod config;
pub mod disassembler;
pub mod instruction;
pub mod interpreter;
pub mod program;
pub mod rule_compiler;
pub mod vm;

use std::io::Read;

pub use interpreter::RuntimeError;
pub use program::Program;
pub use rule_compiler::{CompilerError, RuleCompiler};
pub use vm::{Bindings, Scores};

/// Compile rule source text
pub fn compile(source: &str) -> Result<Program, CompilerError> {
    RuleCompiler::new().compile(source)
}

/// Compile rule source read to the end from `reader`
pub fn compile_reader<R: Read>(mut reader: R) -> Result<Program, CompilerError> {
    let mut source = String::new();
    reader
        .read_to_string(&mut source)
        .map_err(|e| CompilerError::IOError(e.to_string()))?;
    compile(&source)
}
