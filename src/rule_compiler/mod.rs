// Rule Compiler Module
// Turns rule source text into an executable Program

pub mod ast;
pub mod error;
pub mod generator;
pub mod lexer;
pub mod parser;

pub use error::{CompilerError, Location};

use crate::program::Program;

/// Main compiler structure
pub struct RuleCompiler {
    // Compiler state and configuration
}

impl Default for RuleCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleCompiler {
    pub fn new() -> Self {
        RuleCompiler {}
    }

    /// Compile rule source into a reusable program
    pub fn compile(&self, source: &str) -> Result<Program, CompilerError> {
        // Phase 1: Lexical Analysis
        let mut lexer = lexer::Lexer::new(source);
        let tokens = lexer.tokenize()?;

        // Phase 2: Parsing
        let mut parser = parser::Parser::new(tokens);
        let ast = parser.parse()?;

        // Phase 3: Instruction Generation
        let generator = generator::Generator::new();
        let instructions = generator.generate(&ast)?;

        Ok(Program::new(instructions))
    }
}
