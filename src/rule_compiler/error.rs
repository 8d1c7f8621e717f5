// Rule Compiler Error Handling

use std::fmt;

/// Where in the source text a token or node starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    pub position: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone)]
pub enum CompilerError {
    // Lexical errors
    UnexpectedCharacter(char, Location),
    UnterminatedString(Location),
    UnterminatedRegex(Location),
    InvalidNumber(String, Location),

    // Parse errors
    ExpectedToken(String, String, Location), // expected, found, location

    // Generation errors
    MalformedNode(&'static str),
    InvalidRegex {
        pattern: String,
        message: String,
        location: Location,
    },
    UnpatchedPlaceholder(usize),

    // IO errors
    IOError(String),
}

impl CompilerError {
    /// True for failures raised while turning an AST into instructions,
    /// as opposed to failures reading the source text.
    pub fn is_generation_error(&self) -> bool {
        matches!(
            self,
            CompilerError::MalformedNode(_)
                | CompilerError::InvalidRegex { .. }
                | CompilerError::UnpatchedPlaceholder(_)
        )
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompilerError::UnexpectedCharacter(ch, loc) => {
                write!(f, "Unexpected character '{}' at {}", ch, loc)
            }
            CompilerError::UnterminatedString(loc) => {
                write!(f, "Unterminated string starting at {}", loc)
            }
            CompilerError::UnterminatedRegex(loc) => {
                write!(f, "Unterminated regex literal starting at {}", loc)
            }
            CompilerError::InvalidNumber(text, loc) => {
                write!(f, "Invalid integer literal '{}' at {}", text, loc)
            }
            CompilerError::ExpectedToken(expected, found, loc) => {
                write!(f, "Expected {} but found {} at {}", expected, found, loc)
            }
            CompilerError::MalformedNode(what) => {
                write!(f, "Generation error: could not resolve {}", what)
            }
            CompilerError::InvalidRegex {
                pattern,
                message,
                location,
            } => {
                write!(
                    f,
                    "Generation error: regex /{}/ at {} failed to compile: {}",
                    pattern, location, message
                )
            }
            CompilerError::UnpatchedPlaceholder(pos) => {
                write!(
                    f,
                    "Generation error: reserved instruction {} was never patched",
                    pos
                )
            }
            CompilerError::IOError(msg) => {
                write!(f, "IO error: {}", msg)
            }
        }
    }
}

impl std::error::Error for CompilerError {}
