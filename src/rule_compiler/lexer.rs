// Rule Language Lexer
// Tokenizes rule source text into a stream of tokens

use crate::rule_compiler::error::{CompilerError, Location};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    StringLiteral(String),
    IntegerLiteral(i64),
    RegexLiteral(String),
    Identifier(String),

    // Keywords
    When,
    Then,
    Done,
    Or,
    And,
    Not,
    In,
    Contains,
    Matches,
    Does,
    Contain,
    Match,
    Exit,
    Var,
    Score,

    // Symbols
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    Comma,        // ,

    // Operators
    Equal,        // =
    EqualEqual,   // ==
    NotEqual,     // !=
    PlusEqual,    // +=
    MinusEqual,   // -=
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=

    // Special
    EOF,
}

impl TokenKind {
    /// Source spelling of a keyword token, `None` for everything else
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::When => "when",
            TokenKind::Then => "then",
            TokenKind::Done => "done",
            TokenKind::Or => "or",
            TokenKind::And => "and",
            TokenKind::Not => "not",
            TokenKind::In => "in",
            TokenKind::Contains => "contains",
            TokenKind::Matches => "matches",
            TokenKind::Does => "does",
            TokenKind::Contain => "contain",
            TokenKind::Match => "match",
            TokenKind::Exit => "exit",
            TokenKind::Var => "var",
            TokenKind::Score => "score",
            _ => return None,
        };
        Some(text)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(text) = self.keyword_text() {
            return write!(f, "'{}'", text);
        }
        match self {
            TokenKind::StringLiteral(s) => write!(f, "string \"{}\"", s),
            TokenKind::IntegerLiteral(n) => write!(f, "integer {}", n),
            TokenKind::RegexLiteral(r) => write!(f, "regex /{}/", r),
            TokenKind::Identifier(name) => write!(f, "identifier '{}'", name),
            TokenKind::LeftParen => write!(f, "'('"),
            TokenKind::RightParen => write!(f, "')'"),
            TokenKind::LeftBracket => write!(f, "'['"),
            TokenKind::RightBracket => write!(f, "']'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Equal => write!(f, "'='"),
            TokenKind::EqualEqual => write!(f, "'=='"),
            TokenKind::NotEqual => write!(f, "'!='"),
            TokenKind::PlusEqual => write!(f, "'+='"),
            TokenKind::MinusEqual => write!(f, "'-='"),
            TokenKind::Less => write!(f, "'<'"),
            TokenKind::LessEqual => write!(f, "'<='"),
            TokenKind::Greater => write!(f, "'>'"),
            TokenKind::GreaterEqual => write!(f, "'>='"),
            TokenKind::EOF => write!(f, "end of input"),
            _ => write!(f, "{:?}", self),
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    current_char: Option<char>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Lexer {
            input: chars,
            position: 0,
            line: 1,
            column: 1,
            current_char,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompilerError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::EOF;
            tokens.push(token);
            if done {
                break;
            }
        }

        log::debug!("lexer produced {} tokens", tokens.len());
        Ok(tokens)
    }

    fn location(&self) -> Location {
        Location {
            position: self.position,
            line: self.line,
            column: self.column,
        }
    }

    fn next_token(&mut self) -> Result<Token, CompilerError> {
        self.skip_whitespace_and_comments();

        let start = self.location();

        let ch = match self.current_char {
            None => {
                return Ok(Token {
                    kind: TokenKind::EOF,
                    location: start,
                })
            }
            Some(ch) => ch,
        };

        let kind = match ch {
            '(' => {
                self.advance();
                TokenKind::LeftParen
            }
            ')' => {
                self.advance();
                TokenKind::RightParen
            }
            '[' => {
                self.advance();
                TokenKind::LeftBracket
            }
            ']' => {
                self.advance();
                TokenKind::RightBracket
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            '=' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                }
            }
            '!' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    TokenKind::NotEqual
                } else {
                    return Err(CompilerError::UnexpectedCharacter('!', start));
                }
            }
            '+' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    TokenKind::PlusEqual
                } else {
                    return Err(CompilerError::UnexpectedCharacter('+', start));
                }
            }
            '-' => {
                self.advance();
                match self.current_char {
                    Some('=') => {
                        self.advance();
                        TokenKind::MinusEqual
                    }
                    Some(d) if d.is_ascii_digit() => {
                        TokenKind::IntegerLiteral(self.read_number(true, start)?)
                    }
                    _ => return Err(CompilerError::UnexpectedCharacter('-', start)),
                }
            }
            '<' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }

            // String literals
            '"' => {
                self.advance();
                TokenKind::StringLiteral(self.read_string(start)?)
            }

            // Regex literals
            '/' => {
                self.advance();
                TokenKind::RegexLiteral(self.read_regex(start)?)
            }

            // Numbers
            ch if ch.is_ascii_digit() => TokenKind::IntegerLiteral(self.read_number(false, start)?),

            // Identifiers and keywords
            ch if ch.is_ascii_alphabetic() || ch == '_' => {
                let identifier = self.read_identifier();
                self.keyword_or_identifier(identifier)
            }

            ch => return Err(CompilerError::UnexpectedCharacter(ch, start)),
        };

        Ok(Token {
            kind,
            location: start,
        })
    }

    fn advance(&mut self) {
        if let Some('\n') = self.current_char {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '#' {
                while let Some(ch) = self.current_char {
                    if ch == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_string(&mut self, start: Location) -> Result<String, CompilerError> {
        let mut value = String::new();

        while let Some(ch) = self.current_char {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(value);
                }
                '\\' => {
                    self.advance();
                    match self.current_char {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some(ch) => value.push(ch),
                        None => return Err(CompilerError::UnterminatedString(start)),
                    }
                    self.advance();
                }
                ch => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        Err(CompilerError::UnterminatedString(start))
    }

    // Only `\/` is unescaped here; every other escape belongs to the regex engine.
    fn read_regex(&mut self, start: Location) -> Result<String, CompilerError> {
        let mut pattern = String::new();

        while let Some(ch) = self.current_char {
            match ch {
                '/' => {
                    self.advance();
                    return Ok(pattern);
                }
                '\\' => {
                    self.advance();
                    match self.current_char {
                        Some('/') => pattern.push('/'),
                        Some(ch) => {
                            pattern.push('\\');
                            pattern.push(ch);
                        }
                        None => return Err(CompilerError::UnterminatedRegex(start)),
                    }
                    self.advance();
                }
                ch => {
                    pattern.push(ch);
                    self.advance();
                }
            }
        }

        Err(CompilerError::UnterminatedRegex(start))
    }

    fn read_number(&mut self, negative: bool, start: Location) -> Result<i64, CompilerError> {
        let mut value = String::new();
        if negative {
            value.push('-');
        }

        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        value
            .parse::<i64>()
            .map_err(|_| CompilerError::InvalidNumber(value.clone(), start))
    }

    fn read_identifier(&mut self) -> String {
        let mut value = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        value
    }

    fn keyword_or_identifier(&self, identifier: String) -> TokenKind {
        match identifier.as_str() {
            "when" => TokenKind::When,
            "then" => TokenKind::Then,
            "done" => TokenKind::Done,
            "or" => TokenKind::Or,
            "and" => TokenKind::And,
            "not" => TokenKind::Not,
            "in" => TokenKind::In,
            "contains" => TokenKind::Contains,
            "matches" => TokenKind::Matches,
            "does" => TokenKind::Does,
            "contain" => TokenKind::Contain,
            "match" => TokenKind::Match,
            "exit" => TokenKind::Exit,
            "var" => TokenKind::Var,
            "score" => TokenKind::Score,
            _ => TokenKind::Identifier(identifier),
        }
    }
}

#[cfg(test)]
#[path = "lexer_tests.rs"]
mod tests;
