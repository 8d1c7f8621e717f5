// Rule Language Recursive Descent Parser

use crate::rule_compiler::ast::*;
use crate::rule_compiler::error::CompilerError;
use crate::rule_compiler::lexer::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::EOF) {
            let location = tokens.last().map(|t| t.location).unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::EOF,
                location,
            });
        }
        Parser { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Root, CompilerError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        log::debug!("parsed {} top-level statements", statements.len());
        Ok(Root { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement, CompilerError> {
        match &self.peek().kind {
            TokenKind::When => Ok(Statement::Rule(self.parse_rule()?)),
            TokenKind::Score => Ok(Statement::ScoreChange(self.parse_score_change()?)),
            TokenKind::Exit => {
                self.advance();
                Ok(Statement::Exit)
            }
            _ => Err(self.expected("'when', 'score' or 'exit'")),
        }
    }

    fn parse_rule(&mut self) -> Result<Rule, CompilerError> {
        self.consume(TokenKind::When)?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::Then)?;

        let mut consequences = Vec::new();
        while !self.check(&TokenKind::Done) && !self.is_at_end() {
            consequences.push(self.parse_statement()?);
        }

        self.consume(TokenKind::Done)?;

        Ok(Rule {
            condition,
            consequences,
        })
    }

    fn parse_expression(&mut self) -> Result<Expression, CompilerError> {
        let mut clauses = vec![self.parse_or_clause()?];

        while self.match_token(&TokenKind::Or) {
            clauses.push(self.parse_or_clause()?);
        }

        Ok(Expression { clauses })
    }

    fn parse_or_clause(&mut self) -> Result<OrClause, CompilerError> {
        let mut operands = vec![self.parse_and_operand()?];

        while self.match_token(&TokenKind::And) {
            operands.push(self.parse_and_operand()?);
        }

        Ok(OrClause { operands })
    }

    fn parse_and_operand(&mut self) -> Result<AndOperand, CompilerError> {
        if self.match_token(&TokenKind::LeftParen) {
            let nested = self.parse_expression()?;
            self.consume(TokenKind::RightParen)?;
            return Ok(AndOperand::Nested(nested));
        }

        Ok(AndOperand::Condition(self.parse_condition()?))
    }

    fn parse_condition(&mut self) -> Result<Condition, CompilerError> {
        let left = self.parse_value()?;

        if self.match_token(&TokenKind::Not) {
            self.consume(TokenKind::In)?;
            let values = self.parse_value_list()?;
            return Ok(Condition::List(ListCondition {
                left,
                negated: true,
                values,
            }));
        }

        if self.match_token(&TokenKind::In) {
            let values = self.parse_value_list()?;
            return Ok(Condition::List(ListCondition {
                left,
                negated: false,
                values,
            }));
        }

        let op = self.parse_compare_op()?;
        let right = self.parse_value()?;

        Ok(Condition::Scalar(ScalarCondition { left, op, right }))
    }

    fn parse_compare_op(&mut self) -> Result<CompareOp, CompilerError> {
        let op = match &self.peek().kind {
            TokenKind::EqualEqual => CompareOp::Equal,
            TokenKind::NotEqual => CompareOp::NotEqual,
            TokenKind::Greater => CompareOp::Greater,
            TokenKind::GreaterEqual => CompareOp::GreaterOrEqual,
            TokenKind::Less => CompareOp::Less,
            TokenKind::LessEqual => CompareOp::LessOrEqual,
            TokenKind::Contains => CompareOp::Contains,
            TokenKind::Matches => CompareOp::Matches,
            TokenKind::Does => {
                self.advance();
                self.consume(TokenKind::Not)?;
                return match &self.peek().kind {
                    TokenKind::Contain => {
                        self.advance();
                        Ok(CompareOp::DoesNotContain)
                    }
                    TokenKind::Match => {
                        self.advance();
                        Ok(CompareOp::DoesNotMatch)
                    }
                    _ => Err(self.expected("'contain' or 'match'")),
                };
            }
            _ => return Err(self.expected("comparison operator")),
        };

        self.advance();
        Ok(op)
    }

    fn parse_value_list(&mut self) -> Result<Vec<Value>, CompilerError> {
        self.consume(TokenKind::LeftBracket)?;

        let mut values = vec![self.parse_value()?];
        while self.match_token(&TokenKind::Comma) {
            values.push(self.parse_value()?);
        }

        self.consume(TokenKind::RightBracket)?;
        Ok(values)
    }

    fn parse_value(&mut self) -> Result<Value, CompilerError> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Var => {
                self.advance();
                Ok(Value::Var(self.parse_parenthesized_name()?))
            }
            TokenKind::Score => Ok(Value::Score(self.parse_score_ref()?)),
            TokenKind::StringLiteral(s) => {
                self.advance();
                Ok(Value::String(s))
            }
            TokenKind::IntegerLiteral(n) => {
                self.advance();
                Ok(Value::Int(n))
            }
            TokenKind::RegexLiteral(pattern) => {
                self.advance();
                Ok(Value::Regex(RegexLiteral {
                    pattern,
                    location: token.location,
                }))
            }
            _ => Err(self.expected("value")),
        }
    }

    fn parse_score_change(&mut self) -> Result<ScoreChange, CompilerError> {
        let score = self.parse_score_ref()?;

        let op = match &self.peek().kind {
            TokenKind::Equal => ScoreOp::Set,
            TokenKind::PlusEqual => ScoreOp::Add,
            TokenKind::MinusEqual => ScoreOp::Subtract,
            _ => return Err(self.expected("'=', '+=' or '-='")),
        };
        self.advance();

        let value = match self.peek().kind.clone() {
            TokenKind::IntegerLiteral(n) => {
                self.advance();
                IntValue::Int(n)
            }
            TokenKind::Score => IntValue::Score(self.parse_score_ref()?),
            _ => return Err(self.expected("integer or score")),
        };

        Ok(ScoreChange { score, op, value })
    }

    fn parse_score_ref(&mut self) -> Result<String, CompilerError> {
        self.consume(TokenKind::Score)?;
        self.parse_parenthesized_name()
    }

    fn parse_parenthesized_name(&mut self) -> Result<String, CompilerError> {
        self.consume(TokenKind::LeftParen)?;
        let name = self.consume_name()?;
        self.consume(TokenKind::RightParen)?;
        Ok(name)
    }

    // Helper methods

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::EOF
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn expected(&self, what: &str) -> CompilerError {
        let token = self.peek();
        CompilerError::ExpectedToken(what.to_string(), token.kind.to_string(), token.location)
    }

    fn consume(&mut self, kind: TokenKind) -> Result<(), CompilerError> {
        if self.check(&kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.expected(&kind.to_string()))
        }
    }

    /// Names inside `var(...)` and `score(...)`; keywords are accepted too
    fn consume_name(&mut self) -> Result<String, CompilerError> {
        let kind = &self.peek().kind;
        let name = match kind {
            TokenKind::Identifier(name) => name.clone(),
            other => match other.keyword_text() {
                Some(text) => text.to_string(),
                None => return Err(self.expected("name")),
            },
        };
        self.advance();
        Ok(name)
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
