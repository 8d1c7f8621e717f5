// Abstract Syntax Tree definitions for the rule language

use crate::rule_compiler::error::Location;

#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Rule(Rule),
    ScoreChange(ScoreChange),
    Exit,
}

/// `when <condition> then <consequences> done`
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub condition: Expression,
    pub consequences: Vec<Statement>,
}

/// Clauses joined by `or`
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub clauses: Vec<OrClause>,
}

/// Operands joined by `and`
#[derive(Debug, Clone, PartialEq)]
pub struct OrClause {
    pub operands: Vec<AndOperand>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AndOperand {
    Condition(Condition),
    Nested(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Scalar(ScalarCondition),
    List(ListCondition),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarCondition {
    pub left: Value,
    pub op: CompareOp,
    pub right: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Contains,
    DoesNotContain,
    Matches,
    DoesNotMatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListCondition {
    pub left: Value,
    pub negated: bool, // `not in`
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Var(String),
    String(String),
    Int(i64),
    Score(String),
    Regex(RegexLiteral),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegexLiteral {
    pub pattern: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreChange {
    pub score: String,
    pub op: ScoreOp,
    pub value: IntValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreOp {
    Set,
    Add,
    Subtract,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntValue {
    Int(i64),
    Score(String),
}
