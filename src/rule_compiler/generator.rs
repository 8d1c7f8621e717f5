// Instruction Generator
//
// Walks the AST once and lowers it to a flat instruction sequence. Boolean
// expressions become chains of conditional jumps whose targets are patched in
// once the end of the chain is known.

use indexmap::IndexSet;
use regex::Regex;

use crate::instruction::{Instruction, InstructionBuffer, Operand, Operation, Register};
use crate::rule_compiler::ast::*;
use crate::rule_compiler::error::CompilerError;

pub struct Generator {
    buf: InstructionBuffer,
    scratch_used: IndexSet<Register>,
    peak_registers: u32,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    pub fn new() -> Self {
        Generator {
            buf: InstructionBuffer::new(),
            scratch_used: IndexSet::new(),
            peak_registers: 0,
        }
    }

    pub fn generate(mut self, root: &Root) -> Result<Vec<Instruction>, CompilerError> {
        self.generate_statements(&root.statements)?;
        // Every forward jump needs a real landing instruction
        self.buf.append(Instruction::new(Operation::Noop));

        log::debug!(
            "generated {} instructions using {} scratch registers",
            self.buf.head(),
            self.peak_registers
        );
        self.buf.finish()
    }

    fn generate_statements(&mut self, statements: &[Statement]) -> Result<(), CompilerError> {
        for statement in statements {
            self.generate_statement(statement)?;
        }
        Ok(())
    }

    fn generate_statement(&mut self, statement: &Statement) -> Result<(), CompilerError> {
        match statement {
            Statement::Rule(rule) => self.generate_rule(rule),
            Statement::ScoreChange(change) => {
                self.generate_score_change(change);
                Ok(())
            }
            Statement::Exit => {
                self.buf.append(Instruction::new(Operation::Exit));
                Ok(())
            }
        }
    }

    fn generate_rule(&mut self, rule: &Rule) -> Result<(), CompilerError> {
        let scratch = self.allocate_scratch();
        self.generate_expression(&rule.condition, scratch)?;
        let skip = self.buf.reserve();

        self.generate_statements(&rule.consequences)?;

        let target = self.buf.head();
        self.buf.replace(
            skip,
            Instruction::new(Operation::JumpIfFalse)
                .with_operands(Operand::Scratch(scratch), Operand::Position(target)),
        );
        self.free_scratch(scratch);
        Ok(())
    }

    /// OR chain: the first true clause jumps past the rest with `res` set.
    fn generate_expression(&mut self, expr: &Expression, res: Register) -> Result<(), CompilerError> {
        match expr.clauses.as_slice() {
            [] => Err(CompilerError::MalformedNode("expression without clauses")),
            [single] => self.generate_or_clause(single, res),
            clauses => {
                let mut reserved = Vec::with_capacity(clauses.len());
                for clause in clauses {
                    let inner = self.allocate_scratch();
                    self.generate_or_clause(clause, inner)?;
                    reserved.push((self.buf.reserve(), inner));
                    self.free_scratch(inner);
                }
                self.patch_jumps(&reserved, Operation::JumpIfTrue, res);
                Ok(())
            }
        }
    }

    /// AND chain: the first false operand jumps to the trailing negate with
    /// `res` holding true, which the negate turns into false. When every
    /// operand is true the last jump leaves `res` false and the negate flips
    /// it to true.
    fn generate_or_clause(&mut self, clause: &OrClause, res: Register) -> Result<(), CompilerError> {
        match clause.operands.as_slice() {
            [] => Err(CompilerError::MalformedNode("clause without operands")),
            [single] => self.generate_and_operand(single, res),
            operands => {
                let mut reserved = Vec::with_capacity(operands.len());
                for operand in operands {
                    let inner = self.allocate_scratch();
                    self.generate_and_operand(operand, inner)?;
                    reserved.push((self.buf.reserve(), inner));
                    self.free_scratch(inner);
                }
                self.patch_jumps(&reserved, Operation::JumpIfFalse, res);
                self.append_negate(res);
                Ok(())
            }
        }
    }

    fn generate_and_operand(&mut self, operand: &AndOperand, res: Register) -> Result<(), CompilerError> {
        match operand {
            AndOperand::Condition(Condition::Scalar(cond)) => self.generate_scalar_condition(cond, res),
            AndOperand::Condition(Condition::List(cond)) => self.generate_list_condition(cond, res),
            AndOperand::Nested(expr) => self.generate_expression(expr, res),
        }
    }

    fn generate_scalar_condition(
        &mut self,
        cond: &ScalarCondition,
        res: Register,
    ) -> Result<(), CompilerError> {
        let operand1 = operand_from_value(&cond.left)?;
        let operand2 = operand_from_value(&cond.right)?;

        self.buf.append(
            Instruction::new(operation_from_compare_op(cond.op))
                .with_ret(res)
                .with_operands(operand1, operand2),
        );
        Ok(())
    }

    /// `x in [a, b]` is `x == a or x == b`; `not in` negates the result.
    fn generate_list_condition(&mut self, cond: &ListCondition, res: Register) -> Result<(), CompilerError> {
        if cond.values.is_empty() {
            return Err(CompilerError::MalformedNode("list condition without values"));
        }

        let operand1 = operand_from_value(&cond.left)?;
        let mut reserved = Vec::with_capacity(cond.values.len());
        for value in &cond.values {
            let operand2 = operand_from_value(value)?;
            let inner = self.allocate_scratch();
            self.buf.append(
                Instruction::new(Operation::IsEqual)
                    .with_ret(inner)
                    .with_operands(operand1.clone(), operand2),
            );
            reserved.push((self.buf.reserve(), inner));
            self.free_scratch(inner);
        }
        self.patch_jumps(&reserved, Operation::JumpIfTrue, res);

        if cond.negated {
            self.append_negate(res);
        }
        Ok(())
    }

    fn generate_score_change(&mut self, change: &ScoreChange) {
        let operation = match change.op {
            ScoreOp::Set => Operation::SetScore,
            ScoreOp::Add => Operation::AddScore,
            ScoreOp::Subtract => Operation::SubScore,
        };
        let value = match &change.value {
            IntValue::Int(n) => Operand::Int(*n),
            IntValue::Score(name) => Operand::Score(name.clone()),
        };

        self.buf.append(
            Instruction::new(operation).with_operands(Operand::Score(change.score.clone()), value),
        );
    }

    /// Point every reserved slot at the current head
    fn patch_jumps(&mut self, reserved: &[(usize, Register)], operation: Operation, res: Register) {
        let target = self.buf.head();
        for &(pos, scratch) in reserved {
            self.buf.replace(
                pos,
                Instruction::new(operation)
                    .with_ret(res)
                    .with_operands(Operand::Scratch(scratch), Operand::Position(target)),
            );
        }
    }

    fn append_negate(&mut self, res: Register) {
        self.buf.append(
            Instruction::new(Operation::Negate)
                .with_ret(res)
                .with_operand1(Operand::Scratch(res)),
        );
    }

    // Scratch register management: lowest free id first, 0 is never handed out

    fn allocate_scratch(&mut self) -> Register {
        let mut candidate = Register(1);
        while self.scratch_used.contains(&candidate) {
            candidate = Register(candidate.0 + 1);
        }
        self.scratch_used.insert(candidate);
        self.peak_registers = self.peak_registers.max(candidate.0);
        candidate
    }

    fn free_scratch(&mut self, scratch: Register) {
        self.scratch_used.swap_remove(&scratch);
    }
}

fn operation_from_compare_op(op: CompareOp) -> Operation {
    match op {
        CompareOp::Equal => Operation::IsEqual,
        CompareOp::NotEqual => Operation::IsNotEqual,
        CompareOp::Greater => Operation::IsGreaterThan,
        CompareOp::GreaterOrEqual => Operation::IsGreaterThanOrEqual,
        CompareOp::Less => Operation::IsLessThan,
        CompareOp::LessOrEqual => Operation::IsLessThanOrEqual,
        CompareOp::Contains => Operation::Contains,
        CompareOp::DoesNotContain => Operation::DoesNotContain,
        CompareOp::Matches => Operation::Matches,
        CompareOp::DoesNotMatch => Operation::DoesNotMatch,
    }
}

fn operand_from_value(value: &Value) -> Result<Operand, CompilerError> {
    let operand = match value {
        Value::Var(name) => Operand::Var(name.clone()),
        Value::String(s) => Operand::Str(s.clone()),
        Value::Int(n) => Operand::Int(*n),
        Value::Score(name) => Operand::Score(name.clone()),
        Value::Regex(literal) => Operand::Regex(build_regex(literal)?),
    };
    Ok(operand)
}

fn build_regex(literal: &RegexLiteral) -> Result<Regex, CompilerError> {
    Regex::new(&literal.pattern).map_err(|e| CompilerError::InvalidRegex {
        pattern: literal.pattern.clone(),
        message: e.to_string(),
        location: literal.location,
    })
}

#[cfg(test)]
#[path = "generator_tests.rs"]
mod tests;
