use crate::instruction::{Instruction, Operand, Operation};
use crate::vm::{Bindings, Scores, VM};
use log::{debug, trace};
use regex::Regex;
use std::fmt;

/// Result of executing an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Continue with the next instruction
    Continue,
    /// Jump taken, PC already updated
    Jumped,
    /// Exit executed; stop the whole program
    Halted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// An operand was missing or of a kind the operation cannot use
    InvalidOperand {
        operation: Operation,
        expected: &'static str,
        found: &'static str,
        position: usize,
    },
    /// A jump pointed past the end of the program
    JumpOutOfRange {
        target: usize,
        len: usize,
        position: usize,
    },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuntimeError::InvalidOperand {
                operation,
                expected,
                found,
                position,
            } => write!(
                f,
                "Runtime error at instruction {}: '{}' expected {} operand but found {}",
                position, operation, expected, found
            ),
            RuntimeError::JumpOutOfRange {
                target,
                len,
                position,
            } => write!(
                f,
                "Runtime error at instruction {}: jump target {} is outside a program of {} instructions",
                position, target, len
            ),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Dispatch loop over a compiled instruction sequence
pub struct Interpreter<'a, B: Bindings + ?Sized> {
    /// The VM state
    pub vm: VM<'a, B>,
    /// Instruction count for debugging
    instruction_count: u64,
}

impl<'a, B: Bindings + ?Sized> Interpreter<'a, B> {
    pub fn new(vm: VM<'a, B>) -> Self {
        Interpreter {
            vm,
            instruction_count: 0,
        }
    }

    /// Run from the first instruction until the end of the program or an exit.
    /// Scores written before a failure are dropped with the error.
    pub fn run(mut self) -> Result<Scores, RuntimeError> {
        let instructions = self.vm.instructions;

        while let Some(instruction) = instructions.get(self.vm.pc) {
            trace!("{:04}: {}", self.vm.pc, instruction);

            match self.execute_instruction(instruction)? {
                ExecutionResult::Continue => self.vm.pc += 1,
                ExecutionResult::Jumped => {}
                ExecutionResult::Halted => {
                    debug!("exit at instruction {}", self.vm.pc);
                    break;
                }
            }

            self.instruction_count += 1;
        }

        debug!("executed {} instructions", self.instruction_count);
        Ok(self.vm.into_scores())
    }

    pub fn execute_instruction(
        &mut self,
        inst: &'a Instruction,
    ) -> Result<ExecutionResult, RuntimeError> {
        let op = inst.operation;
        let (op1, op2) = (inst.operand1.as_ref(), inst.operand2.as_ref());

        match op {
            Operation::Noop => {}
            Operation::Exit => return Ok(ExecutionResult::Halted),

            Operation::IsEqual => {
                let equal = self.equal(op, op1, op2)?;
                self.vm.write_scratch(inst.ret, equal);
            }
            Operation::IsNotEqual => {
                let equal = self.equal(op, op1, op2)?;
                self.vm.write_scratch(inst.ret, !equal);
            }

            Operation::IsGreaterThan
            | Operation::IsGreaterThanOrEqual
            | Operation::IsLessThan
            | Operation::IsLessThanOrEqual => {
                let a = self.int_operand(op, op1)?;
                let b = self.int_operand(op, op2)?;
                let result = match op {
                    Operation::IsGreaterThan => a > b,
                    Operation::IsGreaterThanOrEqual => a >= b,
                    Operation::IsLessThan => a < b,
                    _ => a <= b,
                };
                self.vm.write_scratch(inst.ret, result);
            }

            Operation::Contains | Operation::DoesNotContain => {
                let haystack = self.string_operand(op, op1)?;
                let needle = self.string_operand(op, op2)?;
                let found = haystack.contains(needle);
                self.vm
                    .write_scratch(inst.ret, found == (op == Operation::Contains));
            }

            Operation::Matches | Operation::DoesNotMatch => {
                let text = self.string_operand(op, op1)?;
                let regex = self.regex_operand(op, op2)?;
                let matched = regex.is_match(text);
                self.vm
                    .write_scratch(inst.ret, matched == (op == Operation::Matches));
            }

            Operation::JumpIfFalse | Operation::JumpIfTrue => {
                let value = self.scratch_operand(op, op1)?;
                let target = self.position_operand(op, op2)?;
                let take = if op == Operation::JumpIfTrue {
                    value
                } else {
                    !value
                };

                self.vm.write_scratch(inst.ret, take);
                if take {
                    self.vm.pc = target;
                    return Ok(ExecutionResult::Jumped);
                }
            }

            Operation::Negate => {
                let value = self.scratch_operand(op, op1)?;
                self.vm.write_scratch(inst.ret, !value);
            }

            Operation::SetScore | Operation::AddScore | Operation::SubScore => {
                let name = self.score_name_operand(op, op1)?;
                let value = self.int_operand(op, op2)?;
                let score = self.vm.score_mut(name);
                *score = match op {
                    Operation::SetScore => value,
                    Operation::AddScore => score.wrapping_add(value),
                    _ => score.wrapping_sub(value),
                };
            }
        }

        Ok(ExecutionResult::Continue)
    }

    /// Equality follows the kind of the left operand
    fn equal(
        &self,
        op: Operation,
        op1: Option<&'a Operand>,
        op2: Option<&'a Operand>,
    ) -> Result<bool, RuntimeError> {
        match op1 {
            Some(Operand::Int(_)) | Some(Operand::Score(_)) => {
                Ok(self.int_operand(op, op1)? == self.int_operand(op, op2)?)
            }
            Some(Operand::Str(_)) | Some(Operand::Var(_)) => {
                Ok(self.string_operand(op, op1)? == self.string_operand(op, op2)?)
            }
            other => Err(self.invalid(op, "int, score, string or var", other)),
        }
    }

    // Operand coercion

    fn int_operand(&self, op: Operation, operand: Option<&Operand>) -> Result<i64, RuntimeError> {
        match operand {
            Some(Operand::Int(n)) => Ok(*n),
            Some(Operand::Score(name)) => Ok(self.vm.read_score(name)),
            other => Err(self.invalid(op, "int or score", other)),
        }
    }

    fn string_operand(
        &self,
        op: Operation,
        operand: Option<&'a Operand>,
    ) -> Result<&'a str, RuntimeError> {
        match operand {
            Some(Operand::Str(s)) => Ok(s.as_str()),
            Some(Operand::Var(name)) => Ok(self.vm.read_var(name)),
            other => Err(self.invalid(op, "string or var", other)),
        }
    }

    fn regex_operand(
        &self,
        op: Operation,
        operand: Option<&'a Operand>,
    ) -> Result<&'a Regex, RuntimeError> {
        match operand {
            Some(Operand::Regex(regex)) => Ok(regex),
            other => Err(self.invalid(op, "regex", other)),
        }
    }

    fn scratch_operand(&self, op: Operation, operand: Option<&Operand>) -> Result<bool, RuntimeError> {
        match operand {
            Some(Operand::Scratch(reg)) => Ok(self.vm.read_scratch(*reg)),
            other => Err(self.invalid(op, "scratch", other)),
        }
    }

    /// Jump targets may equal the program length, which ends the run
    fn position_operand(&self, op: Operation, operand: Option<&Operand>) -> Result<usize, RuntimeError> {
        match operand {
            Some(Operand::Position(target)) => {
                let len = self.vm.instructions.len();
                if *target > len {
                    return Err(RuntimeError::JumpOutOfRange {
                        target: *target,
                        len,
                        position: self.vm.pc,
                    });
                }
                Ok(*target)
            }
            other => Err(self.invalid(op, "position", other)),
        }
    }

    fn score_name_operand(
        &self,
        op: Operation,
        operand: Option<&'a Operand>,
    ) -> Result<&'a str, RuntimeError> {
        match operand {
            Some(Operand::Score(name)) => Ok(name.as_str()),
            other => Err(self.invalid(op, "score", other)),
        }
    }

    fn invalid(&self, op: Operation, expected: &'static str, found: Option<&Operand>) -> RuntimeError {
        RuntimeError::InvalidOperand {
            operation: op,
            expected,
            found: found.map_or("none", Operand::kind),
            position: self.vm.pc,
        }
    }
}

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod tests;
