//! Reference stack machine
//!
//! Executes stack code against a variable [`Memory`]. Used to check that the
//! stack backend agrees with the other backends.

use super::StackInst;
use crate::value::{apply_binary, Memory, Value};
use crate::RuntimeError;

/// Simulate the depth discipline of a stream without evaluating it.
///
/// Returns the maximum stack depth reached, or an error if the stream
/// underflows or does not leave exactly one value behind.
pub fn check_balance(code: &[StackInst]) -> Result<usize, RuntimeError> {
    let mut depth = 0usize;
    let mut max_depth = 0usize;

    for (index, inst) in code.iter().enumerate() {
        depth = depth
            .checked_sub(inst.pops())
            .ok_or(RuntimeError::StackUnderflow { index })?;
        depth += inst.pushes();
        max_depth = max_depth.max(depth);
    }

    if depth != 1 {
        return Err(RuntimeError::Malformed {
            message: format!("stack code leaves {} values, expected 1", depth),
        });
    }
    Ok(max_depth)
}

/// Operand-stack interpreter
pub struct StackMachine<'a> {
    memory: &'a Memory,
    stack: Vec<Value>,
}

impl<'a> StackMachine<'a> {
    pub fn new(memory: &'a Memory) -> Self {
        Self {
            memory,
            stack: Vec::new(),
        }
    }

    fn pop(&mut self, index: usize) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow { index })
    }

    /// Run a complete expression stream and return its single result
    pub fn eval(&mut self, code: &[StackInst]) -> Result<Value, RuntimeError> {
        self.stack.clear();

        for (index, inst) in code.iter().enumerate() {
            let value = match inst {
                StackInst::LoadTrue => Value::Bool(true),
                StackInst::LoadFalse => Value::Bool(false),
                StackInst::LoadImm(v) => Value::Int(*v),
                StackInst::LoadMem(id) => self
                    .memory
                    .get(*id)
                    .ok_or(RuntimeError::UnknownVariable(*id))?,
                StackInst::Binary(op) => {
                    let right = self.pop(index)?;
                    let left = self.pop(index)?;
                    apply_binary(*op, left, right)?
                }
            };
            self.stack.push(value);
        }

        let result = self.pop(code.len())?;
        if !self.stack.is_empty() {
            return Err(RuntimeError::Malformed {
                message: format!("{} values left on the stack", self.stack.len()),
            });
        }
        Ok(result)
    }
}
