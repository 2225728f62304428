//! Reference register machine

use std::collections::HashMap;

use super::{RegInst, VReg};
use crate::value::{apply_binary, Memory, Value};
use crate::RuntimeError;

/// Executes three-address code over an unbounded register file
pub struct RegisterMachine<'a> {
    memory: &'a Memory,
    registers: HashMap<VReg, Value>,
}

impl<'a> RegisterMachine<'a> {
    pub fn new(memory: &'a Memory) -> Self {
        Self {
            memory,
            registers: HashMap::new(),
        }
    }

    /// Read a register
    pub fn get(&self, reg: VReg) -> Result<Value, RuntimeError> {
        self.registers
            .get(&reg)
            .copied()
            .ok_or(RuntimeError::UnboundRegister(reg))
    }

    /// Execute `code` in order
    pub fn run(&mut self, code: &[RegInst]) -> Result<(), RuntimeError> {
        for inst in code {
            let value = match inst {
                RegInst::LoadInt { value, .. } => Value::Int(*value),
                RegInst::LoadBool { value, .. } => Value::Bool(*value),
                RegInst::Load { var, .. } => self
                    .memory
                    .get(*var)
                    .ok_or(RuntimeError::UnknownVariable(*var))?,
                RegInst::Binary {
                    op, left, right, ..
                } => apply_binary(*op, self.get(*left)?, self.get(*right)?)?,
            };
            self.registers.insert(inst.dest(), value);
        }
        Ok(())
    }

    /// Execute `code` and read back `result`
    pub fn eval(&mut self, code: &[RegInst], result: VReg) -> Result<Value, RuntimeError> {
        self.run(code)?;
        self.get(result)
    }
}
