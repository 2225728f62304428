//! Reference IR interpreter
//!
//! Walks the basic blocks of a lowered module. Calls to the print externals
//! are forwarded to a [`PrintHost`]; arithmetic goes through the shared
//! value semantics so results match the stack and register machines.

use std::collections::HashMap;

use log::trace;

use super::lower::{PRINT_I1, PRINT_I32, MAIN};
use super::types::*;
use crate::ast::BinaryOp;
use crate::host::PrintHost;
use crate::value::{apply_binary, Value};
use crate::RuntimeError;

impl From<IrConst> for Value {
    fn from(c: IrConst) -> Self {
        match c {
            IrConst::I1(b) => Value::Bool(b),
            IrConst::I32(v) => Value::Int(v),
        }
    }
}

impl IrBinOp {
    fn source_op(self) -> BinaryOp {
        match self {
            IrBinOp::Add => BinaryOp::Add,
            IrBinOp::Sub => BinaryOp::Sub,
            IrBinOp::Mul => BinaryOp::Mul,
            IrBinOp::SDiv => BinaryOp::Div,
            IrBinOp::And => BinaryOp::And,
            IrBinOp::Or => BinaryOp::Or,
        }
    }
}

impl IcmpPred {
    fn source_op(self) -> BinaryOp {
        match self {
            IcmpPred::Eq => BinaryOp::Eq,
            IcmpPred::Ne => BinaryOp::Ne,
            IcmpPred::Sge => BinaryOp::Ge,
            IcmpPred::Sle => BinaryOp::Le,
            IcmpPred::Sgt => BinaryOp::Gt,
            IcmpPred::Slt => BinaryOp::Lt,
        }
    }
}

fn malformed(message: impl Into<String>) -> RuntimeError {
    RuntimeError::Malformed {
        message: message.into(),
    }
}

/// Executes functions of an [`IrModule`]
pub struct Interpreter<'m> {
    module: &'m IrModule,
    globals: HashMap<String, Value>,
    limit: Option<usize>,
    steps: usize,
}

impl<'m> Interpreter<'m> {
    /// `limit` bounds the number of executed instructions
    pub fn new(module: &'m IrModule, limit: Option<usize>) -> Self {
        let globals = module
            .globals
            .iter()
            .map(|g| (g.name.clone(), Value::from(g.init)))
            .collect();

        Interpreter {
            module,
            globals,
            limit,
            steps: 0,
        }
    }

    /// Instructions executed so far, terminators included
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Current value of a global
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).copied()
    }

    /// Run the program's `main` function
    pub fn run_main(&mut self, host: &mut dyn PrintHost) -> Result<(), RuntimeError> {
        self.call(MAIN, &[], host).map(|_| ())
    }

    /// Call a defined function or a host external by name
    pub fn call(
        &mut self,
        name: &str,
        args: &[Value],
        host: &mut dyn PrintHost,
    ) -> Result<Option<Value>, RuntimeError> {
        let module = self.module;

        if let Some(func) = module.find_function(name) {
            if !args.is_empty() {
                return Err(malformed(format!("@{} takes no arguments", name)));
            }
            return self.run_function(func, host);
        }

        if module.find_extern(name).is_some() {
            match (name, args) {
                (PRINT_I32, [value]) => {
                    host.print_i32(value.as_i32());
                    return Ok(None);
                }
                (PRINT_I1, [value]) => {
                    host.print_i1(value.truthy());
                    return Ok(None);
                }
                _ => {}
            }
        }

        Err(RuntimeError::UnknownFunction(name.to_string()))
    }

    fn tick(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;
        match self.limit {
            Some(limit) if self.steps > limit => Err(RuntimeError::StepLimitExceeded(limit)),
            _ => Ok(()),
        }
    }

    fn run_function(
        &mut self,
        func: &'m IrFunction,
        host: &mut dyn PrintHost,
    ) -> Result<Option<Value>, RuntimeError> {
        let mut frame = Frame::default();
        let mut current = BlockId::ENTRY;

        loop {
            let block = func
                .block(current)
                .ok_or_else(|| malformed(format!("@{} has no block #{}", func.name, current.0)))?;
            trace!("@{}: entering {}", func.name, block.name);

            for inst in &block.insts {
                self.tick()?;
                self.exec(inst, &mut frame, host)?;
            }

            self.tick()?;
            let term = block
                .terminator
                .as_ref()
                .ok_or_else(|| malformed(format!("block '{}' has no terminator", block.name)))?;

            current = match term {
                Terminator::Br { target } => *target,
                Terminator::CondBr {
                    cond,
                    then_block,
                    else_block,
                } => {
                    if frame.operand(cond)?.truthy() {
                        *then_block
                    } else {
                        *else_block
                    }
                }
                Terminator::Ret { value } => {
                    return value.as_ref().map(|v| frame.operand(v)).transpose();
                }
            };
        }
    }

    fn exec(
        &mut self,
        inst: &IrInst,
        frame: &mut Frame,
        host: &mut dyn PrintHost,
    ) -> Result<(), RuntimeError> {
        match inst {
            IrInst::Load { dest, global, .. } => {
                let value = self
                    .globals
                    .get(global)
                    .copied()
                    .ok_or_else(|| malformed(format!("load from unknown global @{}", global)))?;
                frame.define(*dest, value);
            }
            IrInst::Store { value, global } => {
                let value = frame.operand(value)?;
                let slot = self
                    .globals
                    .get_mut(global)
                    .ok_or_else(|| malformed(format!("store to unknown global @{}", global)))?;
                *slot = value;
            }
            IrInst::BinOp {
                dest,
                op,
                left,
                right,
            } => {
                let value = apply_binary(op.source_op(), frame.operand(left)?, frame.operand(right)?)?;
                frame.define(*dest, value);
            }
            IrInst::ICmp {
                dest,
                pred,
                left,
                right,
            } => {
                let value =
                    apply_binary(pred.source_op(), frame.operand(left)?, frame.operand(right)?)?;
                frame.define(*dest, value);
            }
            IrInst::ZExt { dest, value } => {
                let value = frame.operand(value)?;
                frame.define(*dest, Value::Int(value.as_i32()));
            }
            IrInst::Call { dest, func, args, .. } => {
                let args = args
                    .iter()
                    .map(|a| frame.operand(a))
                    .collect::<Result<Vec<_>, _>>()?;
                let result = self.call(func, &args, host)?;
                if let (Some(dest), Some(value)) = (dest, result) {
                    frame.define(*dest, value);
                }
            }
        }
        Ok(())
    }
}

/// SSA values of one function activation
#[derive(Default)]
struct Frame {
    values: HashMap<ValueId, Value>,
}

impl Frame {
    fn define(&mut self, id: ValueId, value: Value) {
        self.values.insert(id, value);
    }

    fn operand(&self, value: &IrValue) -> Result<Value, RuntimeError> {
        match value {
            IrValue::Const(c) => Ok(Value::from(*c)),
            IrValue::Temp { id, .. } => self
                .values
                .get(id)
                .copied()
                .ok_or_else(|| malformed(format!("use of undefined value {}", id))),
        }
    }
}
