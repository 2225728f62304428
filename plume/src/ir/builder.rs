//! Instruction builder
//!
//! Appends blocks to a function under construction and inserts instructions
//! at the end of the current block.

use std::collections::HashMap;

use super::types::*;
use crate::{PlumeError, Result};

fn lowering_error(message: impl Into<String>) -> PlumeError {
    PlumeError::Lowering {
        message: message.into(),
    }
}

/// Builds one [`IrFunction`]
pub struct Builder {
    func: IrFunction,
    current: Option<BlockId>,
    /// Next unnamed value number
    next_value: u32,
    /// Uses per block name, for uniquing
    name_counts: HashMap<String, usize>,
}

impl Builder {
    pub fn new(name: impl Into<String>, return_type: IrType) -> Self {
        Builder {
            func: IrFunction::new(name, return_type),
            current: None,
            next_value: 0,
            name_counts: HashMap::new(),
        }
    }

    /// i32 constant operand
    pub fn const_i32(value: i32) -> IrValue {
        IrValue::Const(IrConst::I32(value))
    }

    /// i1 constant operand
    pub fn const_i1(value: bool) -> IrValue {
        IrValue::Const(IrConst::I1(value))
    }

    /// Append a new empty block at the end of the function.
    ///
    /// Repeated names get a numeric suffix: `cond`, `cond1`, `cond2`.
    pub fn append_block(&mut self, name: &str) -> BlockId {
        let count = self.name_counts.entry(name.to_string()).or_insert(0);
        let unique = if *count == 0 {
            name.to_string()
        } else {
            format!("{}{}", name, count)
        };
        *count += 1;

        let id = BlockId(self.func.blocks.len());
        self.func.blocks.push(BasicBlock::new(unique));
        id
    }

    /// Direct subsequent instructions to the end of `block`
    pub fn position_at_end(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.current
    }

    fn fresh_value(&mut self) -> ValueId {
        let id = ValueId(self.next_value);
        self.next_value += 1;
        id
    }

    fn block_mut(&mut self) -> Result<&mut BasicBlock> {
        let id = self
            .current
            .ok_or_else(|| lowering_error("no insertion block"))?;
        let block = self
            .func
            .blocks
            .get_mut(id.0)
            .ok_or_else(|| lowering_error(format!("unknown block #{}", id.0)))?;
        if block.terminator.is_some() {
            return Err(lowering_error(format!(
                "block '{}' is already terminated",
                block.name
            )));
        }
        Ok(block)
    }

    fn insert(&mut self, inst: IrInst) -> Result<()> {
        self.block_mut()?.insts.push(inst);
        Ok(())
    }

    fn terminate(&mut self, term: Terminator) -> Result<()> {
        self.block_mut()?.terminator = Some(term);
        Ok(())
    }

    pub fn build_load(&mut self, ty: IrType, global: &str) -> Result<IrValue> {
        let dest = self.fresh_value();
        self.insert(IrInst::Load {
            dest,
            ty,
            global: global.to_string(),
        })?;
        Ok(IrValue::Temp { id: dest, ty })
    }

    pub fn build_store(&mut self, value: IrValue, global: &str) -> Result<()> {
        self.insert(IrInst::Store {
            value,
            global: global.to_string(),
        })
    }

    /// Result has the type of the operands
    pub fn build_binop(&mut self, op: IrBinOp, left: IrValue, right: IrValue) -> Result<IrValue> {
        if left.ty() != right.ty() {
            return Err(lowering_error(format!(
                "operand types differ for {}: {} and {}",
                op,
                left.ty(),
                right.ty()
            )));
        }
        let ty = left.ty();
        let dest = self.fresh_value();
        self.insert(IrInst::BinOp {
            dest,
            op,
            left,
            right,
        })?;
        Ok(IrValue::Temp { id: dest, ty })
    }

    pub fn build_icmp(&mut self, pred: IcmpPred, left: IrValue, right: IrValue) -> Result<IrValue> {
        if left.ty() != right.ty() {
            return Err(lowering_error(format!(
                "operand types differ for icmp {}: {} and {}",
                pred,
                left.ty(),
                right.ty()
            )));
        }
        let dest = self.fresh_value();
        self.insert(IrInst::ICmp {
            dest,
            pred,
            left,
            right,
        })?;
        Ok(IrValue::Temp {
            id: dest,
            ty: IrType::I1,
        })
    }

    /// Widen an i1 to i32
    pub fn build_zext(&mut self, value: IrValue) -> Result<IrValue> {
        let dest = self.fresh_value();
        self.insert(IrInst::ZExt { dest, value })?;
        Ok(IrValue::Temp {
            id: dest,
            ty: IrType::I32,
        })
    }

    /// Returns the call's result, or `None` for void calls
    pub fn build_call(
        &mut self,
        func: &str,
        return_type: IrType,
        args: Vec<IrValue>,
    ) -> Result<Option<IrValue>> {
        let dest = (return_type != IrType::Void).then(|| self.fresh_value());
        self.insert(IrInst::Call {
            dest,
            func: func.to_string(),
            return_type,
            args,
        })?;
        Ok(dest.map(|id| IrValue::Temp {
            id,
            ty: return_type,
        }))
    }

    pub fn build_br(&mut self, target: BlockId) -> Result<()> {
        self.terminate(Terminator::Br { target })
    }

    pub fn build_cond_br(
        &mut self,
        cond: IrValue,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<()> {
        self.terminate(Terminator::CondBr {
            cond,
            then_block,
            else_block,
        })
    }

    pub fn build_ret(&mut self, value: Option<IrValue>) -> Result<()> {
        self.terminate(Terminator::Ret { value })
    }

    /// Verify and return the finished function
    pub fn finish(self) -> Result<IrFunction> {
        self.func.verify()?;
        Ok(self.func)
    }
}
