//! IR Type Definitions
//!
//! Core data structures for the structured backend: a module of globals,
//! external declarations and functions made of basic blocks.

use std::collections::HashSet;
use std::fmt;

use crate::ast::VarId;
use crate::symbols::Width;
use crate::{PlumeError, Result};

/// Types in IR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrType {
    I1,
    I32,
    Void,
}

impl From<Width> for IrType {
    fn from(width: Width) -> Self {
        match width {
            Width::I1 => IrType::I1,
            Width::I32 => IrType::I32,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::I1 => write!(f, "i1"),
            IrType::I32 => write!(f, "i32"),
            IrType::Void => write!(f, "void"),
        }
    }
}

/// Constant values in IR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrConst {
    I1(bool),
    I32(i32),
}

impl IrConst {
    pub fn ir_type(&self) -> IrType {
        match self {
            IrConst::I1(_) => IrType::I1,
            IrConst::I32(_) => IrType::I32,
        }
    }

    /// Zero value of a storage width
    pub fn zero(width: Width) -> Self {
        match width {
            Width::I1 => IrConst::I1(false),
            Width::I32 => IrConst::I32(0),
        }
    }
}

impl fmt::Display for IrConst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrConst::I1(b) => write!(f, "{}", b),
            IrConst::I32(v) => write!(f, "{}", v),
        }
    }
}

/// Unnamed SSA value: %0, %1, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Index of a basic block within its function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

impl BlockId {
    pub const ENTRY: BlockId = BlockId(0);
}

/// Instruction operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrValue {
    Const(IrConst),
    Temp { id: ValueId, ty: IrType },
}

impl IrValue {
    pub fn ty(&self) -> IrType {
        match self {
            IrValue::Const(c) => c.ir_type(),
            IrValue::Temp { ty, .. } => *ty,
        }
    }

    /// Value number, if this is not a constant
    pub fn temp(&self) -> Option<ValueId> {
        match self {
            IrValue::Temp { id, .. } => Some(*id),
            IrValue::Const(_) => None,
        }
    }
}

impl fmt::Display for IrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrValue::Const(c) => write!(f, "{}", c),
            IrValue::Temp { id, .. } => write!(f, "{}", id),
        }
    }
}

/// Arithmetic and bitwise operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrBinOp {
    Add,
    Sub,
    Mul,
    SDiv,
    And,
    Or,
}

impl fmt::Display for IrBinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrBinOp::Add => write!(f, "add"),
            IrBinOp::Sub => write!(f, "sub"),
            IrBinOp::Mul => write!(f, "mul"),
            IrBinOp::SDiv => write!(f, "sdiv"),
            IrBinOp::And => write!(f, "and"),
            IrBinOp::Or => write!(f, "or"),
        }
    }
}

/// Integer comparison predicates (signed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpPred {
    Eq,
    Ne,
    Sge,
    Sle,
    Sgt,
    Slt,
}

impl fmt::Display for IcmpPred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IcmpPred::Eq => write!(f, "eq"),
            IcmpPred::Ne => write!(f, "ne"),
            IcmpPred::Sge => write!(f, "sge"),
            IcmpPred::Sle => write!(f, "sle"),
            IcmpPred::Sgt => write!(f, "sgt"),
            IcmpPred::Slt => write!(f, "slt"),
        }
    }
}

/// Non-terminator instruction
#[derive(Debug, Clone, PartialEq)]
pub enum IrInst {
    /// %dest = load ty, ptr @global
    Load { dest: ValueId, ty: IrType, global: String },

    /// store ty value, ptr @global
    Store { value: IrValue, global: String },

    /// %dest = op ty left, right
    BinOp {
        dest: ValueId,
        op: IrBinOp,
        left: IrValue,
        right: IrValue,
    },

    /// %dest = icmp pred ty left, right
    ICmp {
        dest: ValueId,
        pred: IcmpPred,
        left: IrValue,
        right: IrValue,
    },

    /// %dest = zext i1 value to i32
    ZExt { dest: ValueId, value: IrValue },

    /// [%dest =] call ret @func(args...)
    Call {
        dest: Option<ValueId>,
        func: String,
        return_type: IrType,
        args: Vec<IrValue>,
    },
}

impl IrInst {
    /// Get the value defined by this instruction
    pub fn dest(&self) -> Option<ValueId> {
        match self {
            IrInst::Load { dest, .. }
            | IrInst::BinOp { dest, .. }
            | IrInst::ICmp { dest, .. }
            | IrInst::ZExt { dest, .. } => Some(*dest),
            IrInst::Call { dest, .. } => *dest,
            IrInst::Store { .. } => None,
        }
    }

    /// Get operands read by this instruction
    pub fn uses(&self) -> Vec<IrValue> {
        match self {
            IrInst::Load { .. } => vec![],
            IrInst::Store { value, .. } | IrInst::ZExt { value, .. } => vec![*value],
            IrInst::BinOp { left, right, .. } | IrInst::ICmp { left, right, .. } => {
                vec![*left, *right]
            }
            IrInst::Call { args, .. } => args.clone(),
        }
    }
}

impl fmt::Display for IrInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrInst::Load { dest, ty, global } => {
                write!(f, "{} = load {}, ptr @{}", dest, ty, global)
            }
            IrInst::Store { value, global } => {
                write!(f, "store {} {}, ptr @{}", value.ty(), value, global)
            }
            IrInst::BinOp {
                dest,
                op,
                left,
                right,
            } => write!(f, "{} = {} {} {}, {}", dest, op, left.ty(), left, right),
            IrInst::ICmp {
                dest,
                pred,
                left,
                right,
            } => write!(f, "{} = icmp {} {} {}, {}", dest, pred, left.ty(), left, right),
            IrInst::ZExt { dest, value } => {
                write!(f, "{} = zext {} {} to i32", dest, value.ty(), value)
            }
            IrInst::Call {
                dest,
                func,
                return_type,
                args,
            } => {
                if let Some(dest) = dest {
                    write!(f, "{} = ", dest)?;
                }
                let args: Vec<String> = args.iter().map(|a| format!("{} {}", a.ty(), a)).collect();
                write!(f, "call {} @{}({})", return_type, func, args.join(", "))
            }
        }
    }
}

/// Block terminator
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Br { target: BlockId },
    CondBr {
        cond: IrValue,
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret { value: Option<IrValue> },
}

impl Terminator {
    /// Blocks control may transfer to
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Br { target } => vec![*target],
            Terminator::CondBr {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Ret { .. } => vec![],
        }
    }
}

/// Straight-line code ending in exactly one terminator
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub name: String,
    pub insts: Vec<IrInst>,
    pub terminator: Option<Terminator>,
}

impl BasicBlock {
    pub fn new(name: impl Into<String>) -> Self {
        BasicBlock {
            name: name.into(),
            insts: Vec::new(),
            terminator: None,
        }
    }
}

/// IR function
#[derive(Debug, Clone)]
pub struct IrFunction {
    pub name: String,
    pub return_type: IrType,
    /// The first block is the entry block
    pub blocks: Vec<BasicBlock>,
}

impl IrFunction {
    pub fn new(name: impl Into<String>, return_type: IrType) -> Self {
        IrFunction {
            name: name.into(),
            return_type,
            blocks: Vec::new(),
        }
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.0)
    }

    /// Find a block by its (unique) name
    pub fn block_named(&self, name: &str) -> Option<BlockId> {
        self.blocks.iter().position(|b| b.name == name).map(BlockId)
    }

    /// Count instructions, terminators included
    pub fn instruction_count(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| b.insts.len() + usize::from(b.terminator.is_some()))
            .sum()
    }

    /// Check structural well-formedness: an entry block exists, every block
    /// is terminated, block names are unique and every branch target exists.
    pub fn verify(&self) -> Result<()> {
        let invalid = |message: String| PlumeError::Lowering {
            message: format!("function '{}': {}", self.name, message),
        };

        if self.blocks.is_empty() {
            return Err(invalid("no entry block".to_string()));
        }

        let mut names = HashSet::new();
        for block in &self.blocks {
            if !names.insert(block.name.as_str()) {
                return Err(invalid(format!("duplicate block name '{}'", block.name)));
            }

            let terminator = block
                .terminator
                .as_ref()
                .ok_or_else(|| invalid(format!("block '{}' has no terminator", block.name)))?;

            for target in terminator.successors() {
                if self.block(target).is_none() {
                    return Err(invalid(format!(
                        "block '{}' branches to missing block #{}",
                        block.name, target.0
                    )));
                }
            }
        }

        Ok(())
    }

    fn label(&self, id: BlockId) -> String {
        match self.block(id) {
            Some(block) => format!("%{}", block.name),
            None => format!("%bb{}", id.0),
        }
    }

    fn fmt_terminator(&self, term: &Terminator) -> String {
        match term {
            Terminator::Br { target } => format!("br label {}", self.label(*target)),
            Terminator::CondBr {
                cond,
                then_block,
                else_block,
            } => format!(
                "br i1 {}, label {}, label {}",
                cond,
                self.label(*then_block),
                self.label(*else_block)
            ),
            Terminator::Ret { value: Some(v) } => format!("ret {} {}", v.ty(), v),
            Terminator::Ret { value: None } => "ret void".to_string(),
        }
    }
}

impl fmt::Display for IrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "define {} @{}() {{", self.return_type, self.name)?;
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}:", block.name)?;
            for inst in &block.insts {
                writeln!(f, "  {}", inst)?;
            }
            if let Some(term) = &block.terminator {
                writeln!(f, "  {}", self.fmt_terminator(term))?;
            }
        }
        writeln!(f, "}}")
    }
}

/// Zero-initialised storage slot for one program variable
#[derive(Debug, Clone, PartialEq)]
pub struct IrGlobal {
    pub name: String,
    pub var: VarId,
    pub init: IrConst,
}

impl IrGlobal {
    pub fn ty(&self) -> IrType {
        self.init.ir_type()
    }
}

impl fmt::Display for IrGlobal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{} = global {} {}", self.name, self.ty(), self.init)
    }
}

/// External function declaration
#[derive(Debug, Clone, PartialEq)]
pub struct IrExtern {
    pub name: String,
    pub params: Vec<IrType>,
    pub return_type: IrType,
}

impl fmt::Display for IrExtern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        write!(f, "declare {} @{}({})", self.return_type, self.name, params.join(", "))
    }
}

/// Complete IR module
#[derive(Debug, Clone)]
pub struct IrModule {
    pub name: String,
    pub globals: Vec<IrGlobal>,
    pub externs: Vec<IrExtern>,
    pub functions: Vec<IrFunction>,
}

impl IrModule {
    pub fn new(name: impl Into<String>) -> Self {
        IrModule {
            name: name.into(),
            globals: Vec::new(),
            externs: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Find a function by name
    pub fn find_function(&self, name: &str) -> Option<&IrFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn find_extern(&self, name: &str) -> Option<&IrExtern> {
        self.externs.iter().find(|e| e.name == name)
    }

    pub fn find_global(&self, name: &str) -> Option<&IrGlobal> {
        self.globals.iter().find(|g| g.name == name)
    }

    /// Whether `name` is already taken by a global, extern or function
    pub fn has_symbol(&self, name: &str) -> bool {
        self.find_global(name).is_some()
            || self.find_extern(name).is_some()
            || self.find_function(name).is_some()
    }

    /// Verify every function and check that globals, externs and functions
    /// share no name
    pub fn verify(&self) -> Result<()> {
        let mut names = HashSet::new();
        let symbols = self
            .globals
            .iter()
            .map(|g| g.name.as_str())
            .chain(self.externs.iter().map(|e| e.name.as_str()))
            .chain(self.functions.iter().map(|f| f.name.as_str()));
        for name in symbols {
            if !names.insert(name) {
                return Err(PlumeError::Lowering {
                    message: format!("module '{}': symbol @{} defined twice", self.name, name),
                });
            }
        }

        self.functions.iter().try_for_each(IrFunction::verify)
    }
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;

        if !self.globals.is_empty() {
            writeln!(f)?;
            for global in &self.globals {
                writeln!(f, "{}", global)?;
            }
        }

        if !self.externs.is_empty() {
            writeln!(f)?;
            for ext in &self.externs {
                writeln!(f, "{}", ext)?;
            }
        }

        for func in &self.functions {
            writeln!(f)?;
            write!(f, "{}", func)?;
        }

        Ok(())
    }
}
