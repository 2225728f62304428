//! Register-Machine Backend
//!
//! Three-address code over an unbounded supply of virtual registers. There
//! is no register allocation beyond handing out fresh numbers.

pub mod codegen;
pub mod machine;
pub mod registers;

pub use codegen::emit_reg;
pub use machine::RegisterMachine;
pub use registers::{RegAllocator, VReg};

use std::fmt;

use crate::ast::{BinaryOp, VarId};
use crate::fmt::format_expr;
use crate::program::Program;
use crate::symbols::Context;

/// Register-machine instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegInst {
    /// r<dest> = <int>
    LoadInt { dest: VReg, value: i32 },
    /// r<dest> = 1 or 0
    LoadBool { dest: VReg, value: bool },
    /// r<dest> = load <var>
    Load { dest: VReg, var: VarId },
    /// r<dest> = <op> r<left>, r<right>
    Binary {
        dest: VReg,
        op: BinaryOp,
        left: VReg,
        right: VReg,
    },
}

impl RegInst {
    /// Register written by this instruction
    pub fn dest(&self) -> VReg {
        match self {
            RegInst::LoadInt { dest, .. }
            | RegInst::LoadBool { dest, .. }
            | RegInst::Load { dest, .. }
            | RegInst::Binary { dest, .. } => *dest,
        }
    }

    /// Registers read by this instruction
    pub fn uses(&self) -> Vec<VReg> {
        match self {
            RegInst::Binary { left, right, .. } => vec![*left, *right],
            _ => vec![],
        }
    }
}

impl fmt::Display for RegInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegInst::LoadInt { dest, value } => write!(f, "{} = {}", dest, value),
            RegInst::LoadBool { dest, value } => write!(f, "{} = {}", dest, *value as i32),
            RegInst::Load { dest, var } => write!(f, "{} = load {}", dest, var),
            RegInst::Binary {
                dest,
                op,
                left,
                right,
            } => write!(f, "{} = {} {}, {}", dest, op.mnemonic(), left, right),
        }
    }
}

/// Render register code one instruction per line; with a context, loads
/// carry a `# name` comment.
pub fn render(code: &[RegInst], ctx: Option<&Context>) -> String {
    let mut output = String::new();
    for inst in code {
        output.push_str(&inst.to_string());
        if let (RegInst::Load { var, .. }, Some(ctx)) = (inst, ctx) {
            output.push_str(" # ");
            output.push_str(&ctx.display_name(*var));
        }
        output.push('\n');
    }
    output
}

/// Register code for every expression of a program in statement order.
///
/// All expressions share one allocator, so register numbers are unique
/// across the whole listing.
pub fn listing(program: &Program, annotate: bool) -> String {
    let ctx = &program.context;
    let mut alloc = RegAllocator::new();
    let mut output = String::new();

    for (i, expr) in program.body.expressions().into_iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        let mut code = Vec::new();
        emit_reg(expr, &mut alloc, &mut code);
        output.push_str(&format!("# {}\n", format_expr(expr, ctx)));
        output.push_str(&render(&code, annotate.then_some(ctx)));
    }

    output
}
