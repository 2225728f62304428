//! Stack-Machine Backend
//!
//! Lowers expressions to a post-order instruction stream for a classic
//! operand-stack machine. Each leaf instruction pushes one value; each binary
//! instruction pops two and pushes one.

pub mod codegen;
pub mod machine;

pub use codegen::{emit_stack, emit_stack_into};
pub use machine::{check_balance, StackMachine};

use std::fmt;

use crate::ast::{BinaryOp, VarId};
use crate::fmt::format_expr;
use crate::program::Program;
use crate::symbols::Context;

/// Stack-machine instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackInst {
    LoadTrue,
    LoadFalse,
    /// Push an integer immediate
    LoadImm(i32),
    /// Push the current value of a variable
    LoadMem(VarId),
    /// Pop right, pop left, push `left op right`
    Binary(BinaryOp),
}

impl StackInst {
    /// Number of values popped
    pub fn pops(&self) -> usize {
        match self {
            StackInst::Binary(_) => 2,
            _ => 0,
        }
    }

    /// Number of values pushed
    pub fn pushes(&self) -> usize {
        1
    }
}

impl fmt::Display for StackInst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackInst::LoadTrue => write!(f, "load_true"),
            StackInst::LoadFalse => write!(f, "load_false"),
            StackInst::LoadImm(v) => write!(f, "load_imm {}", v),
            StackInst::LoadMem(id) => write!(f, "load_mem {}", id),
            StackInst::Binary(op) => write!(f, "{}", op.mnemonic()),
        }
    }
}

/// Render an instruction stream, one instruction per line.
///
/// With a context, memory loads carry a `# name` comment.
pub fn render(code: &[StackInst], ctx: Option<&Context>) -> String {
    let mut output = String::new();
    for inst in code {
        output.push_str(&inst.to_string());
        if let (StackInst::LoadMem(id), Some(ctx)) = (inst, ctx) {
            output.push_str(" # ");
            output.push_str(&ctx.display_name(*id));
        }
        output.push('\n');
    }
    output
}

/// Stack code for every expression of a program, in statement order, each
/// block headed by a `# <expr>` comment.
pub fn listing(program: &Program, annotate: bool) -> String {
    let ctx = &program.context;
    let mut output = String::new();

    for (i, expr) in program.body.expressions().into_iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&format!("# {}\n", format_expr(expr, ctx)));
        output.push_str(&render(&emit_stack(expr), annotate.then_some(ctx)));
    }

    output
}
