//! Stack code generation
//!
//! Single post-order walk: left operand, right operand, then the operator.

use log::trace;

use super::StackInst;
use crate::ast::Expr;

/// Lower an expression to stack code
pub fn emit_stack(expr: &Expr) -> Vec<StackInst> {
    let mut code = Vec::with_capacity(expr.leaf_count() + expr.binary_count());
    emit_stack_into(expr, &mut code);
    code
}

/// Append the stack code for `expr` to `code`
pub fn emit_stack_into(expr: &Expr, code: &mut Vec<StackInst>) {
    let inst = match expr {
        Expr::Bool(true) => StackInst::LoadTrue,
        Expr::Bool(false) => StackInst::LoadFalse,
        Expr::Int(v) => StackInst::LoadImm(*v),
        Expr::Var(id) => StackInst::LoadMem(*id),
        Expr::Binary { op, left, right } => {
            emit_stack_into(left, code);
            emit_stack_into(right, code);
            StackInst::Binary(*op)
        }
    };
    trace!("stack: {}", inst);
    code.push(inst);
}
