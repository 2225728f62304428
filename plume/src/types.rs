//! Plume Type System
//!
//! Type checking for expressions and whole-program validation.
//!
//! Type errors are data: a mismatch yields [`Type::Error`], which propagates
//! upward. The validator is the single place that turns "some subtree has
//! type `Error`" into an accept/reject verdict.

use log::trace;

use crate::ast::{BinaryOp, Expr, Stmt, Type};
use crate::symbols::Context;

/// Static type of an expression.
///
/// Pure and total. The only external state consulted is the storage width
/// of referenced variables.
pub fn type_of(expr: &Expr, ctx: &Context) -> Type {
    match expr {
        Expr::Bool(_) => Type::Boolean,
        Expr::Int(_) => Type::Integer,
        Expr::Var(id) => ctx.type_of_var(*id),
        Expr::Binary { op, left, right } => {
            // Both sides are always evaluated, left first
            let lhs = type_of(left, ctx);
            let rhs = type_of(right, ctx);
            binary_result_type(*op, lhs, rhs)
        }
    }
}

/// Result type of `lhs op rhs` given the operand types
pub fn binary_result_type(op: BinaryOp, lhs: Type, rhs: Type) -> Type {
    if lhs == Type::Error || rhs == Type::Error {
        return Type::Error;
    }

    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            if lhs == Type::Integer && rhs == Type::Integer {
                Type::Integer
            } else {
                Type::Error
            }
        }

        // Same-type equality, no coercion
        BinaryOp::Eq | BinaryOp::Ne => {
            if lhs == rhs && lhs.is_value_type() {
                Type::Boolean
            } else {
                Type::Error
            }
        }

        BinaryOp::Ge | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Lt => {
            if lhs == Type::Integer && rhs == Type::Integer {
                Type::Boolean
            } else {
                Type::Error
            }
        }

        // Logical on booleans, bitwise on integers; both sides must agree
        BinaryOp::And => {
            if lhs == Type::Boolean && rhs == Type::Boolean {
                Type::Boolean
            } else if lhs == Type::Integer && rhs == Type::Integer {
                Type::Integer
            } else {
                Type::Error
            }
        }

        // Unlike And, one boolean side is enough
        BinaryOp::Or => {
            if lhs == Type::Boolean || rhs == Type::Boolean {
                Type::Boolean
            } else if lhs == Type::Integer || rhs == Type::Integer {
                Type::Integer
            } else {
                Type::Error
            }
        }
    }
}

/// Whether an expression can be the operand of `++` / `--`: a variable
/// stored as a 32-bit integer.
pub fn is_increment_target(expr: &Expr, ctx: &Context) -> bool {
    match expr.as_var() {
        Some(id) => ctx.type_of_var(id) == Type::Integer,
        None => false,
    }
}

/// Accept a statement tree only if every carried expression type-checks and
/// every condition is boolean.
pub fn is_valid(stmt: &Stmt, ctx: &Context) -> bool {
    let valid = match stmt {
        Stmt::Seq { first, second } => is_valid(first, ctx) && is_valid(second, ctx),

        // Definite assignment is not checked: a variable may be read before
        // any assignment and then holds its zero initializer.
        Stmt::Assign { target, value } => {
            let value_ty = type_of(value, ctx);
            value_ty != Type::Error && ctx.type_of_var(*target) != Type::Error
        }

        Stmt::Print { value } => type_of(value, ctx) != Type::Error,

        Stmt::Increment { value } | Stmt::Decrement { value } => {
            type_of(value, ctx) != Type::Error && is_increment_target(value, ctx)
        }

        Stmt::While { cond, body } => type_of(cond, ctx) == Type::Boolean && is_valid(body, ctx),

        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => {
            type_of(cond, ctx) == Type::Boolean
                && is_valid(then_branch, ctx)
                && else_branch
                    .as_ref()
                    .map_or(true, |else_branch| is_valid(else_branch, ctx))
        }
    };

    if !valid {
        trace!("rejected {} statement", stmt.kind());
    }
    valid
}
