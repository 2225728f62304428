//! Runtime values shared by the reference machines
//!
//! The stack machine, register machine and IR interpreter all evaluate
//! binary operators through [`apply_binary`], so the three backends agree on
//! language semantics by construction:
//!
//! - `+ - *` wrap on 32-bit overflow
//! - `/` is signed division; dividing by zero or `i32::MIN / -1` is an error
//! - `&&` / `||` are logical on booleans and bitwise on integers
//! - `||` with one integer and one boolean side treats the integer as
//!   `value != 0`

use std::collections::HashMap;
use std::fmt;

use crate::ast::{BinaryOp, VarId};
use crate::symbols::{Context, Width};
use crate::RuntimeError;

/// A dynamically typed runtime value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Bool(bool),
}

impl Value {
    /// Initial value of a storage slot
    pub fn zero(width: Width) -> Self {
        match width {
            Width::I1 => Value::Bool(false),
            Width::I32 => Value::Int(0),
        }
    }

    /// Nonzero test, as used by `print_i1`
    pub fn truthy(self) -> bool {
        match self {
            Value::Int(v) => v != 0,
            Value::Bool(b) => b,
        }
    }

    /// Bit pattern of the value at its storage width
    pub fn as_i32(self) -> i32 {
        match self {
            Value::Int(v) => v,
            Value::Bool(b) => b as i32,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Variable memory for the stack and register machines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Memory {
    cells: HashMap<VarId, Value>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-initialized cell for every variable bound in `ctx`
    pub fn from_context(ctx: &Context) -> Self {
        let mut memory = Self::new();
        for slot in ctx.storage.slots() {
            memory.set(slot.id, Value::zero(slot.width));
        }
        memory
    }

    pub fn get(&self, id: VarId) -> Option<Value> {
        self.cells.get(&id).copied()
    }

    pub fn set(&mut self, id: VarId, value: Value) {
        self.cells.insert(id, value);
    }
}

fn mismatch(op: BinaryOp) -> RuntimeError {
    RuntimeError::TypeMismatch {
        op: op.symbol().to_string(),
    }
}

/// Evaluate `left op right`
pub fn apply_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
    use Value::{Bool, Int};

    let result = match (op, left, right) {
        (BinaryOp::Add, Int(a), Int(b)) => Int(a.wrapping_add(b)),
        (BinaryOp::Sub, Int(a), Int(b)) => Int(a.wrapping_sub(b)),
        (BinaryOp::Mul, Int(a), Int(b)) => Int(a.wrapping_mul(b)),
        (BinaryOp::Div, Int(_), Int(0)) => return Err(RuntimeError::DivisionByZero),
        (BinaryOp::Div, Int(a), Int(b)) => match a.checked_div(b) {
            Some(v) => Int(v),
            None => {
                return Err(RuntimeError::Overflow {
                    op: op.symbol().to_string(),
                })
            }
        },

        (BinaryOp::Eq, Int(a), Int(b)) => Bool(a == b),
        (BinaryOp::Eq, Bool(a), Bool(b)) => Bool(a == b),
        (BinaryOp::Ne, Int(a), Int(b)) => Bool(a != b),
        (BinaryOp::Ne, Bool(a), Bool(b)) => Bool(a != b),

        (BinaryOp::Ge, Int(a), Int(b)) => Bool(a >= b),
        (BinaryOp::Le, Int(a), Int(b)) => Bool(a <= b),
        (BinaryOp::Gt, Int(a), Int(b)) => Bool(a > b),
        (BinaryOp::Lt, Int(a), Int(b)) => Bool(a < b),

        (BinaryOp::And, Bool(a), Bool(b)) => Bool(a && b),
        (BinaryOp::And, Int(a), Int(b)) => Int(a & b),

        (BinaryOp::Or, Bool(a), Bool(b)) => Bool(a || b),
        (BinaryOp::Or, Int(a), Int(b)) => Int(a | b),
        (BinaryOp::Or, Int(a), Bool(b)) => Bool(a != 0 || b),
        (BinaryOp::Or, Bool(a), Int(b)) => Bool(a || b != 0),

        _ => return Err(mismatch(op)),
    };

    Ok(result)
}
