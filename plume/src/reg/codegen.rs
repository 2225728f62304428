//! Register code generation
//!
//! A node's result register is allocated before its operands are lowered,
//! so a parent's register number is always lower than its children's.

use log::trace;

use super::{RegAllocator, RegInst, VReg};
use crate::ast::Expr;

/// Lower `expr`, appending instructions to `code`; returns the register
/// holding the result.
pub fn emit_reg(expr: &Expr, alloc: &mut RegAllocator, code: &mut Vec<RegInst>) -> VReg {
    let dest = alloc.fresh();

    let inst = match expr {
        Expr::Bool(value) => RegInst::LoadBool { dest, value: *value },
        Expr::Int(value) => RegInst::LoadInt { dest, value: *value },
        Expr::Var(var) => RegInst::Load { dest, var: *var },
        Expr::Binary { op, left, right } => {
            let left = emit_reg(left, alloc, code);
            let right = emit_reg(right, alloc, code);
            RegInst::Binary {
                dest,
                op: *op,
                left,
                right,
            }
        }
    };

    trace!("reg: {}", inst);
    code.push(inst);
    dest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, VarId};

    fn lower(expr: &Expr) -> (VReg, Vec<RegInst>) {
        let mut alloc = RegAllocator::new();
        let mut code = Vec::new();
        let result = emit_reg(expr, &mut alloc, &mut code);
        (result, code)
    }

    #[test]
    fn test_sum_chain() {
        let expr = Expr::binary(Expr::int_lit(2), BinaryOp::Add, Expr::int_lit(3));
        let (result, code) = lower(&expr);

        assert_eq!(result, VReg(0));
        let text: Vec<String> = code.iter().map(|i| i.to_string()).collect();
        assert_eq!(text, vec!["r1 = 2", "r2 = 3", "r0 = add r1, r2"]);
    }

    #[test]
    fn test_parent_register_below_children() {
        // (x && 6) || (y / 2)
        let expr = Expr::binary(
            Expr::binary(Expr::var(VarId(0)), BinaryOp::And, Expr::int_lit(6)),
            BinaryOp::Or,
            Expr::binary(Expr::var(VarId(1)), BinaryOp::Div, Expr::int_lit(2)),
        );
        let (result, code) = lower(&expr);
        assert_eq!(result, VReg(0));

        for inst in &code {
            if let RegInst::Binary {
                dest, left, right, ..
            } = inst
            {
                assert!(dest < left, "{}", inst);
                assert!(dest < right, "{}", inst);
            }
        }

        // Last instruction combines the two subtrees into r0
        assert_eq!(code.last().unwrap().to_string(), "r0 = or r1, r4");
    }

    #[test]
    fn test_numbering_continues_across_expressions() {
        let mut alloc = RegAllocator::new();
        let mut code = Vec::new();
        let first = emit_reg(&Expr::int_lit(1), &mut alloc, &mut code);
        let second = emit_reg(&Expr::bool_lit(false), &mut alloc, &mut code);

        assert_eq!(first, VReg(0));
        assert_eq!(second, VReg(1));
        assert_eq!(code[1].to_string(), "r1 = 0");
    }
}
