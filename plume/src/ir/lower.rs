//! IR Lowering
//!
//! Converts a checked [`Program`] into an [`IrModule`]: one zero-initialised
//! global per variable, the two print externals, and a `main` function whose
//! control flow is made explicit with basic blocks.

use std::collections::HashMap;

use log::{debug, trace};

use crate::ast::{BinaryOp, Expr, Stmt, Type, VarId};
use crate::program::Program;
use crate::symbols::Context;
use crate::types::type_of;
use crate::{PlumeError, Result};

use super::builder::Builder;
use super::types::*;

/// Module name used in listings
pub const MODULE_NAME: &str = "plume";
/// External receiving integer `print` arguments
pub const PRINT_I32: &str = "print_i32";
/// External receiving boolean `print` arguments
pub const PRINT_I1: &str = "print_i1";
/// Function holding the program body
pub const MAIN: &str = "main";

/// Lower a checked program to IR
pub fn lower_program(program: &Program) -> Result<IrModule> {
    let lowerer = IrLowerer::new(&program.context);
    lowerer.lower(&program.body)
}

/// IR lowering state
struct IrLowerer<'a> {
    ctx: &'a Context,
    module: IrModule,
    builder: Builder,
    /// Global name and type backing each variable
    slots: HashMap<VarId, (String, IrType)>,
}

impl<'a> IrLowerer<'a> {
    fn new(ctx: &'a Context) -> Self {
        IrLowerer {
            ctx,
            module: IrModule::new(MODULE_NAME),
            builder: Builder::new(MAIN, IrType::Void),
            slots: HashMap::new(),
        }
    }

    fn lower(mut self, body: &Stmt) -> Result<IrModule> {
        self.declare_externs();
        self.declare_globals();

        let entry = self.builder.append_block("entry");
        self.builder.position_at_end(entry);
        self.lower_stmt(body)?;
        self.builder.build_ret(None)?;

        let IrLowerer {
            mut module,
            builder,
            ..
        } = self;
        let main = builder.finish()?;
        debug!(
            "lowered main: {} blocks, {} instructions",
            main.blocks.len(),
            main.instruction_count()
        );
        module.functions.push(main);
        module.verify()?;
        Ok(module)
    }

    fn declare_externs(&mut self) {
        for (name, param) in [(PRINT_I32, IrType::I32), (PRINT_I1, IrType::I1)] {
            self.module.externs.push(IrExtern {
                name: name.to_string(),
                params: vec![param],
                return_type: IrType::Void,
            });
        }
    }

    fn declare_globals(&mut self) {
        for slot in self.ctx.storage.slots() {
            let name = self.global_name(slot.id);

            let init = IrConst::zero(slot.width);
            self.slots.insert(slot.id, (name.clone(), init.ir_type()));
            self.module.globals.push(IrGlobal {
                name,
                var: slot.id,
                init,
            });
        }
    }

    /// The variable's own name where free, else `name.id`, then `name.id.N`
    fn global_name(&self, id: VarId) -> String {
        let taken = |name: &str| name == MAIN || self.module.has_symbol(name);

        let base = self.ctx.display_name(id);
        if !taken(&base) {
            return base;
        }

        let mut name = format!("{}.{}", base, id.index());
        let mut n = 1;
        while taken(&name) {
            name = format!("{}.{}.{}", base, id.index(), n);
            n += 1;
        }
        name
    }

    fn slot(&self, id: VarId) -> Result<(String, IrType)> {
        self.slots
            .get(&id)
            .cloned()
            .ok_or_else(|| PlumeError::UnknownVariable {
                name: self.ctx.display_name(id),
            })
    }

    /// Nonzero test for integers; booleans pass through
    fn to_i1(&mut self, value: IrValue) -> Result<IrValue> {
        match value.ty() {
            IrType::I32 => self
                .builder
                .build_icmp(IcmpPred::Ne, value, Builder::const_i32(0)),
            _ => Ok(value),
        }
    }

    /// Convert `value` to the width of a storage slot or parameter
    fn coerce(&mut self, value: IrValue, target: IrType) -> Result<IrValue> {
        match (value.ty(), target) {
            (from, to) if from == to => Ok(value),
            (IrType::I1, IrType::I32) => self.builder.build_zext(value),
            (IrType::I32, IrType::I1) => self.to_i1(value),
            (from, to) => Err(PlumeError::Lowering {
                message: format!("cannot convert {} to {}", from, to),
            }),
        }
    }

    fn lower_expr(&mut self, expr: &Expr) -> Result<IrValue> {
        match expr {
            Expr::Bool(b) => Ok(Builder::const_i1(*b)),
            Expr::Int(v) => Ok(Builder::const_i32(*v)),
            Expr::Var(id) => {
                let (name, ty) = self.slot(*id)?;
                self.builder.build_load(ty, &name)
            }
            Expr::Binary { op, left, right } => {
                let lhs = self.lower_expr(left)?;
                let rhs = self.lower_expr(right)?;
                self.lower_binary(*op, lhs, rhs)
            }
        }
    }

    fn lower_binary(&mut self, op: BinaryOp, lhs: IrValue, rhs: IrValue) -> Result<IrValue> {
        // Mixed `||`: the integer side is tested against zero
        if op == BinaryOp::Or && lhs.ty() != rhs.ty() {
            let lhs = self.to_i1(lhs)?;
            let rhs = self.to_i1(rhs)?;
            return self.builder.build_binop(IrBinOp::Or, lhs, rhs);
        }

        let b = &mut self.builder;
        match op {
            BinaryOp::Add => b.build_binop(IrBinOp::Add, lhs, rhs),
            BinaryOp::Sub => b.build_binop(IrBinOp::Sub, lhs, rhs),
            BinaryOp::Mul => b.build_binop(IrBinOp::Mul, lhs, rhs),
            BinaryOp::Div => b.build_binop(IrBinOp::SDiv, lhs, rhs),
            BinaryOp::And => b.build_binop(IrBinOp::And, lhs, rhs),
            BinaryOp::Or => b.build_binop(IrBinOp::Or, lhs, rhs),
            BinaryOp::Eq => b.build_icmp(IcmpPred::Eq, lhs, rhs),
            BinaryOp::Ne => b.build_icmp(IcmpPred::Ne, lhs, rhs),
            BinaryOp::Ge => b.build_icmp(IcmpPred::Sge, lhs, rhs),
            BinaryOp::Le => b.build_icmp(IcmpPred::Sle, lhs, rhs),
            BinaryOp::Gt => b.build_icmp(IcmpPred::Sgt, lhs, rhs),
            BinaryOp::Lt => b.build_icmp(IcmpPred::Slt, lhs, rhs),
        }
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        trace!("lowering {} statement", stmt.kind());
        match stmt {
            Stmt::Seq { first, second } => {
                self.lower_stmt(first)?;
                self.lower_stmt(second)
            }

            Stmt::Assign { target, value } => {
                let value = self.lower_expr(value)?;
                let (name, ty) = self.slot(*target)?;
                let value = self.coerce(value, ty)?;
                self.builder.build_store(value, &name)
            }

            Stmt::Print { value: expr } => {
                let (func, param) = match type_of(expr, self.ctx) {
                    Type::Boolean => (PRINT_I1, IrType::I1),
                    _ => (PRINT_I32, IrType::I32),
                };
                let value = self.lower_expr(expr)?;
                let value = self.coerce(value, param)?;
                self.builder.build_call(func, IrType::Void, vec![value])?;
                Ok(())
            }

            Stmt::Increment { value } => self.lower_step(value, IrBinOp::Add),
            Stmt::Decrement { value } => self.lower_step(value, IrBinOp::Sub),

            Stmt::While { cond, body } => {
                let cond_bb = self.builder.append_block("cond");
                let body_bb = self.builder.append_block("body");
                let cont_bb = self.builder.append_block("cont");

                self.builder.build_br(cond_bb)?;

                self.builder.position_at_end(cond_bb);
                let cond = self.lower_expr(cond)?;
                let cond = self.to_i1(cond)?;
                self.builder.build_cond_br(cond, body_bb, cont_bb)?;

                self.builder.position_at_end(body_bb);
                self.lower_stmt(body)?;
                self.builder.build_br(cond_bb)?;

                self.builder.position_at_end(cont_bb);
                Ok(())
            }

            // The else block is always created; without an else branch it
            // only jumps to the continuation.
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let body_bb = self.builder.append_block("body");
                let else_bb = self.builder.append_block("else");
                let cont_bb = self.builder.append_block("cont");

                let cond = self.lower_expr(cond)?;
                let cond = self.to_i1(cond)?;
                self.builder.build_cond_br(cond, body_bb, else_bb)?;

                self.builder.position_at_end(body_bb);
                self.lower_stmt(then_branch)?;
                self.builder.build_br(cont_bb)?;

                self.builder.position_at_end(else_bb);
                if let Some(else_branch) = else_branch {
                    self.lower_stmt(else_branch)?;
                }
                self.builder.build_br(cont_bb)?;

                self.builder.position_at_end(cont_bb);
                Ok(())
            }
        }
    }

    /// `x++` / `x--`: load, add or subtract one, store back
    fn lower_step(&mut self, target: &Expr, op: IrBinOp) -> Result<()> {
        let id = target.as_var().ok_or_else(|| PlumeError::Lowering {
            message: "increment target is not a variable".to_string(),
        })?;
        let (name, ty) = self.slot(id)?;
        let current = self.builder.build_load(ty, &name)?;
        let next = self.builder.build_binop(op, current, Builder::const_i32(1))?;
        self.builder.build_store(next, &name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Width;

    fn lower(ctx: Context, body: Stmt) -> IrModule {
        lower_program(&Program::new(ctx, body)).unwrap()
    }

    fn main_of(module: &IrModule) -> &IrFunction {
        module.find_function(MAIN).unwrap()
    }

    fn block<'f>(func: &'f IrFunction, name: &str) -> &'f BasicBlock {
        let id = func.block_named(name).unwrap();
        func.block(id).unwrap()
    }

    #[test]
    fn test_sum_program_listing() {
        let mut ctx = Context::new();
        let x = ctx.declare("x", Width::I32);
        let body = Stmt::seq(
            Stmt::assign(x, Expr::binary(Expr::int_lit(2), BinaryOp::Add, Expr::int_lit(3))),
            Stmt::print(Expr::var(x)),
        );

        let expected = "\
; ModuleID = 'plume'

@x = global i32 0

declare void @print_i32(i32)
declare void @print_i1(i1)

define void @main() {
entry:
  %0 = add i32 2, 3
  store i32 %0, ptr @x
  %1 = load i32, ptr @x
  call void @print_i32(i32 %1)
  ret void
}
";
        assert_eq!(lower(ctx, body).to_string(), expected);
    }

    #[test]
    fn test_while_blocks() {
        let mut ctx = Context::new();
        let n = ctx.declare("n", Width::I32);
        let body = Stmt::while_loop(
            Expr::binary(Expr::var(n), BinaryOp::Lt, Expr::int_lit(3)),
            Stmt::increment(Expr::var(n)),
        );
        let module = lower(ctx, body);
        let main = main_of(&module);

        let names: Vec<&str> = main.blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["entry", "cond", "body", "cont"]);

        let cond = main.block_named("cond").unwrap();
        let body_id = main.block_named("body").unwrap();
        let cont = main.block_named("cont").unwrap();

        assert_eq!(
            block(main, "entry").terminator,
            Some(Terminator::Br { target: cond })
        );
        assert!(matches!(
            block(main, "cond").terminator,
            Some(Terminator::CondBr { then_block, else_block, .. })
                if then_block == body_id && else_block == cont
        ));
        // Back edge
        assert_eq!(
            block(main, "body").terminator,
            Some(Terminator::Br { target: cond })
        );
        assert_eq!(
            block(main, "cont").terminator,
            Some(Terminator::Ret { value: None })
        );
    }

    #[test]
    fn test_if_without_else_gets_else_block() {
        let mut ctx = Context::new();
        let flag = ctx.declare("flag", Width::I1);
        let body = Stmt::if_then(Expr::var(flag), Stmt::print(Expr::int_lit(1)));
        let module = lower(ctx, body);
        let main = main_of(&module);

        let names: Vec<&str> = main.blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["entry", "body", "else", "cont"]);

        let cont = main.block_named("cont").unwrap();
        let else_block = block(main, "else");
        assert!(else_block.insts.is_empty());
        assert_eq!(else_block.terminator, Some(Terminator::Br { target: cont }));
        assert_eq!(block(main, "body").terminator, Some(Terminator::Br { target: cont }));
    }

    #[test]
    fn test_nested_blocks_are_uniquely_named() {
        let mut ctx = Context::new();
        let n = ctx.declare("n", Width::I32);
        let inner = Stmt::while_loop(Expr::bool_lit(false), Stmt::increment(Expr::var(n)));
        let body = Stmt::while_loop(Expr::bool_lit(false), inner);
        let module = lower(ctx, body);

        let names: Vec<&str> = main_of(&module).blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["entry", "cond", "body", "cont", "cond1", "body1", "cont1"]);
    }

    #[test]
    fn test_print_dispatch() {
        let mut ctx = Context::new();
        let flag = ctx.declare("flag", Width::I1);
        let body = Stmt::seq(
            Stmt::print(Expr::var(flag)),
            Stmt::print(Expr::binary(Expr::int_lit(1), BinaryOp::Sub, Expr::int_lit(2))),
        );
        let text = lower(ctx, body).to_string();
        assert!(text.contains("call void @print_i1(i1 %0)"));
        assert!(text.contains("call void @print_i32(i32 %1)"));
    }

    #[test]
    fn test_mixed_or_tests_integer_side() {
        let mut ctx = Context::new();
        let n = ctx.declare("n", Width::I32);
        let body = Stmt::print(Expr::binary(Expr::var(n), BinaryOp::Or, Expr::bool_lit(false)));
        let text = lower(ctx, body).to_string();

        assert!(text.contains("%1 = icmp ne i32 %0, 0"));
        assert!(text.contains("%2 = or i1 %1, false"));
        assert!(text.contains("call void @print_i1(i1 %2)"));
    }

    #[test]
    fn test_assign_converts_width() {
        let mut ctx = Context::new();
        let n = ctx.declare("n", Width::I32);
        let flag = ctx.declare("flag", Width::I1);
        let body = Stmt::seq(
            Stmt::assign(n, Expr::bool_lit(true)),
            Stmt::assign(flag, Expr::int_lit(7)),
        );
        let text = lower(ctx, body).to_string();

        assert!(text.contains("%0 = zext i1 true to i32"));
        assert!(text.contains("store i32 %0, ptr @n"));
        assert!(text.contains("%1 = icmp ne i32 7, 0"));
        assert!(text.contains("store i1 %1, ptr @flag"));
    }

    #[test]
    fn test_decrement() {
        let mut ctx = Context::new();
        let n = ctx.declare("n", Width::I32);
        let text = lower(ctx, Stmt::decrement(Expr::var(n))).to_string();

        assert!(text.contains("%0 = load i32, ptr @n"));
        assert!(text.contains("%1 = sub i32 %0, 1"));
        assert!(text.contains("store i32 %1, ptr @n"));
    }

    #[test]
    fn test_globals_avoid_symbol_clashes() {
        let mut ctx = Context::new();
        ctx.declare("print_i32", Width::I32);
        ctx.declare("main", Width::I1);
        let module = lower(ctx, Stmt::print(Expr::int_lit(0)));

        let names: Vec<&str> = module.globals.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["print_i32.0", "main.1"]);
    }

    #[test]
    fn test_renamed_global_skips_taken_names() {
        // `main` would be renamed to `main.1`, which the first variable owns
        let mut ctx = Context::new();
        let first = ctx.declare("main.1", Width::I32);
        let second = ctx.declare("main", Width::I32);
        let body = Stmt::sequence([
            Stmt::assign(first, Expr::int_lit(1)),
            Stmt::assign(second, Expr::int_lit(2)),
            Stmt::print(Expr::var(first)),
        ])
        .unwrap();
        let module = lower(ctx, body);

        let names: Vec<&str> = module.globals.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["main.1", "main.1.1"]);

        let mut host = crate::host::CaptureHost::new();
        crate::ir::Interpreter::new(&module, None)
            .run_main(&mut host)
            .unwrap();
        assert_eq!(host.output(), "1\n");
    }
}
