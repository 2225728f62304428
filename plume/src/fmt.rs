//! Plume Source Printer
//!
//! Renders expression and statement trees back to indented, source-like
//! text. Meant for debugging and diagnostics; the output is not a stable
//! serialization format.

use crate::ast::*;
use crate::program::Program;
use crate::symbols::Context;

/// Format a whole program
pub fn format_program(program: &Program) -> String {
    format_stmt(&program.body, &program.context, 0)
}

/// Format an expression; binary operations are fully parenthesised
pub fn format_expr(expr: &Expr, ctx: &Context) -> String {
    let mut output = String::new();
    write_expr(&mut output, expr, ctx);
    output
}

fn write_expr(output: &mut String, expr: &Expr, ctx: &Context) {
    match expr {
        Expr::Bool(value) => output.push_str(if *value { "true" } else { "false" }),
        Expr::Int(value) => output.push_str(&value.to_string()),
        Expr::Var(id) => output.push_str(&ctx.display_name(*id)),
        Expr::Binary { op, left, right } => {
            output.push('(');
            write_expr(output, left, ctx);
            output.push(' ');
            output.push_str(op.symbol());
            output.push(' ');
            write_expr(output, right, ctx);
            output.push(')');
        }
    }
}

/// Format a statement at the given nesting level (2 spaces per level)
pub fn format_stmt(stmt: &Stmt, ctx: &Context, indent: usize) -> String {
    let mut output = String::new();
    write_stmt(&mut output, stmt, ctx, indent);
    output
}

fn push_indent(output: &mut String, indent: usize) {
    for _ in 0..indent {
        output.push_str("  ");
    }
}

fn write_stmt(output: &mut String, stmt: &Stmt, ctx: &Context, indent: usize) {
    match stmt {
        Stmt::Seq { first, second } => {
            write_stmt(output, first, ctx, indent);
            write_stmt(output, second, ctx, indent);
        }

        Stmt::Assign { target, value } => {
            push_indent(output, indent);
            output.push_str(&ctx.display_name(*target));
            output.push_str(" = ");
            write_expr(output, value, ctx);
            output.push_str(";\n");
        }

        Stmt::Print { value } => {
            push_indent(output, indent);
            output.push_str("print ");
            write_expr(output, value, ctx);
            output.push_str(";\n");
        }

        Stmt::While { cond, body } => {
            push_indent(output, indent);
            output.push_str("while (");
            write_expr(output, cond, ctx);
            output.push_str(") {\n");
            write_stmt(output, body, ctx, indent + 1);
            push_indent(output, indent);
            output.push_str("}\n");
        }

        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => {
            push_indent(output, indent);
            output.push_str("if (");
            write_expr(output, cond, ctx);
            output.push_str(") {\n");
            write_stmt(output, then_branch, ctx, indent + 1);
            if let Some(else_branch) = else_branch {
                push_indent(output, indent);
                output.push_str("} else {\n");
                write_stmt(output, else_branch, ctx, indent + 1);
            }
            push_indent(output, indent);
            output.push_str("}\n");
        }

        Stmt::Increment { value } => {
            push_indent(output, indent);
            write_expr(output, value, ctx);
            output.push_str("++;\n");
        }

        Stmt::Decrement { value } => {
            push_indent(output, indent);
            write_expr(output, value, ctx);
            output.push_str("--;\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Width;

    #[test]
    fn test_format_expr_spellings() {
        let mut ctx = Context::new();
        let x = ctx.declare("x", Width::I32);

        let expr = Expr::binary(
            Expr::binary(Expr::var(x), BinaryOp::Ge, Expr::int_lit(-2)),
            BinaryOp::And,
            Expr::binary(Expr::bool_lit(true), BinaryOp::Ne, Expr::bool_lit(false)),
        );
        assert_eq!(format_expr(&expr, &ctx), "((x >= -2) && (true != false))");

        let expr = Expr::binary(Expr::var(x), BinaryOp::Or, Expr::bool_lit(false));
        assert_eq!(format_expr(&expr, &ctx), "(x || false)");
    }

    #[test]
    fn test_format_if_else_and_while() {
        let mut ctx = Context::new();
        let x = ctx.declare("x", Width::I32);

        let program = Stmt::sequence(vec![
            Stmt::assign(x, Expr::int_lit(0)),
            Stmt::while_loop(
                Expr::binary(Expr::var(x), BinaryOp::Lt, Expr::int_lit(10)),
                Stmt::if_else(
                    Expr::binary(Expr::var(x), BinaryOp::Eq, Expr::int_lit(5)),
                    Stmt::print(Expr::var(x)),
                    Stmt::increment(Expr::var(x)),
                ),
            ),
        ])
        .unwrap();

        let expected = "\
x = 0;
while ((x < 10)) {
  if ((x == 5)) {
    print x;
  } else {
    x++;
  }
}
";
        assert_eq!(format_stmt(&program, &ctx, 0), expected);
    }

    #[test]
    fn test_if_without_else_omits_clause() {
        let mut ctx = Context::new();
        let flag = ctx.declare("flag", Width::I1);

        let stmt = Stmt::if_then(Expr::var(flag), Stmt::print(Expr::int_lit(1)));
        assert_eq!(format_stmt(&stmt, &ctx, 1), "  if (flag) {\n    print 1;\n  }\n");
    }

    #[test]
    fn test_unnamed_variable_fallback() {
        let ctx = Context::new();
        let stmt = Stmt::decrement(Expr::var(VarId(3)));
        assert_eq!(format_stmt(&stmt, &ctx, 0), "v3--;\n");
    }
}
