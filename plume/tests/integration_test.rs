//! Integration tests for the Plume compiler
//!
//! Tests the full pipeline: JSON → Program → Check → Backend → Execute

use plume::ast::{BinaryOp, Expr, Stmt};
use plume::host::CaptureHost;
use plume::ir::{lower_program, Interpreter, Terminator};
use plume::reg::{emit_reg, RegAllocator, RegisterMachine};
use plume::stack::{emit_stack, StackMachine};
use plume::symbols::{Context, Width};
use plume::value::{Memory, Value};
use plume::{check, compile, run, EmitOptions, PlumeError, Program, RunOptions, RuntimeError, Target};

const SUM: &str = include_str!("../../demos/sum.json");
const COUNTDOWN: &str = include_str!("../../demos/countdown.json");

fn run_capture(program: &Program) -> Result<String, PlumeError> {
    let mut host = CaptureHost::new();
    run(program, &RunOptions::default(), &mut host)?;
    Ok(host.output())
}

#[test]
fn test_sum_program_end_to_end() {
    let program = Program::from_json(SUM).expect("demo parses");
    check(&program).expect("demo is valid");

    assert_eq!(run_capture(&program).unwrap(), "5\n");

    let source = compile(&program, &EmitOptions::new(Target::Source)).unwrap();
    assert_eq!(source, "x = (2 + 3);\nprint x;\n");

    let stack = compile(&program, &EmitOptions::new(Target::Stack)).unwrap();
    assert_eq!(stack, "# (2 + 3)\nload_imm 2\nload_imm 3\nadd\n\n# x\nload_mem 0 # x\n");

    let reg = compile(
        &program,
        &EmitOptions {
            target: Target::Register,
            annotate: false,
        },
    )
    .unwrap();
    assert_eq!(reg, "# (2 + 3)\nr1 = 2\nr2 = 3\nr0 = add r1, r2\n\n# x\nr3 = load 0\n");
}

#[test]
fn test_countdown_prints_even_numbers() {
    let program = Program::from_json(COUNTDOWN).expect("demo parses");
    assert_eq!(run_capture(&program).unwrap(), "4\n2\n");
}

#[test]
fn test_mixed_addition_rejected_everywhere() {
    let json = r#"{
        "variables": [ { "name": "x", "type": "int" } ],
        "body": { "Assign": { "target": 0, "value":
            { "Binary": { "op": "+", "left": { "Int": 1 }, "right": { "Bool": true } } } } }
    }"#;
    let program = Program::from_json(json).unwrap();

    assert!(matches!(check(&program), Err(PlumeError::InvalidProgram { .. })));
    for target in Target::ALL {
        assert!(compile(&program, &EmitOptions::new(target)).is_err());
    }
    assert!(run_capture(&program).is_err());
}

#[test]
fn test_while_has_three_blocks_and_back_edge() {
    let mut ctx = Context::new();
    let n = ctx.declare("n", Width::I32);
    let body = Stmt::while_loop(
        Expr::binary(Expr::var(n), BinaryOp::Lt, Expr::int_lit(10)),
        Stmt::increment(Expr::var(n)),
    );
    let program = Program::new(ctx, body);
    check(&program).unwrap();

    let module = lower_program(&program).unwrap();
    let main = module.find_function("main").unwrap();
    assert_eq!(main.blocks.len(), 4);

    let cond = main.block_named("cond").unwrap();
    let body_id = main.block_named("body").unwrap();
    let body_block = main.block(body_id).unwrap();
    assert_eq!(body_block.terminator, Some(Terminator::Br { target: cond }));

    let text = module.to_string();
    assert!(text.contains("br i1 %1, label %body, label %cont"));
    assert_eq!(text.matches("br label %cond").count(), 2);
}

#[test]
fn test_if_without_else_branches_to_cont() {
    let mut ctx = Context::new();
    let x = ctx.declare("x", Width::I32);
    let body = Stmt::if_then(
        Expr::binary(Expr::var(x), BinaryOp::Eq, Expr::int_lit(0)),
        Stmt::print(Expr::bool_lit(true)),
    );
    let program = Program::new(ctx, body);

    let text = compile(&program, &EmitOptions::new(Target::Ir)).unwrap();
    assert!(text.contains("else:\n  br label %cont\n"));
    assert_eq!(run_capture(&program).unwrap(), "true\n");
}

#[test]
fn test_while_condition_must_be_boolean() {
    let mut ctx = Context::new();
    let n = ctx.declare("n", Width::I32);
    let body = Stmt::while_loop(Expr::var(n), Stmt::decrement(Expr::var(n)));
    assert!(check(&Program::new(ctx, body)).is_err());
}

#[test]
fn test_increment_requires_integer_variable() {
    let mut ctx = Context::new();
    let flag = ctx.declare("flag", Width::I1);
    let program = Program::new(ctx, Stmt::increment(Expr::var(flag)));
    assert!(check(&program).is_err());

    let program = Program::new(Context::new(), Stmt::increment(Expr::int_lit(3)));
    assert!(check(&program).is_err());
}

#[test]
fn test_backends_agree_on_expressions() {
    let mut ctx = Context::new();
    let a = ctx.declare("a", Width::I32);
    let b = ctx.declare("b", Width::I1);

    let exprs = vec![
        Expr::binary(Expr::var(a), BinaryOp::Mul, Expr::int_lit(-3)),
        Expr::binary(
            Expr::binary(Expr::var(a), BinaryOp::Div, Expr::int_lit(2)),
            BinaryOp::Ge,
            Expr::int_lit(3),
        ),
        Expr::binary(Expr::var(a), BinaryOp::Or, Expr::var(b)),
        Expr::binary(Expr::var(a), BinaryOp::And, Expr::int_lit(12)),
        Expr::binary(Expr::var(b), BinaryOp::Ne, Expr::bool_lit(true)),
    ];

    for expr in exprs {
        // a = 7; b = false; print <expr>
        let body = Stmt::sequence([
            Stmt::assign(a, Expr::int_lit(7)),
            Stmt::assign(b, Expr::bool_lit(false)),
            Stmt::print(expr.clone()),
        ])
        .unwrap();
        let program = Program::new(ctx.clone(), body);
        check(&program).unwrap();
        let printed = run_capture(&program).unwrap();

        let mut memory = Memory::from_context(&ctx);
        memory.set(a, Value::Int(7));
        memory.set(b, Value::Bool(false));

        let stack_value = StackMachine::new(&memory).eval(&emit_stack(&expr)).unwrap();

        let mut alloc = RegAllocator::new();
        let mut code = Vec::new();
        let result = emit_reg(&expr, &mut alloc, &mut code);
        let reg_value = RegisterMachine::new(&memory).eval(&code, result).unwrap();

        assert_eq!(stack_value, reg_value, "stack/register disagree on {:?}", expr);
        assert_eq!(printed, format!("{}\n", stack_value), "IR disagrees on {:?}", expr);
    }
}

#[test]
fn test_runtime_division_by_zero() {
    let mut ctx = Context::new();
    let z = ctx.declare("z", Width::I32);
    let program = Program::new(
        ctx,
        Stmt::print(Expr::binary(Expr::int_lit(1), BinaryOp::Div, Expr::var(z))),
    );
    let err = run_capture(&program).unwrap_err();
    assert!(matches!(err, PlumeError::Runtime(RuntimeError::DivisionByZero)));
}

#[test]
fn test_step_budget() {
    let mut ctx = Context::new();
    let n = ctx.declare("n", Width::I32);
    let program = Program::new(
        ctx,
        Stmt::while_loop(Expr::bool_lit(true), Stmt::increment(Expr::var(n))),
    );

    let mut host = CaptureHost::new();
    let err = run(&program, &RunOptions { max_steps: 500 }, &mut host).unwrap_err();
    assert!(matches!(err, PlumeError::Runtime(RuntimeError::StepLimitExceeded(500))));

    // 0 lifts the budget
    let program = Program::new(Context::new(), Stmt::print(Expr::int_lit(1)));
    let mut host = CaptureHost::new();
    run(&program, &RunOptions { max_steps: 0 }, &mut host).unwrap();
    assert_eq!(host.output(), "1\n");
}

#[test]
fn test_renamed_globals_keep_their_values() {
    // `main` is renamed past the variable already called `main.1`
    let mut ctx = Context::new();
    let a = ctx.declare("main.1", Width::I32);
    let b = ctx.declare("main", Width::I32);
    let body = Stmt::sequence([
        Stmt::assign(a, Expr::int_lit(1)),
        Stmt::assign(b, Expr::int_lit(2)),
        Stmt::print(Expr::var(a)),
    ])
    .unwrap();
    let program = Program::new(ctx, body);

    assert_eq!(run_capture(&program).unwrap(), "1\n");
    let module = lower_program(&program).unwrap();
    assert!(module.verify().is_ok());
    assert_eq!(module.globals.len(), 2);
}

#[test]
fn test_interpreter_on_lowered_demo() {
    let program = Program::from_json(COUNTDOWN).unwrap();
    let module = lower_program(&program).unwrap();

    let mut host = CaptureHost::new();
    let mut interp = Interpreter::new(&module, None);
    interp.run_main(&mut host).unwrap();

    assert_eq!(interp.global("n"), Some(Value::Int(0)));
    assert_eq!(host.lines(), ["4", "2"]);
}

#[test]
fn test_interchange_errors() {
    let duplicate = r#"{
        "variables": [ { "name": "x", "type": "int" }, { "name": "x", "type": "bool" } ],
        "body": { "Print": { "value": { "Int": 1 } } }
    }"#;
    assert!(matches!(Program::from_json(duplicate), Err(PlumeError::Interchange { .. })));

    let undeclared = r#"{ "body": { "Print": { "value": { "Var": 3 } } } }"#;
    assert!(matches!(Program::from_json(undeclared), Err(PlumeError::UnknownVariable { .. })));

    assert!(matches!(Program::from_json("{"), Err(PlumeError::Interchange { .. })));
}

#[test]
fn test_json_round_trip_preserves_listing() {
    let program = Program::from_json(COUNTDOWN).unwrap();
    let again = Program::from_json(&program.to_json_pretty().unwrap()).unwrap();

    let options = EmitOptions::new(Target::Ir);
    assert_eq!(compile(&program, &options).unwrap(), compile(&again, &options).unwrap());
}
