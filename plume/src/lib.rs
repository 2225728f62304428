//! # Plume
//!
//! Type checker and multi-target code generator for a small imperative
//! language: 32-bit integers, booleans, assignment, `if`/`else`, `while`
//! and `print`.
//!
//! ## Pipeline
//!
//! ```text
//! Program (AST) → check → { source printer | stack | register | structured IR }
//! ```
//!
//! | Target   | Module   | Output                                   |
//! |----------|----------|------------------------------------------|
//! | source   | `fmt`    | Indented, re-rendered source text        |
//! | stack    | `stack`  | Post-order stack-machine listing         |
//! | reg      | `reg`    | Three-address code over virtual registers |
//! | ir       | `ir`     | Basic blocks with explicit branches      |
//!
//! Every backend assumes its input already passed [`check`]; feeding an
//! unchecked tree to a backend is outside its contract.

pub mod ast;
pub mod fmt;
pub mod host;
pub mod ir;
pub mod options;
pub mod program;
pub mod reg;
pub mod stack;
pub mod symbols;
pub mod types;
pub mod value;

use log::debug;
use thiserror::Error;

pub use options::{EmitOptions, RunOptions, Target};
pub use program::Program;

/// Plume compilation error types
#[derive(Error, Debug)]
pub enum PlumeError {
    #[error("Invalid program: {message}")]
    InvalidProgram { message: String },

    #[error("Unknown variable: {name}")]
    UnknownVariable { name: String },

    #[error("Interchange error: {message}")]
    Interchange { message: String },

    #[error("Lowering error: {message}")]
    Lowering { message: String },

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("invalid value '{value}' for option '{option}': expected {expected}")]
    InvalidOption {
        option: String,
        value: String,
        expected: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for PlumeError {
    fn from(e: serde_json::Error) -> Self {
        PlumeError::Interchange {
            message: e.to_string(),
        }
    }
}

/// Errors raised while executing generated code on one of the reference machines
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {op}")]
    Overflow { op: String },

    #[error("operand type mismatch for '{op}'")]
    TypeMismatch { op: String },

    #[error("stack underflow at instruction {index}")]
    StackUnderflow { index: usize },

    #[error("register {0} read before it was written")]
    UnboundRegister(reg::VReg),

    #[error("call to unknown function '{0}'")]
    UnknownFunction(String),

    #[error("step limit of {0} instructions exceeded")]
    StepLimitExceeded(usize),

    #[error("unknown variable #{0}")]
    UnknownVariable(ast::VarId),

    #[error("malformed code: {message}")]
    Malformed { message: String },
}

/// Result type for Plume operations
pub type Result<T> = std::result::Result<T, PlumeError>;

/// Gate a program before any backend runs.
///
/// Returns [`PlumeError::InvalidProgram`] when the validator rejects the
/// program. No location or detail is available: type errors are data, and
/// the validator only answers yes or no.
pub fn check(program: &Program) -> Result<()> {
    let valid = types::is_valid(&program.body, &program.context);
    debug!("validation verdict: {}", if valid { "accepted" } else { "rejected" });
    if valid {
        Ok(())
    } else {
        Err(PlumeError::InvalidProgram {
            message: "program failed type validation".to_string(),
        })
    }
}

/// Check a program and render it with the selected backend
///
/// # Arguments
///
/// * `program` - The compilation unit (context and root statement)
/// * `options` - Backend selection and listing options
///
/// # Returns
///
/// The textual output of the chosen backend
pub fn compile(program: &Program, options: &EmitOptions) -> Result<String> {
    check(program)?;
    debug!("emitting target: {}", options.target.description());

    let output = match options.target {
        Target::Source => fmt::format_program(program),
        Target::Stack => stack::listing(program, options.annotate),
        Target::Register => reg::listing(program, options.annotate),
        Target::Ir => ir::lower_program(program)?.to_string(),
    };

    Ok(output)
}

/// Check a program, lower it to structured IR and execute it.
///
/// Output of `print` statements goes to `host`.
pub fn run(program: &Program, options: &RunOptions, host: &mut dyn host::PrintHost) -> Result<()> {
    check(program)?;
    let module = ir::lower_program(program)?;
    let mut interpreter = ir::Interpreter::new(&module, options.step_limit());
    interpreter.run_main(host)?;
    debug!("executed {} instructions", interpreter.steps());
    Ok(())
}
