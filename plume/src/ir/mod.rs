//! Structured IR backend
//!
//! An LLVM-flavoured, in-memory representation: globals for variable
//! storage, external print functions, and a `main` function made of named
//! basic blocks with explicit branches.
//!
//! ## Pipeline
//!
//! ```text
//! Program → lower_program → IrModule → { Display listing | Interpreter }
//! ```
//!
//! Control flow patterns:
//!
//! - `while`: `cond` / `body` / `cont`, with a back edge from `body` to `cond`
//! - `if`: `body` / `else` / `cont`; the `else` block exists even when the
//!   statement has no else branch

pub mod builder;
pub mod interp;
pub mod lower;
pub mod types;

pub use builder::Builder;
pub use interp::Interpreter;
pub use lower::lower_program;
pub use types::*;
