//! Host interface for running programs
//!
//! The structured backend calls out to two external print routines. This
//! module provides the reference implementations a host links them to.

pub mod print;

pub use print::*;
