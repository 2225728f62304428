//! Backend and execution options
//!
//! Plain option types shared by the library entry points and the `plumec`
//! command line.

use std::path::{Path, PathBuf};

use crate::{PlumeError, Result};

/// Output target for `compile`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    /// Re-rendered source text
    Source,
    /// Stack-machine listing
    Stack,
    /// Register-machine listing
    Register,
    /// Structured basic-block IR
    #[default]
    Ir,
}

impl Target {
    pub const ALL: [Target; 4] = [Target::Source, Target::Stack, Target::Register, Target::Ir];

    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "source" | "src" | "print" => Ok(Target::Source),
            "stack" | "sm" => Ok(Target::Stack),
            "reg" | "register" | "rm" => Ok(Target::Register),
            "ir" | "llvm" | "ll" | "blocks" => Ok(Target::Ir),
            _ => Err(PlumeError::InvalidOption {
                option: "target".to_string(),
                value: s.to_string(),
                expected: "source, stack, reg, or ir".to_string(),
            }),
        }
    }

    /// Get the default file extension for this target
    pub fn default_extension(&self) -> &'static str {
        match self {
            Target::Source => "plm",
            Target::Stack => "stk",
            Target::Register => "reg",
            Target::Ir => "ll",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Target::Source => "source listing",
            Target::Stack => "stack-machine code",
            Target::Register => "register-machine code",
            Target::Ir => "structured basic-block IR",
        }
    }
}

impl std::str::FromStr for Target {
    type Err = PlumeError;

    fn from_str(s: &str) -> Result<Self> {
        Target::from_str(s)
    }
}

/// Options for `compile`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    pub target: Target,
    /// Append `# name` comments to memory loads in machine listings
    pub annotate: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            target: Target::default(),
            annotate: true,
        }
    }
}

impl EmitOptions {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }
}

/// Options for `run`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Instruction budget for the interpreter; 0 means unlimited
    pub max_steps: usize,
}

impl RunOptions {
    pub const DEFAULT_MAX_STEPS: usize = 1_000_000;

    /// Budget as an optional limit
    pub fn step_limit(&self) -> Option<usize> {
        (self.max_steps > 0).then_some(self.max_steps)
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_steps: Self::DEFAULT_MAX_STEPS,
        }
    }
}

/// Output path for `input` emitted as `target`, unless `output` is given
pub fn output_path(input: &Path, output: Option<&Path>, target: Target) -> PathBuf {
    match output {
        Some(out) => out.to_path_buf(),
        None => input.with_extension(target.default_extension()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parsing() {
        assert_eq!(Target::from_str("stack").unwrap(), Target::Stack);
        assert_eq!(Target::from_str("STACK").unwrap(), Target::Stack);
        assert_eq!(Target::from_str("register").unwrap(), Target::Register);
        assert_eq!(Target::from_str("reg").unwrap(), Target::Register);
        assert_eq!(Target::from_str("llvm").unwrap(), Target::Ir);
        assert_eq!(Target::from_str("print").unwrap(), Target::Source);
        assert!(Target::from_str("wasm").is_err());
    }

    #[test]
    fn test_invalid_target_message() {
        let err = Target::from_str("x86").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value 'x86' for option 'target': expected source, stack, reg, or ir"
        );
    }

    #[test]
    fn test_output_path() {
        let input = Path::new("demo/sum.json");
        assert_eq!(output_path(input, None, Target::Ir), PathBuf::from("demo/sum.ll"));
        assert_eq!(output_path(input, None, Target::Stack), PathBuf::from("demo/sum.stk"));

        let custom = Path::new("out.txt");
        assert_eq!(output_path(input, Some(custom), Target::Ir), PathBuf::from("out.txt"));
    }

    #[test]
    fn test_defaults() {
        let emit = EmitOptions::default();
        assert!(emit.annotate);
        assert_eq!(EmitOptions::new(Target::Stack).target, Target::Stack);

        assert_eq!(RunOptions::default().step_limit(), Some(1_000_000));
        assert_eq!(RunOptions { max_steps: 0 }.step_limit(), None);
    }
}
