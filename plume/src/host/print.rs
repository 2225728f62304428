//! Print host functions
//!
//! Lowered programs declare `print_i32` and `print_i1` as externals and call
//! them once per `print` statement. Each call writes exactly one line.
//!
//! # Formats
//! - `print_i32`: signed decimal, e.g. `-42`
//! - `print_i1`: `true` or `false`

use std::io::Write;

/// Receiver for the two print externals
pub trait PrintHost {
    fn print_i32(&mut self, value: i32);
    fn print_i1(&mut self, value: bool);
}

/// Line text written for an integer
pub fn format_i32(value: i32) -> String {
    value.to_string()
}

/// Line text written for a boolean
pub fn format_i1(value: bool) -> String {
    let text = if value { "true" } else { "false" };
    text.to_string()
}

/// Writes to the process's standard output
#[derive(Debug, Default)]
pub struct StdoutHost;

impl StdoutHost {
    pub fn new() -> Self {
        Self
    }

    fn write_line(&mut self, line: &str) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        // A closed stdout is not a program error
        let _ = writeln!(handle, "{}", line);
    }
}

impl PrintHost for StdoutHost {
    fn print_i32(&mut self, value: i32) {
        self.write_line(&format_i32(value));
    }

    fn print_i1(&mut self, value: bool) {
        self.write_line(&format_i1(value));
    }
}

/// Records printed lines in memory
#[derive(Debug, Default, Clone)]
pub struct CaptureHost {
    lines: Vec<String>,
}

impl CaptureHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Printed lines, without terminators
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Everything printed so far, one `\n`-terminated line per call
    pub fn output(&self) -> String {
        let mut output = String::new();
        for line in &self.lines {
            output.push_str(line);
            output.push('\n');
        }
        output
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl PrintHost for CaptureHost {
    fn print_i32(&mut self, value: i32) {
        self.lines.push(format_i32(value));
    }

    fn print_i1(&mut self, value: bool) {
        self.lines.push(format_i1(value));
    }
}
