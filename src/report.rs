//! The line-oriented validation log.
//!
//! Every line written here is part of the tool's output contract, so the text is kept in one
//! place. Progress goes to the info stream, anything describing a failure to the error stream.

use std::path::PathBuf;

use crate::{
    shader::{Diagnostic, Severity},
    validator::ValidationResult,
};

/// Destination for report lines.
pub trait LogSink {
    fn info(&mut self, line: &str);
    fn error(&mut self, line: &str);
}

/// Writes info lines to stdout and error lines to stderr.
pub struct Console;

impl LogSink for Console {
    fn info(&mut self, line: &str) {
        println!("{line}");
    }

    fn error(&mut self, line: &str) {
        eprintln!("{line}");
    }
}

pub struct Report<'a, S: LogSink + ?Sized> {
    sink: &'a mut S,
}

impl<'a, S: LogSink + ?Sized> Report<'a, S> {
    pub fn new(sink: &'a mut S) -> Self {
        Report { sink }
    }

    pub fn started(&mut self) {
        self.sink.info("=== Shader Validation Started ===");
    }

    pub fn nothing_found(&mut self, roots: &[PathBuf]) {
        let roots = roots
            .iter()
            .map(|root| root.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.sink.error(&format!(
            "No shaders found in {roots}. Check that shader files are present."
        ));
    }

    pub fn found(&mut self, count: usize) {
        self.sink
            .info(&format!("Found {count} shader(s) to validate."));
    }

    pub fn unloadable(&mut self, path: &str) {
        self.sink
            .error(&format!("FAIL: Could not load shader at {path}"));
    }

    pub fn diagnostic(&mut self, path: &str, diagnostic: &Diagnostic) {
        let label = match diagnostic.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING (treated as error)",
        };
        self.sink.error(&format!(
            "  {label} in {path}: {} (platform: {})",
            single_line(&diagnostic.message),
            diagnostic.platform
        ));
    }

    pub fn passed(&mut self, path: &str) {
        self.sink.info(&format!("PASS: {path}"));
    }

    pub fn failed(&mut self, path: &str) {
        self.sink.error(&format!("FAIL: {path}"));
    }

    pub fn summary(&mut self, result: &ValidationResult) {
        self.sink.info("=== Shader Validation Summary ===");
        self.sink.info(&format!("  Passed: {}", result.passed()));
        self.sink.info(&format!("  Failed: {}", result.failed()));
        self.sink.info(&format!("  Total:  {}", result.total()));

        if result.is_success() {
            self.sink.info("=== All Shaders Passed ===");
            return;
        }

        self.sink.error("Failed shaders:");
        for name in result.failed_units() {
            self.sink.error(&format!("  - {name}"));
        }
        self.sink.error("=== Shader Validation FAILED ===");
    }
}

/// Folds a multi-line compiler message onto one line.
fn single_line(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Info,
    Error,
}

/// Records every line for inspection in tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct Transcript {
    pub lines: Vec<(Stream, String)>,
}

#[cfg(test)]
impl Transcript {
    pub fn text(&self) -> Vec<&str> {
        self.lines.iter().map(|(_, line)| line.as_str()).collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|(stream, _)| *stream == Stream::Error)
            .map(|(_, line)| line.as_str())
            .collect()
    }
}

#[cfg(test)]
impl LogSink for Transcript {
    fn info(&mut self, line: &str) {
        self.lines.push((Stream::Info, line.to_owned()));
    }

    fn error(&mut self, line: &str) {
        self.lines.push((Stream::Error, line.to_owned()));
    }
}
