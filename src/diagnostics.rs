//! Error kinds produced by the pipeline and the sink that aggregates the
//! "did this run error?" flags the runner checks between phases.
//!
//! Unlike a global mutable flag, a [`Diagnostics`] is owned explicitly by
//! whoever drives a run and passed by reference into the scanner, parser,
//! resolver, and interpreter.

use std::cell::Cell;

use substring::Substring;

use crate::token::{Kind, Token};

/// Aggregates the error state of a single run and renders diagnostics to a
/// writer (ordinarily stderr).
pub struct Diagnostics {
    source: String,
    had_error: Cell<bool>,
    had_runtime_error: Cell<bool>,
}

impl Diagnostics {
    pub fn new(source: impl Into<String>) -> Self {
        Diagnostics {
            source: source.into(),
            had_error: Cell::new(false),
            had_runtime_error: Cell::new(false),
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error.get()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error.get()
    }

    pub fn had_any(&self) -> bool {
        self.had_error() || self.had_runtime_error()
    }

    pub fn reset(&self) {
        self.had_error.set(false);
        self.had_runtime_error.set(false);
    }

    fn excerpt(&self, line: usize) -> Option<&str> {
        self.source.lines().nth(line).map(|l| l.substring(0, l.len()).trim_end())
    }

    fn emit(&self, header: String, line: usize) {
        eprintln!("{header}");
        if let Some(excerpt) = self.excerpt(line) {
            if !excerpt.trim().is_empty() {
                eprintln!("    {excerpt}");
            }
        }
    }

    pub fn report_scan_error(&self, error: &ScanError) {
        self.emit(format!("[line {}] Error: {}", error.line + 1, error.message), error.line);
        self.had_error.set(true);
    }

    pub fn report_parse_error(&self, error: &ParseError) {
        self.emit(describe_token(&error.token, &error.message), error.token.line);
        self.had_error.set(true);
    }

    pub fn report_resolve_error(&self, error: &ResolveError) {
        self.emit(describe_token(&error.token, &error.message), error.token.line);
        self.had_error.set(true);
    }

    pub fn report_runtime_error(&self, error: &RuntimeError) {
        self.emit(describe_token(&error.token, &error.message), error.token.line);
        self.had_runtime_error.set(true);
    }
}

fn describe_token(token: &Token, message: &str) -> String {
    if token.kind == Kind::Eof {
        format!("[line {}] Error at end: {message}", token.line + 1)
    } else {
        format!("[line {}] Error at '{}': {message}", token.line + 1, token.lexeme)
    }
}

/// An error produced while scanning raw source text into tokens.
#[derive(Debug, Clone)]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

/// An error produced while parsing a token stream into statements.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

/// An error produced while statically resolving variable references.
#[derive(Debug, Clone)]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

/// An error raised by the interpreter while evaluating a program.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: Token, message: impl Into<String>) -> Self {
        RuntimeError { token, message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_sink_has_no_errors() {
        let diagnostics = Diagnostics::new("var a = 1;");
        assert!(!diagnostics.had_any());
    }

    #[test]
    fn reporting_a_scan_error_sets_had_error_only() {
        let diagnostics = Diagnostics::new("@");
        diagnostics.report_scan_error(&ScanError { line: 0, message: "Unexpected character '@'".into() });
        assert!(diagnostics.had_error());
        assert!(!diagnostics.had_runtime_error());
    }

    #[test]
    fn reporting_a_runtime_error_sets_had_runtime_error_only() {
        let diagnostics = Diagnostics::new("1 + \"a\";");
        let token = Token::new(Kind::Plus, "+", None, 0, 2);
        diagnostics.report_runtime_error(&RuntimeError::new(token, "Operands must be two numbers or two strings"));
        assert!(diagnostics.had_runtime_error());
        assert!(!diagnostics.had_error());
    }

    #[test]
    fn reset_clears_both_flags() {
        let diagnostics = Diagnostics::new("");
        diagnostics.report_scan_error(&ScanError { line: 0, message: "x".into() });
        diagnostics.reset();
        assert!(!diagnostics.had_any());
    }
}
