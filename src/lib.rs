//! A tree-walking interpreter for the Lox scripting language: scan source
//! text into tokens, parse those into a statement tree, resolve variable
//! references statically, then walk the tree to execute it.
//!
//! [`Lox`] is the driver both the REPL and the file runner share. It owns
//! nothing but an output sink, so a caller (a test, the CLI) controls where
//! `print` output goes.

pub mod callable;
pub mod class;
pub mod diagnostics;
pub mod environment;
pub mod expr;
pub mod interpreter;
pub mod natives;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use std::io::{self, Write};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use diagnostics::Diagnostics;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// Exit code for a usage error (wrong number of CLI arguments).
pub const EXIT_USAGE: i32 = 64;
/// Exit code for a scan/parse/resolve error.
pub const EXIT_DATAERR: i32 = 65;
/// Exit code for an error raised while running an otherwise valid program.
pub const EXIT_SOFTWARE: i32 = 70;

pub struct Lox<'out> {
    output: &'out mut dyn Write,
}

impl<'out> Lox<'out> {
    pub fn new(output: &'out mut dyn Write) -> Self {
        Lox { output }
    }

    pub fn run_file(&mut self, path: &std::path::Path) -> io::Result<i32> {
        let source = std::fs::read_to_string(path)?;
        let (had_error, had_runtime_error) = self.run(&source);

        Ok(if had_error {
            EXIT_DATAERR
        } else if had_runtime_error {
            EXIT_SOFTWARE
        } else {
            0
        })
    }

    pub fn run_prompt(&mut self) -> io::Result<()> {
        let mut editor = DefaultEditor::new().map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        let history_path = home::home_dir().map(|home| home.join(".loxide_history"));
        if let Some(path) = &history_path {
            let _ = editor.load_history(path);
        }

        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                        self.run(&line);
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(_) => break,
            }
        }

        if let Some(path) = &history_path {
            let _ = editor.save_history(path);
        }

        Ok(())
    }

    /// Runs one chunk of source through the full pipeline and reports
    /// whether it produced a compile-time error, a runtime error, or
    /// neither. Each call gets a fresh [`Diagnostics`], so a REPL line's
    /// errors never bleed into the next line.
    pub fn run(&mut self, source: &str) -> (bool, bool) {
        let diagnostics = Diagnostics::new(source);

        let tokens = Scanner::new(source).scan_tokens(&diagnostics);
        let statements = Parser::new(tokens, &diagnostics).parse();

        if diagnostics.had_error() {
            return (true, false);
        }

        let mut interpreter = Interpreter::new(self.output);
        Resolver::new(&mut interpreter, &diagnostics).resolve(&statements);

        if diagnostics.had_error() {
            return (true, false);
        }

        interpreter.interpret(&statements, &diagnostics);
        (diagnostics.had_error(), diagnostics.had_runtime_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_clean_run_reports_no_errors() {
        let mut output = Vec::new();
        let mut lox = Lox::new(&mut output);
        let (had_error, had_runtime_error) = lox.run("print 1 + 1;");
        assert!(!had_error);
        assert!(!had_runtime_error);
        assert_eq!(output, b"2\n");
    }

    #[test]
    fn a_syntax_error_is_reported_without_running_anything() {
        let mut output = Vec::new();
        let mut lox = Lox::new(&mut output);
        let (had_error, had_runtime_error) = lox.run("print 1 +;");
        assert!(had_error);
        assert!(!had_runtime_error);
        assert!(output.is_empty());
    }

    #[test]
    fn a_runtime_error_is_reported() {
        let mut output = Vec::new();
        let mut lox = Lox::new(&mut output);
        let (had_error, had_runtime_error) = lox.run("print 1 + \"a\";");
        assert!(!had_error);
        assert!(had_runtime_error);
    }

    #[test]
    fn errors_do_not_persist_across_separate_runs() {
        let mut output = Vec::new();
        let mut lox = Lox::new(&mut output);
        lox.run("print 1 +;");
        let (had_error, _) = lox.run("print 1;");
        assert!(!had_error);
    }
}
