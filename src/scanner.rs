//! Source text → ordered token stream, terminated by `EOF`.
//!
//! The scanner never stops at the first lexical error; it reports and keeps
//! going so a single run can surface every illegal character or unterminated
//! string in the source at once.

use std::str::Chars;

use peekmore::{PeekMore, PeekMoreIterator};

use crate::diagnostics::{Diagnostics, ScanError};
use crate::token::{Kind, Literal, Token};

pub struct Scanner<'a> {
    source: &'a str,
    chars: PeekMoreIterator<Chars<'a>>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner {
            source,
            chars: source.chars().peekmore(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 0,
            line_start: 0,
        }
    }

    /// Scans the whole source and returns the token stream, always ending in
    /// a single `EOF` token.
    pub fn scan_tokens(mut self, diagnostics: &Diagnostics) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token(diagnostics);
        }

        self.tokens.push(Token::eof(self.line, self.current - self.line_start));
        self.tokens
    }

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn advance(&mut self) -> char {
        let c = self.chars.next().expect("advance called past end of source");
        self.current += c.len_utf8();
        c
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_next(&mut self) -> Option<char> {
        self.chars.peek_next().copied()
    }

    fn advance_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn lexeme(&self) -> &'a str {
        &self.source[self.start..self.current]
    }

    fn add_token(&mut self, kind: Kind, literal: Option<Literal>) {
        let column = self.start - self.line_start;
        self.tokens.push(Token::new(kind, self.lexeme(), literal, self.line, column));
    }

    fn scan_token(&mut self, diagnostics: &Diagnostics) {
        let c = self.advance();
        match c {
            '(' => self.add_token(Kind::LeftParen, None),
            ')' => self.add_token(Kind::RightParen, None),
            '{' => self.add_token(Kind::LeftBrace, None),
            '}' => self.add_token(Kind::RightBrace, None),
            ',' => self.add_token(Kind::Comma, None),
            '.' => self.add_token(Kind::Dot, None),
            '-' => self.add_token(Kind::Minus, None),
            '+' => self.add_token(Kind::Plus, None),
            ';' => self.add_token(Kind::Semicolon, None),
            '*' => self.add_token(Kind::Star, None),

            '!' => {
                let kind = if self.advance_if('=') { Kind::BangEqual } else { Kind::Bang };
                self.add_token(kind, None);
            }
            '=' => {
                let kind = if self.advance_if('=') { Kind::EqualEqual } else { Kind::Equal };
                self.add_token(kind, None);
            }
            '<' => {
                let kind = if self.advance_if('=') { Kind::LessEqual } else { Kind::Less };
                self.add_token(kind, None);
            }
            '>' => {
                let kind = if self.advance_if('=') { Kind::GreaterEqual } else { Kind::Greater };
                self.add_token(kind, None);
            }

            '/' => {
                if self.advance_if('/') {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                } else {
                    self.add_token(Kind::Slash, None);
                }
            }

            ' ' | '\r' | '\t' => {}

            '\n' => {
                self.line += 1;
                self.line_start = self.current;
            }

            '"' | '\'' => self.string(c, diagnostics),

            c if c.is_ascii_digit() => self.number(),

            c if c.is_alphabetic() || c == '_' => self.identifier(),

            other => {
                diagnostics.report_scan_error(&ScanError {
                    line: self.line,
                    message: format!("Unexpected character '{other}'"),
                });
            }
        }
    }

    fn string(&mut self, delimiter: char, diagnostics: &Diagnostics) {
        let start_line = self.line;
        let content_start = self.current;

        loop {
            match self.peek() {
                None => {
                    diagnostics.report_scan_error(&ScanError {
                        line: start_line,
                        message: "Unterminated string".to_string(),
                    });
                    return;
                }
                Some(c) if c == delimiter => break,
                Some('\n') => {
                    self.advance();
                    self.line += 1;
                    self.line_start = self.current;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }

        let value = self.source[content_start..self.current].to_string();
        self.advance(); // closing delimiter

        self.add_token(Kind::String, Some(Literal::String(value)));
    }

    fn number(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // consume '.'
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let value: f64 = self.lexeme().parse().expect("scanned number lexeme to parse as f64");
        self.add_token(Kind::Number, Some(Literal::Number(value)));
    }

    fn identifier(&mut self) {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let kind = match self.lexeme() {
            "and" => Kind::And,
            "class" => Kind::Class,
            "else" => Kind::Else,
            "false" => Kind::False,
            "for" => Kind::For,
            "fun" => Kind::Fun,
            "if" => Kind::If,
            "nil" => Kind::Nil,
            "or" => Kind::Or,
            "print" => Kind::Print,
            "return" => Kind::Return,
            "super" => Kind::Super,
            "this" => Kind::This,
            "true" => Kind::True,
            "var" => Kind::Var,
            "while" => Kind::While,
            _ => Kind::Identifier,
        };

        self.add_token(kind, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> (Vec<Token>, bool) {
        let diagnostics = Diagnostics::new(source);
        let tokens = Scanner::new(source).scan_tokens(&diagnostics);
        (tokens, diagnostics.had_error())
    }

    #[test]
    fn scans_single_char_tokens() {
        let (tokens, had_error) = scan("(){},.-+;/*");
        assert!(!had_error);
        let kinds: Vec<Kind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                Kind::LeftParen, Kind::RightParen, Kind::LeftBrace, Kind::RightBrace,
                Kind::Comma, Kind::Dot, Kind::Minus, Kind::Plus, Kind::Semicolon,
                Kind::Slash, Kind::Star, Kind::Eof,
            ]
        );
    }

    #[test]
    fn scans_two_char_operators_greedily() {
        let (tokens, _) = scan("!= == <= >= ! = < >");
        let kinds: Vec<Kind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                Kind::BangEqual, Kind::EqualEqual, Kind::LessEqual, Kind::GreaterEqual,
                Kind::Bang, Kind::Equal, Kind::Less, Kind::Greater, Kind::Eof,
            ]
        );
    }

    #[test]
    fn line_comments_run_to_end_of_line() {
        let (tokens, _) = scan("1; // a comment\n2;");
        let kinds: Vec<Kind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Kind::Number, Kind::Semicolon, Kind::Number, Kind::Semicolon, Kind::Eof]);
        assert_eq!(tokens[2].line, 1);
    }

    #[test]
    fn strings_allow_embedded_newlines_and_either_delimiter() {
        let (tokens, had_error) = scan("\"a\nb\" 'c'");
        assert!(!had_error);
        assert_eq!(tokens[0].literal, Some(Literal::String("a\nb".to_string())));
        assert_eq!(tokens[1].literal, Some(Literal::String("c".to_string())));
        assert_eq!(tokens[1].line, 1);
    }

    #[test]
    fn unterminated_string_reports_error() {
        let (_, had_error) = scan("\"unterminated");
        assert!(had_error);
    }

    #[test]
    fn numbers_with_and_without_fraction() {
        let (tokens, _) = scan("123 45.67");
        assert_eq!(tokens[0].literal, Some(Literal::Number(123.0)));
        assert_eq!(tokens[1].literal, Some(Literal::Number(45.67)));
    }

    #[test]
    fn trailing_dot_without_digit_is_not_consumed() {
        let (tokens, _) = scan("123.");
        let kinds: Vec<Kind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Kind::Number, Kind::Dot, Kind::Eof]);
    }

    #[test]
    fn keywords_are_recognized() {
        let (tokens, _) = scan("and class else false for fun if nil or print return super this true var while");
        let kinds: Vec<Kind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                Kind::And, Kind::Class, Kind::Else, Kind::False, Kind::For, Kind::Fun,
                Kind::If, Kind::Nil, Kind::Or, Kind::Print, Kind::Return, Kind::Super,
                Kind::This, Kind::True, Kind::Var, Kind::While, Kind::Eof,
            ]
        );
    }

    #[test]
    fn identifiers_allow_underscore_and_digits_after_first_char() {
        let (tokens, _) = scan("_foo bar123");
        let kinds: Vec<Kind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Kind::Identifier, Kind::Identifier, Kind::Eof]);
    }

    #[test]
    fn unexpected_character_reports_but_continues() {
        let (tokens, had_error) = scan("1 @ 2");
        assert!(had_error);
        let kinds: Vec<Kind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Kind::Number, Kind::Number, Kind::Eof]);
    }

    #[test]
    fn always_terminates_with_eof() {
        let (tokens, _) = scan("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, Kind::Eof);
    }
}
