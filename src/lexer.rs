// File: src/lexer.rs
//
// Lexical analyzer (tokenizer) for the Khwarizmi language.
// Converts source text into a stream of tokens for parsing.
//
// Supports:
// - Keywords: begin, end, if, elif, else, while, print, show, solve, input, int, bool, eq
// - Boolean literals true/false and maximal-munch integer literals
// - Operators: + - * / = == != < > <= >= && || ! (and the words and/or/not, and ≠ ≤ ≥)
// - Punctuation: ( ) ,
// - Newlines, which terminate statements and are emitted as tokens
// - Comments starting with // until end of line
//
// Unrecognized input becomes an error token; lexing always continues.

use crate::errors::SourceLocation;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Begin,
    End,
    If,
    Elif,
    Else,
    While,
    Print,
    Show,
    Solve,
    Input,
    Int,
    Bool,
    Eq,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Keyword> {
        let kw = match word {
            "begin" | "BEGIN" => Keyword::Begin,
            "end" | "END" => Keyword::End,
            "if" => Keyword::If,
            "elif" => Keyword::Elif,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "print" => Keyword::Print,
            "show" => Keyword::Show,
            "solve" => Keyword::Solve,
            "input" => Keyword::Input,
            "int" => Keyword::Int,
            "bool" => Keyword::Bool,
            "eq" => Keyword::Eq,
            _ => return None,
        };
        Some(kw)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Begin => "begin",
            Keyword::End => "end",
            Keyword::If => "if",
            Keyword::Elif => "elif",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Print => "print",
            Keyword::Show => "show",
            Keyword::Solve => "solve",
            Keyword::Input => "input",
            Keyword::Int => "int",
            Keyword::Bool => "bool",
            Keyword::Eq => "eq",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
    Not,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Assign => "=",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::LessEqual => "<=",
            Operator::GreaterEqual => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Not => "!",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int(i64),
    Bool(bool),
    Identifier(String),
    Keyword(Keyword),
    Operator(Operator),
    Punctuation(char),
    Newline,
    /// Text that matched no lexical rule
    Error(String),
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "integer {}", n),
            TokenKind::Bool(b) => write!(f, "boolean {}", b),
            TokenKind::Identifier(name) => write!(f, "identifier '{}'", name),
            TokenKind::Keyword(kw) => write!(f, "'{}'", kw.as_str()),
            TokenKind::Operator(op) => write!(f, "'{}'", op.as_str()),
            TokenKind::Punctuation(c) => write!(f, "'{}'", c),
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Error(text) => write!(f, "invalid input '{}'", text),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
}

/// Streaming tokenizer over a source string.
///
/// The lexer yields tokens through [`Iterator`] and finishes with exactly one
/// [`TokenKind::Eof`]. Calling [`Lexer::reset`] rewinds it to the start so the
/// same source can be scanned again.
pub struct Lexer<'src> {
    source: &'src str,
    pos: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer { source, pos: 0, line: 1, column: 1, finished: false }
    }

    /// Rewinds to the beginning of the source
    pub fn reset(&mut self) {
        self.pos = 0;
        self.line = 1;
        self.column = 1;
        self.finished = false;
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consumes characters while `pred` holds and returns the consumed slice
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'src str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
        &self.source[start..self.pos]
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '/' if self.peek_second() == Some('/') => {
                    // Comment runs up to, but not including, the newline
                    self.take_while(|ch| ch != '\n');
                }
                _ => break,
            }
        }
    }

    fn operator(&mut self, c: char) -> TokenKind {
        self.bump();
        let next = self.peek();
        let (op, wide) = match (c, next) {
            ('=', Some('=')) => (Operator::Equal, true),
            ('!', Some('=')) => (Operator::NotEqual, true),
            ('<', Some('=')) => (Operator::LessEqual, true),
            ('>', Some('=')) => (Operator::GreaterEqual, true),
            ('&', Some('&')) => (Operator::And, true),
            ('|', Some('|')) => (Operator::Or, true),
            ('=', _) => (Operator::Assign, false),
            ('!', _) => (Operator::Not, false),
            ('<', _) => (Operator::Less, false),
            ('>', _) => (Operator::Greater, false),
            ('+', _) => (Operator::Plus, false),
            ('-', _) => (Operator::Minus, false),
            ('*', _) => (Operator::Star, false),
            ('/', _) => (Operator::Slash, false),
            ('≠', _) => (Operator::NotEqual, false),
            ('≤', _) => (Operator::LessEqual, false),
            ('≥', _) => (Operator::GreaterEqual, false),
            // A lone '&' or '|'
            _ => return TokenKind::Error(c.to_string()),
        };
        if wide {
            self.bump();
        }
        TokenKind::Operator(op)
    }

    fn next_kind(&mut self) -> Option<TokenKind> {
        let c = self.peek()?;
        let kind = match c {
            '\n' => {
                self.bump();
                TokenKind::Newline
            }
            '0'..='9' => {
                let digits = self.take_while(|ch| ch.is_ascii_digit());
                match digits.parse::<i64>() {
                    Ok(n) => TokenKind::Int(n),
                    Err(_) => TokenKind::Error(digits.to_string()),
                }
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let word = self.take_while(|ch| ch.is_ascii_alphanumeric() || ch == '_');
                match word {
                    "true" => TokenKind::Bool(true),
                    "false" => TokenKind::Bool(false),
                    "and" => TokenKind::Operator(Operator::And),
                    "or" => TokenKind::Operator(Operator::Or),
                    "not" => TokenKind::Operator(Operator::Not),
                    _ => match Keyword::lookup(word) {
                        Some(kw) => TokenKind::Keyword(kw),
                        None => TokenKind::Identifier(word.to_string()),
                    },
                }
            }
            '=' | '!' | '<' | '>' | '+' | '-' | '*' | '/' | '&' | '|' | '≠' | '≤' | '≥' => {
                self.operator(c)
            }
            '(' | ')' | ',' => {
                self.bump();
                TokenKind::Punctuation(c)
            }
            _ => {
                // Group a run of unrecognized characters into one error token
                let start = self.pos;
                self.bump();
                self.take_while(|ch| {
                    !(ch.is_whitespace()
                        || ch.is_ascii_alphanumeric()
                        || "_=!<>+-*/&|(),≠≤≥".contains(ch))
                });
                TokenKind::Error(self.source[start..self.pos].to_string())
            }
        };
        Some(kind)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        self.skip_trivia();
        let location = SourceLocation::new(self.line, self.column);
        match self.next_kind() {
            Some(kind) => Some(Token { kind, location }),
            None => {
                self.finished = true;
                Some(Token { kind: TokenKind::Eof, location })
            }
        }
    }
}

/// Tokenizes Khwarizmi source code into a vector of tokens.
///
/// The returned vector always ends with a single `Eof` token. Lexical errors
/// are embedded as `TokenKind::Error` so the parser can report all of them.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}
