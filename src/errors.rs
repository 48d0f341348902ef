// File: src/errors.rs
//
// Error handling and reporting for the Khwarizmi language.
// Provides structured diagnostics with source location information and
// pretty-printed messages, plus the typed runtime/equation failures raised
// while a program executes.

use colored::Colorize;
use serde::Serialize;
use std::fmt;

/// Source location information for tracking where code appears in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn unknown() -> Self {
        Self { line: 0, column: 0 }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Which pipeline stage produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Lexical,
    Syntax,
    Type,
    Runtime,
    Equation,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Lexical => write!(f, "Lexical Error"),
            Severity::Syntax => write!(f, "Syntax Error"),
            Severity::Type => write!(f, "Type Error"),
            Severity::Runtime => write!(f, "Runtime Error"),
            Severity::Equation => write!(f, "Equation Error"),
        }
    }
}

/// A structured error with location information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            severity,
            message: message.into(),
            location,
            source_line: None,
            suggestion: None,
            help: None,
        }
    }

    pub fn with_source(mut self, source_line: String) -> Self {
        self.source_line = Some(source_line);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Create a lexical error for an unrecognized character sequence
    pub fn lexical(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(Severity::Lexical, message, location)
    }

    /// Create a syntax error
    pub fn syntax(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(Severity::Syntax, message, location)
    }

    /// Create a type error
    pub fn type_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(Severity::Type, message, location)
    }

    /// Attaches the referenced line of `source` if the location points into it
    pub fn attach_source(self, source: &str) -> Self {
        if self.location.line == 0 || self.source_line.is_some() {
            return self;
        }
        match source.lines().nth(self.location.line - 1) {
            Some(line) => self.with_source(line.to_string()),
            None => self,
        }
    }
}

impl Severity {
    /// Colors the header; failures found while running stand apart from compile errors
    fn paint(&self, text: &str) -> colored::ColoredString {
        match self {
            Severity::Lexical | Severity::Syntax | Severity::Type => text.red().bold(),
            Severity::Runtime => text.bright_red().bold(),
            Severity::Equation => text.magenta().bold(),
        }
    }
}

impl Diagnostic {
    /// Width of the caret run: the identifier or number starting at the column
    fn marker_width(&self, source: &str) -> usize {
        let start = self.location.column.saturating_sub(1);
        let width = source
            .chars()
            .skip(start)
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .count();
        width.max(1)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}: {}", self.severity.paint(&self.severity.to_string()), self.message.bold())?;

        // Runtime failures built without a position have line 0
        if self.location.line == 0 {
            writeln!(f, "{}", "  --> <unknown>".bright_blue())?;
        } else {
            writeln!(f, "{}", format!("  --> {}", self.location).bright_blue())?;
        }

        if let Some(source) = &self.source_line {
            let gutter = "|".bright_blue();
            let pad = " ".repeat(self.location.column.saturating_sub(1));
            let carets = "^".repeat(self.marker_width(source));
            writeln!(f, "{} {} {}", format!("{:>4}", self.location.line).bright_blue(), gutter, source)?;
            writeln!(f, "     {} {}{}", gutter, pad, self.severity.paint(&carets))?;
        }

        if let Some(help) = &self.help {
            writeln!(f, "     {} {}", "=".bright_yellow(), format!("help: {}", help).bright_yellow())?;
        }
        if let Some(suggestion) = &self.suggestion {
            writeln!(f, "     {} {}", "=".bright_green(), format!("did you mean '{}'?", suggestion).bright_green())?;
        }

        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Why a `solve` could not produce a single integer value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EquationError {
    #[error("expected an equation of the form `left == right`")]
    NotAnEquation,
    #[error("equation has no unknown to solve for")]
    NoUnknown,
    #[error("equation has more than one unknown: {}", .0.join(", "))]
    MultipleUnknowns(Vec<String>),
    #[error("equation is not linear in '{0}'")]
    NonLinear(String),
    #[error("unsupported equation form: {0}")]
    Unsupported(String),
    #[error("'{0}' is not an equation")]
    UnknownEquation(String),
    #[error("equation is an identity: '{0}' has infinitely many solutions")]
    Identity(String),
    #[error("equation is a contradiction: '{0}' has no solution")]
    Contradiction(String),
    #[error("no integer solution: {coefficient} * {unknown} = {constant}")]
    NoIntegerSolution {
        unknown: String,
        coefficient: i64,
        constant: i64,
    },
}

/// The specific fault behind a [`RuntimeError`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeErrorKind {
    #[error("division by zero")]
    DivisionByZero,
    #[error("variable '{0}' is not defined")]
    UndefinedVariable(String),
    #[error("variable '{0}' is already declared in this scope")]
    Redeclared(String),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("expected {expected} input for '{name}', got '{text}'")]
    InputMismatch {
        name: String,
        expected: String,
        text: String,
    },
    #[error("failed to read input: {0}")]
    Input(String),
    #[error("input exhausted while reading '{0}'")]
    InputExhausted(String),
    #[error("failed to write output: {0}")]
    Output(String),
    #[error(transparent)]
    Equation(#[from] EquationError),
}

/// A fatal error raised while executing a program
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} (at {location})")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub location: SourceLocation,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }

    /// Converts into a diagnostic so runtime failures report like compile errors
    pub fn to_diagnostic(&self) -> Diagnostic {
        let severity = match self.kind {
            RuntimeErrorKind::Equation(_) => Severity::Equation,
            _ => Severity::Runtime,
        };
        Diagnostic::new(severity, self.kind.to_string(), self.location)
    }
}

/// Computes the Levenshtein distance between two strings
/// Used for "Did you mean?" suggestions
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();
    let (len1, len2) = (s1_chars.len(), s2_chars.len());

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    // Single rolling row instead of the full matrix
    let mut prev: Vec<usize> = (0..=len2).collect();
    let mut curr = vec![0; len2 + 1];

    for i in 1..=len1 {
        curr[0] = i;
        for j in 1..=len2 {
            let cost = if s1_chars[i - 1] == s2_chars[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[len2]
}

/// Find the closest match from a list of candidates using Levenshtein distance
/// Returns None if no good match is found (distance > 3)
pub fn find_closest_match<'a, I>(target: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best_match = None;
    let mut best_distance = usize::MAX;

    for candidate in candidates {
        let distance = levenshtein_distance(target, candidate);
        if distance <= 3 && distance < best_distance {
            best_distance = distance;
            best_match = Some(candidate);
        }
    }

    best_match
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("same", "same"), 0);
    }

    #[test]
    fn test_closest_match_respects_threshold() {
        let names = ["counter", "total"];
        assert_eq!(find_closest_match("countr", names.iter().copied()), Some("counter"));
        assert_eq!(find_closest_match("zzzzzzzz", names.iter().copied()), None);
    }

    #[test]
    fn test_attach_source_picks_line() {
        let diag = Diagnostic::syntax("oops", SourceLocation::new(2, 3)).attach_source("a\nbcd\n");
        assert_eq!(diag.source_line.as_deref(), Some("bcd"));
    }

    #[test]
    fn test_render_underlines_whole_name() {
        colored::control::set_override(false);
        let diag = Diagnostic::type_error("variable 'cout' is not declared", SourceLocation::new(3, 8))
            .attach_source("begin\n int count\n print cout\nend")
            .with_suggestion("count".to_string());
        let text = diag.to_string();
        assert!(text.starts_with("Type Error: variable 'cout' is not declared"));
        assert!(text.contains("   3 |  print cout"));
        assert!(text.contains("|        ^^^^\n"));
        assert!(text.contains("did you mean 'count'?"));
    }

    #[test]
    fn test_render_without_location() {
        colored::control::set_override(false);
        let diag = Diagnostic::new(Severity::Equation, "no unknown", SourceLocation::unknown());
        assert!(diag.to_string().contains("--> <unknown>"));
    }

    #[test]
    fn test_runtime_error_severity() {
        let err = RuntimeError::new(
            RuntimeErrorKind::Equation(EquationError::NoUnknown),
            SourceLocation::new(1, 1),
        );
        assert_eq!(err.to_diagnostic().severity, Severity::Equation);
        let err = RuntimeError::new(RuntimeErrorKind::DivisionByZero, SourceLocation::new(1, 1));
        assert_eq!(err.to_diagnostic().severity, Severity::Runtime);
    }
}
