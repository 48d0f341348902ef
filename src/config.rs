// File: src/config.rs
//
// Runtime configuration for the CLI: logging level, colored output, and how
// diagnostics are rendered. Built from the global command-line flags and
// passed down to every subcommand.

use crate::errors::Diagnostic;
use crate::logger::{self, LogLevel};
use clap::ValueEnum;

/// How diagnostics are written to stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DiagnosticFormat {
    /// Colored, source-annotated messages
    #[default]
    Human,
    /// A JSON array of diagnostic objects
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_level: LogLevel,
    pub color: bool,
    pub format: DiagnosticFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config { log_level: LogLevel::Warn, color: true, format: DiagnosticFormat::Human }
    }
}

impl Config {
    /// Installs the logger and the color override for this process
    pub fn apply(&self) {
        logger::init_with_level(self.log_level);
        if !self.color {
            colored::control::set_override(false);
        }
    }

    /// Renders diagnostics in the configured format
    pub fn render_diagnostics(&self, diagnostics: &[Diagnostic]) -> Result<String, serde_json::Error> {
        match self.format {
            DiagnosticFormat::Human => Ok(diagnostics.iter().map(|d| d.to_string()).collect::<Vec<_>>().join("\n")),
            DiagnosticFormat::Json => serde_json::to_string_pretty(diagnostics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceLocation;

    #[test]
    fn test_json_rendering() {
        let config = Config { format: DiagnosticFormat::Json, ..Config::default() };
        let diags = vec![Diagnostic::syntax("expected 'end'", SourceLocation::new(3, 1))];
        let json = config.render_diagnostics(&diags).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["severity"], "syntax");
        assert_eq!(parsed[0]["location"]["line"], 3);
        assert!(parsed[0].get("help").is_none());
    }

    #[test]
    fn test_human_rendering_mentions_location() {
        colored::control::set_override(false);
        let config = Config::default();
        let diags = vec![Diagnostic::type_error("bad", SourceLocation::new(2, 5))];
        let text = config.render_diagnostics(&diags).unwrap();
        assert!(text.contains("Type Error: bad"));
        assert!(text.contains("--> 2:5"));
    }
}
