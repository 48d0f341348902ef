// File: src/repl.rs
//
// Interactive REPL (Read-Eval-Print Loop) for the Khwarizmi language.
// Provides an interactive shell with:
// - Multi-line input: lines accumulate until every `begin` has its `end`
// - Command history with up/down arrow navigation
// - Special commands (:help, :clear, :quit)
// - `input` statements answered at an `input>` prompt
//
// Each complete `begin … end` program is compiled and run on its own.

use crate::interpreter::{InputSource, WriterOutput};
use crate::lexer::{Keyword, Lexer, TokenKind};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io;

/// REPL session that owns the line editor
pub struct Repl {
    editor: DefaultEditor,
}

/// Answers `input` statements by prompting through the line editor
struct PromptInput<'a> {
    editor: &'a mut DefaultEditor,
}

impl InputSource for PromptInput<'_> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        match self.editor.readline(&"input> ".bright_magenta().to_string()) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Io(err)) => Err(err),
            Err(err) => Err(io::Error::other(err.to_string())),
        }
    }
}

/// Net `begin`/`end` nesting of some source text
fn block_depth(source: &str) -> i64 {
    Lexer::new(source)
        .map(|token| match token.kind {
            TokenKind::Keyword(Keyword::Begin) => 1,
            TokenKind::Keyword(Keyword::End) => -1,
            _ => 0,
        })
        .sum()
}

/// True once the buffer holds at least one block and every block is closed
pub fn is_input_complete(buffer: &str) -> bool {
    let opened = Lexer::new(buffer).any(|t| t.kind == TokenKind::Keyword(Keyword::Begin));
    opened && block_depth(buffer) <= 0
}

impl Repl {
    /// Creates a new REPL session
    pub fn new() -> Result<Self, ReadlineError> {
        Ok(Repl { editor: DefaultEditor::new()? })
    }

    fn show_banner(&self) {
        println!("{}", format!("Khwarizmi REPL v{}", env!("CARGO_PKG_VERSION")).bright_cyan());
        println!(
            "  Type a {} … {} program, or {} for commands",
            "begin".bright_yellow(),
            "end".bright_yellow(),
            ":help".bright_yellow()
        );
        println!();
    }

    /// Starts the REPL loop
    pub fn run(&mut self) -> Result<(), ReadlineError> {
        self.show_banner();

        let mut buffer = String::new();

        loop {
            let prompt = if buffer.is_empty() {
                "kz> ".bright_green().to_string()
            } else {
                "... ".bright_blue().to_string()
            };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let _ = self.editor.add_history_entry(line.as_str());

                    if buffer.is_empty() && line.trim().starts_with(':') {
                        if self.handle_command(line.trim(), &mut buffer) {
                            continue;
                        } else {
                            break;
                        }
                    }

                    buffer.push_str(&line);
                    buffer.push('\n');

                    if is_input_complete(&buffer) {
                        self.eval_input(&buffer);
                        buffer.clear();
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C (:quit to exit)".bright_yellow());
                    buffer.clear();
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "Goodbye!".bright_cyan());
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }

    /// Handles special REPL commands starting with ':'
    /// Returns true to continue REPL, false to quit
    fn handle_command(&mut self, cmd: &str, buffer: &mut String) -> bool {
        match cmd {
            ":help" | ":h" => {
                println!("  {}  show this help", ":help".bright_yellow());
                println!("  {} discard the pending input", ":clear".bright_yellow());
                println!("  {}  leave the REPL", ":quit".bright_yellow());
                true
            }
            ":clear" | ":c" => {
                buffer.clear();
                true
            }
            ":quit" | ":q" | ":exit" => false,
            other => {
                println!("{} unknown command '{}'", "Error:".bright_red(), other);
                true
            }
        }
    }

    fn eval_input(&mut self, source: &str) {
        let program = match crate::compile(source) {
            Ok(program) => program,
            Err(diagnostics) => {
                for diagnostic in diagnostics {
                    eprint!("{}", diagnostic);
                }
                return;
            }
        };

        let mut input = PromptInput { editor: &mut self.editor };
        let mut output = WriterOutput::new(std::io::stdout());
        if let Err(err) = crate::run(&program, &mut input, &mut output) {
            eprint!("{}", err.to_diagnostic().attach_source(source));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_completeness() {
        assert!(!is_input_complete(""));
        assert!(!is_input_complete("begin\n int x\n"));
        assert!(!is_input_complete("begin\n if true begin\n end\n"));
        assert!(is_input_complete("begin\n if true begin\n end\nend\n"));
        // A stray 'end' closes the buffer so the parser can report it
        assert!(is_input_complete("begin\nend\nend\n"));
    }
}
