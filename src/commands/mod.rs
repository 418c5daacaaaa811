use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::io::Write;

use crate::llm::RagSession;

const PROMPT: &str = "\nWhat do you want to know? (type 'bye' to quit): ";
const EXIT_WORD: &str = "bye";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Exit,
    Skip,
    Query(String),
}

/// Classifies one raw line read from the user.
pub fn classify(line: &str) -> ShellInput {
    let input = line.trim();
    if input.eq_ignore_ascii_case(EXIT_WORD) {
        ShellInput::Exit
    } else if input.is_empty() {
        ShellInput::Skip
    } else {
        ShellInput::Query(input.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct CommandHandler<'a> {
    session: &'a RagSession,
}

impl<'a> CommandHandler<'a> {
    pub fn new(session: &'a RagSession) -> Self {
        Self { session }
    }

    /// Handles one line, writing the answer or the error to `out`. Query
    /// failures are reported and the session carries on.
    pub async fn handle_command<W: Write>(&self, line: &str, out: &mut W) -> std::io::Result<Flow> {
        match classify(line) {
            ShellInput::Exit => {
                writeln!(out, "Goodbye!")?;
                Ok(Flow::Exit)
            }
            ShellInput::Skip => Ok(Flow::Continue),
            ShellInput::Query(query) => {
                match self.session.generate_response(&query).await {
                    Ok(answer) => writeln!(out, "{} {}", "Answer:".bold(), answer.bright_green())?,
                    Err(e) => {
                        log::debug!("query failed: {:?}", e);
                        writeln!(out, "{}", format!("Error getting answer: {}", e).red())?
                    }
                }
                Ok(Flow::Continue)
            }
        }
    }
}

/// Reads questions from the terminal until `bye`, end of input or Ctrl-C.
pub async fn run_shell(session: &RagSession) -> Result<(), ReadlineError> {
    let handler = CommandHandler::new(session);
    let mut rl = Editor::<(), DefaultHistory>::new()?;
    let mut stdout = std::io::stdout();

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let input = line.trim();
                if !input.is_empty() {
                    if let Err(e) = rl.add_history_entry(input) {
                        log::debug!("could not record history entry: {}", e);
                    }
                }
                if handler.handle_command(&line, &mut stdout).await? == Flow::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("\nExiting...");
                break;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{session, MockEmbedder, MockGenerator, MockStore};

    #[test]
    fn test_classify() {
        assert_eq!(classify("  BYE \n"), ShellInput::Exit);
        assert_eq!(classify("Bye"), ShellInput::Exit);
        assert_eq!(classify("   "), ShellInput::Skip);
        assert_eq!(
            classify("  where did she work?  "),
            ShellInput::Query("where did she work?".to_string())
        );
        assert_eq!(classify("goodbye"), ShellInput::Query("goodbye".to_string()));
    }

    #[tokio::test]
    async fn test_query_prints_answer() {
        let generator = MockGenerator::answering(&["Engineer"]);
        let rag = session(
            MockStore::with_texts(&["Jane Doe Engineer"]),
            MockEmbedder::default(),
            generator.clone(),
        );
        let handler = CommandHandler::new(&rag);
        let mut out = Vec::new();

        let flow = handler.handle_command("What is her title?", &mut out).await.unwrap();
        assert_eq!(flow, Flow::Continue);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Answer:"));
        assert!(printed.contains("Engineer"));
    }

    #[tokio::test]
    async fn test_query_error_keeps_session_alive() {
        let embedder = MockEmbedder {
            fail: true,
            ..Default::default()
        };
        let rag = session(MockStore::default(), embedder, MockGenerator::answering(&["x"]));
        let handler = CommandHandler::new(&rag);
        let mut out = Vec::new();

        let flow = handler.handle_command("anything", &mut out).await.unwrap();
        assert_eq!(flow, Flow::Continue);
        assert!(String::from_utf8(out).unwrap().contains("Error getting answer"));
    }

    #[tokio::test]
    async fn test_blank_and_exit_lines() {
        let generator = MockGenerator::answering(&["x"]);
        let rag = session(MockStore::default(), MockEmbedder::default(), generator.clone());
        let handler = CommandHandler::new(&rag);
        let mut out = Vec::new();

        assert_eq!(handler.handle_command("", &mut out).await.unwrap(), Flow::Continue);
        assert_eq!(handler.handle_command("bye", &mut out).await.unwrap(), Flow::Exit);
        assert_eq!(String::from_utf8(out).unwrap(), "Goodbye!\n");
        assert!(generator.prompts.lock().unwrap().is_empty());
    }
}
