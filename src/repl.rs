//! Shared console loop for the chat and offline assistants.

use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;

const EXIT_KEYWORDS: &[&str] = &["salir", "exit", "quit"];

pub fn is_exit_command(line: &str) -> bool {
    EXIT_KEYWORDS.contains(&line.trim().to_lowercase().as_str())
}

#[async_trait]
pub trait ReplHandler: Send {
    async fn handle(&mut self, question: &str);
}

/// Read-eval-print loop: prompts on stdout, dispatches non-empty lines to
/// the handler, exits on an exit keyword, EOF, or Ctrl-C.
pub async fn run(prompt: &str, handler: &mut dyn ReplHandler) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        print!("{}", prompt);
        std::io::stdout().flush()?;

        let line = tokio::select! {
            _ = signal::ctrl_c() => {
                println!("\n👋 ¡Hasta luego!");
                return Ok(());
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            // EOF
            println!("\n👋 ¡Hasta luego!");
            return Ok(());
        };

        let question = line.trim();

        if question.is_empty() {
            println!("⚠️ Por favor escribe una pregunta.");
            continue;
        }

        if is_exit_command(question) {
            println!("👋 ¡Hasta luego!");
            return Ok(());
        }

        handler.handle(question).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_keywords_are_case_insensitive() {
        assert!(is_exit_command("salir"));
        assert!(is_exit_command("EXIT"));
        assert!(is_exit_command("  Quit  "));
        assert!(!is_exit_command("exit now"));
        assert!(!is_exit_command("¿qué es react?"));
    }
}
