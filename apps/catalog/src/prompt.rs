use std::{
    io::{self, BufRead, Write},
    sync::Arc,
};

use async_trait::async_trait;
use client_core::ConfirmPrompt;
use tokio::sync::{mpsc, Mutex};

use crate::browse::Console;

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn print_question(message: &str) {
    print!("{message} [y/N] ");
    let _ = io::stdout().flush();
}

/// Asks on the terminal for one-shot commands.
pub struct StdinConfirm;

#[async_trait]
impl ConfirmPrompt for StdinConfirm {
    async fn confirm(&self, message: &str) -> bool {
        print_question(message);
        let answer = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;
        match answer {
            Ok(Ok(line)) => is_affirmative(&line),
            _ => false,
        }
    }
}

/// Asks using the next line of an interactive session's input stream.
pub struct LineConfirm {
    lines: Arc<Mutex<mpsc::Receiver<String>>>,
    console: Console,
}

impl LineConfirm {
    pub fn new(lines: Arc<Mutex<mpsc::Receiver<String>>>, console: Console) -> Self {
        Self { lines, console }
    }
}

#[async_trait]
impl ConfirmPrompt for LineConfirm {
    async fn confirm(&self, message: &str) -> bool {
        self.console.write(format!("{message} [y/N] "));
        match self.lines.lock().await.recv().await {
            Some(line) => is_affirmative(&line),
            None => false,
        }
    }
}
