//! Line input shared by the login form, the command loop and the delete
//! confirmation.

use std::{io, sync::Arc};

use async_trait::async_trait;
use dashboard_core::ConfirmationPrompt;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin},
    sync::Mutex,
};

pub struct LineReader<R> {
    lines: Mutex<Lines<R>>,
}

pub type StdinReader = LineReader<BufReader<Stdin>>;

impl StdinReader {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
        }
    }

    /// Prints `prompt` and waits for the next line. `None` once input is closed.
    pub async fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
        let mut out = tokio::io::stdout();
        out.write_all(prompt.as_bytes()).await?;
        out.flush().await?;
        self.lines.lock().await.next_line().await
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Asks on the terminal; anything but an explicit yes declines.
pub struct PromptConfirm<R> {
    reader: Arc<LineReader<R>>,
}

impl<R> PromptConfirm<R> {
    pub fn new(reader: Arc<LineReader<R>>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl<R> ConfirmationPrompt for PromptConfirm<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn confirm(&self, prompt: &str) -> bool {
        match self.reader.read_line(&format!("{prompt} [y/N] ")).await {
            Ok(Some(answer)) => is_yes(&answer),
            _ => false,
        }
    }
}
