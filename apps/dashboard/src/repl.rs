use clap::{Parser, Subcommand};

#[derive(Parser, Debug, PartialEq, Eq)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct CommandLine {
    #[command(subcommand)]
    command: Command,
}

/// Commands accepted at the dashboard prompt.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the task list.
    #[command(alias = "ls")]
    List,
    /// Create a task.
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        #[arg(long, short)]
        description: Option<String>,
    },
    /// Change a task's title, description or status.
    Edit {
        id: i64,
        #[arg(long, short)]
        title: Option<String>,
        #[arg(long, short)]
        description: Option<String>,
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Flip a task between pending and completed.
    Toggle { id: i64 },
    /// Delete a task after confirmation.
    #[command(alias = "rm")]
    Delete { id: i64 },
    /// Sort by title, alternating ascending and descending.
    Sort,
    /// Reload the task list.
    Retry,
    /// Show team members.
    Team {
        /// List every member instead of the sidebar subset.
        #[arg(long)]
        all: bool,
        /// Fetch a new set of members first.
        #[arg(long)]
        refresh: bool,
    },
    /// Hide the current notification.
    Dismiss,
    /// Sign out and return to the login prompt.
    Logout,
    #[command(alias = "exit")]
    Quit,
}

/// Parses one prompt line. Blank input is `Ok(None)`; errors carry clap's
/// rendered usage text.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let words = split_words(line)?;
    if words.is_empty() {
        return Ok(None);
    }
    CommandLine::try_parse_from(words)
        .map(|parsed| Some(parsed.command))
        .map_err(|err| err.render().to_string())
}

/// Splits on whitespace, keeping single- or double-quoted runs together.
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(open), ch) if ch == open => quote = None,
            (Some(_), '\\') => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => return Err("unterminated escape".to_string()),
            },
            (Some(_), ch) => current.push(ch),
            (None, '"' | '\'') => {
                quote = Some(ch);
                in_word = true;
            }
            (None, ch) if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, ch) => {
                current.push(ch);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
#[path = "tests/repl_tests.rs"]
mod tests;
