//! Interactive chat loop.
//!
//! Each prompt sent to the backend carries the recent conversation as
//! `User: ...` / `Assistant: ...` lines followed by `Assistant:`. Slots
//! returned by the agent are listed as numbered booking shortcuts.

use std::io::Write;

use calbot_core::{Interval, format_utc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::api::BackendClient;
use crate::error::ClientResult;
use crate::render::slot_label;

/// Messages of history included in each prompt.
pub const DEFAULT_MAX_HISTORY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub speaker: Speaker,
    pub content: String,
    pub slots: Vec<Interval>,
}

/// Conversation state of one chat.
#[derive(Debug, Clone)]
pub struct ChatSession {
    history: Vec<ChatEntry>,
    max_history: usize,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl ChatSession {
    pub fn new(max_history: usize) -> Self {
        Self {
            history: Vec::new(),
            max_history,
        }
    }

    pub fn history(&self) -> &[ChatEntry] {
        &self.history
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.history.push(ChatEntry {
            speaker: Speaker::User,
            content: content.into(),
            slots: Vec::new(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>, slots: Vec<Interval>) {
        self.history.push(ChatEntry {
            speaker: Speaker::Assistant,
            content: content.into(),
            slots,
        });
    }

    /// The last `max_history` messages followed by `Assistant:`.
    pub fn prompt(&self) -> String {
        let skip = self.history.len().saturating_sub(self.max_history);
        let mut prompt = String::new();
        for entry in &self.history[skip..] {
            prompt.push_str(entry.speaker.label());
            prompt.push_str(": ");
            prompt.push_str(&entry.content);
            prompt.push('\n');
        }
        prompt.push_str("Assistant:");
        prompt
    }

    /// Slots offered by the latest assistant message.
    pub fn latest_slots(&self) -> &[Interval] {
        self.history
            .iter()
            .rev()
            .find(|e| e.speaker == Speaker::Assistant)
            .map(|e| e.slots.as_slice())
            .unwrap_or_default()
    }
}

/// Prompt that books a 30-minute meeting in `slot`.
pub fn booking_prompt(slot: &Interval) -> String {
    format!(
        "Book: Title: Meeting; Start: {}; Duration: 30",
        format_utc(&slot.start())
    )
}

/// A line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Message(String),
    /// `/book <n>`, 1-based.
    Book(usize),
    Help,
    Quit,
    Empty,
    Invalid(String),
}

impl ChatInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Self::Message(line.to_string());
        };

        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("quit" | "exit" | "q"), None) => Self::Quit,
            (Some("help" | "h"), None) => Self::Help,
            (Some("book"), Some(n)) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Self::Book(n),
                _ => Self::Invalid(format!("not a slot number: {n}")),
            },
            (Some("book"), None) => Self::Invalid("usage: /book <n>".to_string()),
            _ => Self::Invalid(format!("unknown command: /{command}")),
        }
    }
}

const HELP: &str = "Type a request, e.g. \"am I free tomorrow afternoon?\".\n\
/book <n>  book offered slot n as a 30-minute meeting\n\
/help      show this help\n\
/quit      leave";

/// Runs the chat until `/quit` or end of input.
pub async fn run_chat<R, W>(client: &BackendClient, input: R, output: &mut W) -> ClientResult<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = ChatSession::default();
    let mut lines = input.lines();

    writeln!(output, "Calendar assistant. /help for commands, /quit to leave.")?;
    loop {
        write!(output, "> ")?;
        output.flush()?;
        let Some(line) = lines.next_line().await? else {
            writeln!(output)?;
            break;
        };

        match ChatInput::parse(&line) {
            ChatInput::Empty => continue,
            ChatInput::Quit => break,
            ChatInput::Help => writeln!(output, "{HELP}")?,
            ChatInput::Invalid(message) => writeln!(output, "{message}")?,
            ChatInput::Book(n) => {
                let Some(slot) = session.latest_slots().get(n - 1).copied() else {
                    writeln!(output, "No slot {n} on offer.")?;
                    continue;
                };
                let text = match client.run(booking_prompt(&slot)).await {
                    Ok(reply) => reply.content,
                    Err(e) => format!("Error: {e}"),
                };
                writeln!(output, "{text}")?;
            }
            ChatInput::Message(message) => {
                session.push_user(message);
                let prompt = session.prompt();
                debug!(chars = prompt.len(), "sending prompt");

                let (content, slots) = match client.run(prompt).await {
                    Ok(reply) => (reply.content, reply.slots),
                    Err(e) => (format!("Error: {e}"), Vec::new()),
                };
                writeln!(output, "{content}")?;
                for (i, slot) in slots.iter().enumerate() {
                    writeln!(output, "  [{}] {}", i + 1, slot_label(slot))?;
                }
                session.push_assistant(content, slots);
            }
        }
    }
    Ok(())
}
