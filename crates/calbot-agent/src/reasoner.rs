//! The model side of the agent.
//!
//! A [`Reasoner`] sees the conversation so far plus the available tools and
//! either answers or asks for tool calls. [`OpenAiReasoner`](crate::openai::OpenAiReasoner)
//! is the production implementation; [`ScriptedReasoner`] replays canned
//! turns.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AgentError, AgentResult};

/// Boxed future returned by [`Reasoner`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON arguments as produced by the model.
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// One message of the conversation sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    /// Set on [`Role::Tool`] messages.
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// An assistant turn that requested tools.
    pub fn tool_request(content: Option<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    /// The result of one tool call.
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }
}

/// A function the model may call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

/// What the model decided to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReasonerTurn {
    /// A final answer for the user.
    Final(String),
    /// Tools to run before the model continues.
    ToolCalls {
        content: Option<String>,
        calls: Vec<ToolCall>,
    },
}

/// Produces the next step of a conversation.
pub trait Reasoner: Send + Sync {
    fn name(&self) -> &str;

    fn reason<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        tools: &'a [ToolSpec],
    ) -> BoxFuture<'a, AgentResult<ReasonerTurn>>;
}

/// Replays a fixed list of turns and records what it was shown.
///
/// Fails once the script is exhausted.
#[derive(Debug, Default)]
pub struct ScriptedReasoner {
    turns: Mutex<VecDeque<AgentResult<ReasonerTurn>>>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedReasoner {
    pub fn new(turns: impl IntoIterator<Item = ReasonerTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into_iter().map(Ok).collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Appends a turn that fails with `message`.
    #[must_use]
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.turns
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(AgentError::reasoner(message)));
        self
    }

    /// Conversations passed to [`Reasoner::reason`], one per call.
    pub fn seen(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Reasoner for ScriptedReasoner {
    fn name(&self) -> &str {
        "scripted"
    }

    fn reason<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        _tools: &'a [ToolSpec],
    ) -> BoxFuture<'a, AgentResult<ReasonerTurn>> {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(messages.to_vec());
        let next = self
            .turns
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::reasoner("script exhausted")));
        Box::pin(async move { next })
    }
}
