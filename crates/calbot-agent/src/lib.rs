//! Calendar assistant agent.
//!
//! Receives prompts on `POST /run`, lets a [`Reasoner`] decide which
//! calendar tools to call against the backend, and answers with text plus
//! any free slots it found.

pub mod agent;
pub mod config;
pub mod error;
pub mod memory;
pub mod openai;
pub mod reasoner;
pub mod service;
pub mod tools;

pub use agent::{Agent, DEFAULT_MAX_STEPS, RunReport, SYSTEM_PROMPT};
pub use config::{AgentArgs, AgentConfig};
pub use error::{AgentError, AgentResult};
pub use memory::ConversationMemory;
pub use openai::{OpenAiConfig, OpenAiReasoner};
pub use reasoner::{ChatMessage, Reasoner, ReasonerTurn, Role, ScriptedReasoner, ToolCall, ToolSpec};
pub use service::create_app;
pub use tools::{BackendTools, ToolOutcome};
