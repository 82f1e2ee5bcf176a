//! The tool-calling loop.

use std::sync::Arc;

use calbot_protocol::RunResponse;
use tracing::{debug, info, warn};

use crate::error::{AgentError, AgentResult};
use crate::memory::ConversationMemory;
use crate::reasoner::{ChatMessage, Reasoner, ReasonerTurn};
use crate::tools::BackendTools;

pub const DEFAULT_MAX_STEPS: usize = 6;

pub const SYSTEM_PROMPT: &str = "You are a scheduling assistant for a single shared calendar. \
All times are UTC. Use check_availability to find free slots, get_event_details to see what \
is already booked and create_event to book a meeting. Each user message may start with the \
current UTC date and time; use it to turn relative dates into ISO8601 timestamps ending in Z. \
Confirm bookings with the event title and time. Keep answers short.";

/// What happened while answering one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub response: RunResponse,
    /// Reasoner round trips, the final answer included.
    pub steps: usize,
    pub tool_calls: usize,
    /// Tool calls whose error text was handed back to the model.
    pub failed_tool_calls: usize,
}

/// Drives a [`Reasoner`] through tool calls until it answers.
pub struct Agent {
    reasoner: Arc<dyn Reasoner>,
    tools: BackendTools,
    memory: ConversationMemory,
    system_prompt: String,
    max_steps: usize,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("reasoner", &self.reasoner.name())
            .field("backend", &self.tools.base_url().as_str())
            .field("max_steps", &self.max_steps)
            .finish_non_exhaustive()
    }
}

impl Agent {
    pub fn new(reasoner: Arc<dyn Reasoner>, tools: BackendTools) -> Self {
        Self {
            reasoner,
            tools,
            memory: ConversationMemory::default(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[must_use]
    pub fn with_memory(mut self, memory: ConversationMemory) -> Self {
        self.memory = memory;
        self
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Answers one prompt.
    ///
    /// `slots` in the reply are those of the last successful
    /// `check_availability` call of this run. Tool failures are handed back
    /// to the model; only reasoner errors and running out of steps fail
    /// the run.
    pub async fn run(&self, prompt: &str) -> AgentResult<RunResponse> {
        Ok(self.run_report(prompt).await?.response)
    }

    /// Like [`run`](Self::run), with step and tool-call counts.
    pub async fn run_report(&self, prompt: &str) -> AgentResult<RunReport> {
        let specs = self.tools.specs();
        let mut messages = Vec::with_capacity(self.memory.capacity() + 2);
        messages.push(ChatMessage::system(&self.system_prompt));
        messages.extend(self.memory.snapshot().await);
        messages.push(ChatMessage::user(prompt));

        let mut slots = Vec::new();
        let mut tool_calls = 0;
        let mut failed_tool_calls = 0;
        for step in 1..=self.max_steps {
            match self.reasoner.reason(&messages, &specs).await? {
                ReasonerTurn::Final(content) => {
                    info!(step, tool_calls, failed_tool_calls, slots = slots.len(), "agent answered");
                    self.memory.record(prompt, &content).await;
                    return Ok(RunReport {
                        response: RunResponse { content, slots },
                        steps: step,
                        tool_calls,
                        failed_tool_calls,
                    });
                }
                ReasonerTurn::ToolCalls { content, calls } => {
                    debug!(step, calls = calls.len(), "model requested tools");
                    messages.push(ChatMessage::tool_request(content, calls.clone()));
                    for call in &calls {
                        let outcome = self.tools.execute(call).await;
                        tool_calls += 1;
                        if outcome.failed {
                            failed_tool_calls += 1;
                            warn!(tool = %call.name, output = %outcome.output, "tool call failed");
                        }
                        if let Some(found) = outcome.slots {
                            slots = found;
                        }
                        messages.push(ChatMessage::tool_result(&call.id, outcome.output));
                    }
                }
            }
        }

        warn!(max_steps = self.max_steps, tool_calls, failed_tool_calls, "agent gave up");
        Err(AgentError::MaxSteps(self.max_steps))
    }
}
