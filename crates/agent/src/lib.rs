//! Coordinator core
//!
//! Tool registry and dispatch, delegate agents behind subprocess and
//! in-process transports, and the coordinator that runs a query through the
//! model with every registered tool.

use thiserror::Error;

pub mod boot;
pub mod coordinator;
pub mod delegate;
pub mod prompt;
pub mod runner;
pub mod tools;

pub use coordinator::Coordinator;
pub use delegate::{
    AgentRegistry, AgentSpec, AgentState, DelegateCatalog, DelegateTransport, Envelope,
    InProcessDelegate, RawOutput, TransportKind,
};
pub use prompt::PromptBuilder;
pub use runner::Runner;
pub use tools::{function_tool, ToolBuilder, ToolRegistry, ToolTrait};

/// Run loop errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool execution failed: {0}")]
    ToolExecution(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("maximum tool iterations exceeded")]
    MaxIterations,
}

pub type Result<T> = std::result::Result<T, AgentError>;

/// At most `max_chars` characters of `text`, for log lines
pub(crate) fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}
