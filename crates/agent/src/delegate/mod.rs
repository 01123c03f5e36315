//! Delegate agents
//!
//! An agent is declared once, resolved eagerly at registration, and invoked
//! by name. Whatever the transport returns is normalized into an
//! [`Envelope`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub mod catalog;
pub mod envelope;
pub mod model;
pub mod registry;
pub mod transport;

pub use catalog::{DelegateCatalog, InProcessDelegate};
pub use envelope::{coerce, Envelope, RawOutput};
pub use model::ModelDelegate;
pub use registry::{AgentInfo, AgentRegistry, AgentSpec, AgentState};
pub use transport::{DelegateTransport, InProcessTransport, SubprocessTransport};

/// How an agent is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    InProcess,
    Subprocess,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::InProcess => "in_process",
            TransportKind::Subprocess => "subprocess",
        }
    }
}

impl From<zai_config::TransportSetting> for TransportKind {
    fn from(setting: zai_config::TransportSetting) -> Self {
        match setting {
            zai_config::TransportSetting::InProcess => TransportKind::InProcess,
            zai_config::TransportSetting::Subprocess => TransportKind::Subprocess,
        }
    }
}

/// Why an agent could not be made ready
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("module '{0}' is not available")]
    ModuleUnavailable(String),

    #[error("entry point '{entry_point}' not found in module '{module}'")]
    EntryPointMissing { module: String, entry_point: String },

    #[error("launcher script not found: {}", .0.display())]
    ScriptMissing(PathBuf),

    #[error("launcher command is empty")]
    EmptyLauncher,
}

/// Whole seconds as `N s`, anything finer in milliseconds
pub fn format_timeout(timeout: &Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("{} s", timeout.as_secs())
    } else {
        format!("{} ms", timeout.as_millis())
    }
}

/// Why a single invocation failed
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to start agent process: {0}")]
    Spawn(std::io::Error),

    #[error("agent I/O error: {0}")]
    Io(std::io::Error),

    #[error("agent did not respond in time ({})", format_timeout(.0))]
    Timeout(Duration),

    #[error("agent exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("empty response")]
    EmptyOutput,

    #[error("agent error: {0}")]
    Delegate(String),

    #[error("agent panicked: {0}")]
    Panicked(String),
}
