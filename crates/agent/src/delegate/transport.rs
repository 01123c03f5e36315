//! Delegate transports: spawned task or child process

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use zai_config::expand_home;

use super::catalog::InProcessDelegate;
use super::envelope::RawOutput;
use super::{ResolveError, TransportError, TransportKind};

#[async_trait]
pub trait DelegateTransport: Send + Sync {
    fn kind(&self) -> TransportKind;
    async fn call(&self, query: &str) -> Result<RawOutput, TransportError>;
}

/// Calls a linked-in delegate on its own task, bounded by a timeout
pub struct InProcessTransport {
    delegate: Arc<dyn InProcessDelegate>,
    timeout: Duration,
}

impl InProcessTransport {
    pub fn new(delegate: Arc<dyn InProcessDelegate>, timeout: Duration) -> Self {
        Self { delegate, timeout }
    }
}

#[async_trait]
impl DelegateTransport for InProcessTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::InProcess
    }

    async fn call(&self, query: &str) -> Result<RawOutput, TransportError> {
        let delegate = self.delegate.clone();
        let query = query.to_string();
        let mut handle = tokio::spawn(async move {
            delegate.query(&query).await.map_err(|e| e.to_string())
        });

        match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(Ok(Ok(raw))) => Ok(raw),
            Ok(Ok(Err(msg))) => Err(TransportError::Delegate(msg)),
            Ok(Err(join_err)) if join_err.is_panic() => {
                Err(TransportError::Panicked(panic_message(join_err.into_panic())))
            }
            Ok(Err(join_err)) => Err(TransportError::Delegate(join_err.to_string())),
            Err(_) => {
                handle.abort();
                Err(TransportError::Timeout(self.timeout))
            }
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs `<launcher argv> <query>` and reads one result from stdout
#[derive(Debug)]
pub struct SubprocessTransport {
    script: PathBuf,
    argv: Vec<String>,
    timeout: Duration,
}

impl SubprocessTransport {
    /// Check the launcher script and argv template.
    ///
    /// `{location}` in the template is replaced with the script path and
    /// `{query}` with the query; without a `{query}` placeholder the query is
    /// appended as the last argument.
    pub fn prepare(
        location: &str,
        template: &str,
        timeout: Duration,
    ) -> Result<Self, ResolveError> {
        let script = expand_home(location);
        if !script.is_file() {
            return Err(ResolveError::ScriptMissing(script));
        }

        let argv: Vec<String> = template.split_whitespace().map(str::to_string).collect();
        if argv.is_empty() {
            return Err(ResolveError::EmptyLauncher);
        }

        Ok(Self {
            script,
            argv,
            timeout,
        })
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    pub fn command_line(&self, query: &str) -> Vec<String> {
        let location = self.script.to_string_lossy();
        let mut has_query = false;
        let mut args: Vec<String> = self
            .argv
            .iter()
            .map(|arg| {
                has_query |= arg.contains("{query}");
                arg.replace("{location}", &location).replace("{query}", query)
            })
            .collect();
        if !has_query {
            args.push(query.to_string());
        }
        args
    }
}

fn drain<R>(pipe: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf).await {
                debug!("Pipe read failed: {}", e);
            }
        }
        buf
    })
}

/// SIGKILL the whole group led by `pid`
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pgid) = pid.and_then(|p| libc::pid_t::try_from(p).ok()) else {
        return;
    };
    // SAFETY: kill(2) with a negative pid only signals that process group.
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        debug!(
            "Process group {} not signalled: {}",
            pgid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

#[async_trait]
impl DelegateTransport for SubprocessTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Subprocess
    }

    async fn call(&self, query: &str) -> Result<RawOutput, TransportError> {
        let args = self.command_line(query);
        debug!("Launching agent: {:?}", args);

        let mut cmd = Command::new(&args[0]);
        cmd.args(&args[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout can take down everything it started.
        #[cfg(unix)]
        cmd.process_group(0);
        if let Some(dir) = self.script.parent().filter(|d| !d.as_os_str().is_empty()) {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(TransportError::Spawn)?;
        let pid = child.id();
        let mut stdout = drain(child.stdout.take());
        let mut stderr = drain(child.stderr.take());

        // One deadline for the exit and both pipes: a leftover background
        // process can hold the pipes open after the launcher exits.
        let finished = tokio::time::timeout(self.timeout, async {
            let status = child.wait().await?;
            let out = (&mut stdout).await.unwrap_or_default();
            let err = (&mut stderr).await.unwrap_or_default();
            Ok::<_, std::io::Error>((status, out, err))
        })
        .await;

        let (status, stdout, stderr) = match finished {
            Ok(Ok(done)) => done,
            Ok(Err(e)) => return Err(TransportError::Io(e)),
            Err(_) => {
                warn!(
                    "Agent process {:?} exceeded {:?}, killing",
                    self.script, self.timeout
                );
                kill_process_group(pid);
                if let Err(e) = child.kill().await {
                    debug!("Agent process already gone: {}", e);
                }
                stdout.abort();
                stderr.abort();
                return Err(TransportError::Timeout(self.timeout));
            }
        };

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        if !status.success() {
            return Err(TransportError::NonZeroExit {
                code: status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }
        if !stderr.trim().is_empty() {
            debug!("Agent stderr: {}", stderr.trim());
        }
        if stdout.trim().is_empty() {
            return Err(TransportError::EmptyOutput);
        }

        Ok(match serde_json::from_str::<Value>(stdout.trim()) {
            Ok(Value::Object(map)) => RawOutput::Structured(map),
            _ => RawOutput::Text(stdout),
        })
    }
}
