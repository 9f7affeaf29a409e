// Command transport - hands each message to an external program
// reason: tokio::process for async child management, kill_on_drop for timeouts
use async_trait::async_trait;
use serde::Serialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use sendq_core::domain::{Destination, MessagePayload};
use sendq_core::port::{Transport, TransportError};

/// Longest stderr excerpt carried into a failure reason
const MAX_REASON_CHARS: usize = 300;

/// JSON document written to the child's stdin
#[derive(Serialize)]
struct CommandEnvelope<'a> {
    destination: &'a str,
    content: &'a str,
    tts: bool,
}

/// Spawns `program args...` per message, writes the message as JSON to stdin.
/// Exit status 0 is success; anything else fails the attempt with stderr as reason.
pub struct CommandTransport {
    program: String,
    args: Vec<String>,
    env_allowlist: Vec<String>,
    timeout_ms: u64,
}

impl CommandTransport {
    /// Create a new command transport
    ///
    /// # Arguments
    /// * `program` - Executable to spawn
    /// * `args` - Fixed arguments
    /// * `env_allowlist` - Environment variables passed through to the child
    /// * `timeout_ms` - Child is killed after this long
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        env_allowlist: Vec<String>,
        timeout_ms: u64,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            env_allowlist,
            timeout_ms,
        }
    }

    /// Process environment filtered to the allowlist
    fn filtered_env(&self) -> Vec<(String, String)> {
        std::env::vars()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .collect()
    }

    async fn run_child(&self, stdin_doc: Vec<u8>) -> Result<std::process::Output, TransportError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env_clear()
            .envs(self.filtered_env())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TransportError::Connection(format!("spawn {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A child that exits without reading stdin is judged by its exit status.
            if let Err(e) = stdin.write_all(&stdin_doc).await {
                debug!(error = %e, "Child closed stdin early");
            }
        }

        match timeout(Duration::from_millis(self.timeout_ms), child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(TransportError::Connection(e.to_string())),
            Err(_) => {
                warn!(program = %self.program, timeout_ms = self.timeout_ms, "Send command timed out, killed");
                Err(TransportError::Timeout(self.timeout_ms))
            }
        }
    }
}

fn failure_reason(output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    let status = match output.status.code() {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    };

    if stderr.is_empty() {
        status
    } else {
        let excerpt: String = stderr.chars().take(MAX_REASON_CHARS).collect();
        format!("{}: {}", status, excerpt)
    }
}

#[async_trait]
impl Transport for CommandTransport {
    async fn send(
        &self,
        destination: &Destination,
        payload: &MessagePayload,
    ) -> Result<(), TransportError> {
        let doc = serde_json::to_vec(&CommandEnvelope {
            destination: destination.as_str(),
            content: &payload.content,
            tts: payload.tts,
        })
        .map_err(|e| TransportError::InvalidPayload(e.to_string()))?;

        info!(program = %self.program, destination = %destination, "Running send command");
        let output = self.run_child(doc).await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(TransportError::Rejected(failure_reason(&output)))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, timeout_ms: u64) -> CommandTransport {
        CommandTransport::new(
            "/bin/sh",
            vec!["-c".to_string(), script.to_string()],
            vec!["PATH".to_string()],
            timeout_ms,
        )
    }

    fn send_args() -> (Destination, MessagePayload) {
        (Destination::new("general"), MessagePayload::text("hi there"))
    }

    #[tokio::test]
    async fn test_exit_zero_is_success() {
        let (dest, payload) = send_args();
        let transport = sh("cat > /dev/null", 5_000);
        assert_eq!(transport.send(&dest, &payload).await, Ok(()));
    }

    #[tokio::test]
    async fn test_child_receives_json_on_stdin() {
        let (dest, payload) = send_args();
        let transport = sh(
            r#"grep -q '"destination":"general"' && exit 0 || exit 9"#,
            5_000,
        );
        assert_eq!(transport.send(&dest, &payload).await, Ok(()));
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let (dest, payload) = send_args();
        let transport = sh("cat > /dev/null; echo 'channel locked' >&2; exit 3", 5_000);

        match transport.send(&dest, &payload).await {
            Err(TransportError::Rejected(reason)) => {
                assert!(reason.contains("exit status 3"));
                assert!(reason.contains("channel locked"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_command_times_out() {
        let (dest, payload) = send_args();
        let transport = sh("sleep 10", 100);
        assert_eq!(
            transport.send(&dest, &payload).await,
            Err(TransportError::Timeout(100))
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_connection_error() {
        let (dest, payload) = send_args();
        let transport = CommandTransport::new("/nonexistent/sendq-hook", vec![], vec![], 1_000);
        assert!(matches!(
            transport.send(&dest, &payload).await,
            Err(TransportError::Connection(_))
        ));
    }

    #[test]
    fn test_env_filtering() {
        std::env::set_var("SENDQ_TEST_ALLOWED", "1");
        std::env::set_var("SENDQ_TEST_BLOCKED", "2");
        let transport = CommandTransport::new(
            "true",
            vec![],
            vec!["SENDQ_TEST_ALLOWED".to_string()],
            1_000,
        );

        let env = transport.filtered_env();
        assert_eq!(env, vec![("SENDQ_TEST_ALLOWED".to_string(), "1".to_string())]);
    }
}
