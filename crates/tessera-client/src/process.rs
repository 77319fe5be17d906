//! Renderer subprocess: spawn, read the handshake, shut down.

use std::io::ErrorKind;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tessera_protocol::Handshake;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, info, warn};

use crate::ClientError;

/// Grace period between the `shutdown` line and a forced kill.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub struct RendererProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    handshake: Handshake,
}

impl RendererProcess {
    /// Start `program` and wait up to `handshake_timeout` for its first
    /// stdout line. Any failure kills the child.
    pub async fn spawn(
        program: impl AsRef<Path>,
        args: &[String],
        handshake_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let program = program.as_ref();
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(ClientError::Spawn)?;
        info!(program = %program.display(), pid = ?child.id(), "renderer spawned");

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill().await;
            return Err(ClientError::Connection("renderer stdout unavailable".into()));
        };
        let mut lines = BufReader::new(stdout).lines();

        let line = match tokio::time::timeout(handshake_timeout, lines.next_line()).await {
            Ok(Ok(Some(line))) => line,
            Ok(Ok(None)) => {
                let status = child.wait().await.ok();
                return Err(ClientError::Connection(format!(
                    "renderer exited before handshake ({})",
                    describe(status)
                )));
            }
            Ok(Err(e)) => {
                let _ = child.kill().await;
                return Err(ClientError::Connection(format!("reading handshake: {e}")));
            }
            Err(_) => {
                let _ = child.kill().await;
                return Err(ClientError::HandshakeTimeout(handshake_timeout));
            }
        };

        let handshake = match Handshake::parse_line(&line) {
            Ok(hs) => hs,
            Err(e) => {
                let _ = child.kill().await;
                return Err(e.into());
            }
        };
        debug!(protocol = ?handshake.protocol, "handshake received");

        tokio::spawn(async move {
            while let Ok(Some(extra)) = lines.next_line().await {
                debug!(line = %extra, "unexpected renderer stdout");
            }
        });

        let stdin = child.stdin.take();
        Ok(Self {
            child,
            stdin,
            handshake,
        })
    }

    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Exit status if the renderer has already exited.
    pub fn try_status(&mut self) -> Option<ExitStatus> {
        self.child.try_wait().ok().flatten()
    }

    /// Ask the renderer to exit, then force it. A peer that is already gone
    /// (broken pipe) is not an error. Non-zero or signaled exits are logged.
    pub async fn shutdown(mut self) -> Option<ExitStatus> {
        if let Some(mut stdin) = self.stdin.take() {
            match stdin.write_all(b"shutdown\n").await {
                Ok(()) => {
                    let _ = stdin.flush().await;
                }
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!("renderer stdin already closed");
                }
                Err(e) => warn!(error = %e, "could not signal renderer shutdown"),
            }
        }

        let status = match tokio::time::timeout(SHUTDOWN_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => Some(status),
            Ok(Err(e)) => {
                warn!(error = %e, "waiting for renderer failed");
                None
            }
            Err(_) => {
                warn!("renderer ignored shutdown, killing");
                if let Err(e) = self.child.kill().await {
                    warn!(error = %e, "kill failed");
                }
                self.child.wait().await.ok()
            }
        };

        match status {
            Some(s) if s.success() => info!("renderer exited cleanly"),
            other => warn!(status = %describe(other), "renderer exited abnormally"),
        }
        status
    }
}

fn describe(status: Option<ExitStatus>) -> String {
    match status {
        Some(s) => s.to_string(),
        None => "unknown status".to_string(),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tessera_protocol::Endpoint;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    const HANDSHAKE: &str = r#"{"protocol":"ws-tcp","port":4711,"token":"abc"}"#;

    #[tokio::test]
    async fn reads_handshake_and_shuts_down_cleanly() {
        let script = format!("echo '{HANDSHAKE}'; read cmd; [ \"$cmd\" = shutdown ] && exit 0; exit 9");
        let process = RendererProcess::spawn("sh", &sh(&script), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(process.handshake().endpoint().unwrap(), Endpoint::Tcp(4711));
        assert_eq!(process.handshake().token, "abc");

        let status = process.shutdown().await.unwrap();
        assert!(status.success());
    }

    #[tokio::test]
    async fn silent_renderer_times_out() {
        let err = RendererProcess::spawn("sh", &sh("sleep 5"), Duration::from_millis(200))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ClientError::HandshakeTimeout(_)));
        assert!(err.is_connection_error());
    }

    #[tokio::test]
    async fn malformed_handshake_is_a_connection_error() {
        let err = RendererProcess::spawn("sh", &sh("echo booting; sleep 5"), Duration::from_secs(5))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ClientError::Handshake(_)));
    }

    #[tokio::test]
    async fn early_exit_is_a_connection_error() {
        let err = RendererProcess::spawn("sh", &sh("exit 3"), Duration::from_secs(5))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ClientError::Connection(_)));
    }

    #[tokio::test]
    async fn shutdown_tolerates_exited_renderer() {
        let script = format!("echo '{HANDSHAKE}'; exit 4");
        let process = RendererProcess::spawn("sh", &sh(&script), Duration::from_secs(5))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let status = process.shutdown().await.unwrap();
        assert_eq!(status.code(), Some(4));
    }

    #[tokio::test]
    async fn stubborn_renderer_is_killed() {
        let script = format!("trap '' TERM; echo '{HANDSHAKE}'; exec sleep 30 < /dev/null");
        let process = RendererProcess::spawn("sh", &sh(&script), Duration::from_secs(5))
            .await
            .unwrap();
        let status = process.shutdown().await.unwrap();
        assert!(!status.success());
    }

    #[tokio::test]
    async fn missing_binary_fails_to_spawn() {
        let err = RendererProcess::spawn(
            "/nonexistent/tessera-renderer",
            &[],
            Duration::from_secs(1),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, ClientError::Spawn(_)));
    }
}
