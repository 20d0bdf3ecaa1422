use anyhow::Context as _;
use serde_json::{Value, json};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt as _, AsyncReadExt as _, AsyncWriteExt as _, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

pub use r_bridge_test_support::{MockBackend, MockResponse, pick_unused_port};

/// A running bridge process driven over its stdio.
pub struct BridgeProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
    stderr: Option<ChildStderr>,
}

impl BridgeProcess {
    pub fn spawn(api_url: &str) -> anyhow::Result<Self> {
        let bin = env!("CARGO_BIN_EXE_r-mcp-bridge");
        let mut child = Command::new(bin)
            .arg("--api-url")
            .arg(api_url)
            .arg("--log-level")
            .arg("info")
            .arg("--log-format")
            .arg("json")
            .env_remove("RUST_LOG")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context("spawn r-mcp-bridge")?;

        let stdin = child.stdin.take().context("bridge stdin")?;
        let stdout = child.stdout.take().context("bridge stdout")?;
        let stderr = child.stderr.take();
        Ok(Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout).lines(),
            stderr,
        })
    }

    pub async fn send(&mut self, message: &Value) -> anyhow::Result<()> {
        let stdin = self.stdin.as_mut().context("stdin already closed")?;
        let mut line = message.to_string();
        line.push('\n');
        stdin.write_all(line.as_bytes()).await.context("write request")?;
        stdin.flush().await.context("flush request")?;
        Ok(())
    }

    pub async fn recv(&mut self) -> anyhow::Result<Value> {
        let line = tokio::time::timeout(Duration::from_secs(10), self.stdout.next_line())
            .await
            .context("timed out waiting for response")?
            .context("read response")?
            .context("bridge closed stdout")?;
        serde_json::from_str(&line).with_context(|| format!("parse response line: {line}"))
    }

    pub async fn request(&mut self, id: i64, method: &str, params: Value) -> anyhow::Result<Value> {
        self.send(&json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await?;
        let response = self.recv().await?;
        anyhow::ensure!(response["id"] == id, "unexpected response id: {response}");
        Ok(response)
    }

    pub async fn initialize(&mut self) -> anyhow::Result<Value> {
        let response = self
            .request(
                0,
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "integration-test", "version": "0"}
                }),
            )
            .await?;
        self.send(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await?;
        Ok(response)
    }

    /// Close stdin and wait for the process to exit on its own.
    pub async fn shutdown(mut self) -> anyhow::Result<std::process::ExitStatus> {
        drop(self.stdin.take());
        tokio::time::timeout(Duration::from_secs(10), self.child.wait())
            .await
            .context("bridge did not exit after stdin closed")?
            .context("wait for bridge")
    }
}

impl BridgeProcess {
    /// Send SIGTERM with stdin still open; returns the exit status and everything logged.
    #[cfg(unix)]
    pub async fn terminate(mut self) -> anyhow::Result<(std::process::ExitStatus, String)> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let pid = self.child.id().context("bridge already exited")?;
        kill(Pid::from_raw(i32::try_from(pid)?), Signal::SIGTERM).context("send SIGTERM")?;
        let status = tokio::time::timeout(Duration::from_secs(10), self.child.wait())
            .await
            .context("bridge did not exit after SIGTERM")?
            .context("wait for bridge")?;

        let mut logs = String::new();
        if let Some(mut stderr) = self.stderr.take() {
            stderr.read_to_string(&mut logs).await.context("read bridge stderr")?;
        }
        Ok((status, logs))
    }
}

pub fn structured(response: &Value) -> anyhow::Result<&Value> {
    response
        .get("result")
        .and_then(|r| r.get("structuredContent"))
        .with_context(|| format!("response has no structuredContent: {response}"))
}
