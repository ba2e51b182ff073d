use anyhow::Context as _;
use serde_json::{Value, json};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

pub fn server_command(spec: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_openapi-mcp-server"));
    cmd.arg("--spec")
        .arg(spec)
        .env_remove("BASE_URL")
        .env_remove("OPENAPI_MCP_HEADERS")
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    cmd
}

/// A spawned server spoken to with newline-delimited JSON-RPC.
pub struct McpStdioSession {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl McpStdioSession {
    pub async fn start(mut cmd: Command) -> anyhow::Result<Self> {
        let mut child = cmd.spawn().context("spawn openapi-mcp-server")?;
        let stdin = child.stdin.take().context("child stdin")?;
        let stdout = child.stdout.take().context("child stdout")?;
        let mut session = Self {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        let init = session
            .request(
                0,
                "initialize",
                json!({
                    "protocolVersion": "2025-03-26",
                    "capabilities": {},
                    "clientInfo": { "name": "stdio-test", "version": "0.0.0" }
                }),
            )
            .await?;
        anyhow::ensure!(init.get("result").is_some(), "initialize failed: {init}");
        session
            .send(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await?;
        Ok(session)
    }

    async fn send(&mut self, msg: &Value) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(msg)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Send a request and wait for the response with the same id.
    pub async fn request(&mut self, id: u64, method: &str, params: Value) -> anyhow::Result<Value> {
        self.send(&json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await?;

        tokio::time::timeout(Duration::from_secs(10), self.read_response(id))
            .await
            .context("timed out waiting for response")?
    }

    async fn read_response(&mut self, id: u64) -> anyhow::Result<Value> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .context("server closed stdout")?;
            let msg: Value = serde_json::from_str(&line)
                .with_context(|| format!("non-JSON line on stdout: {line}"))?;
            if msg.get("id") == Some(&json!(id)) {
                return Ok(msg);
            }
        }
    }
}

/// Text of the first content block of a `tools/call` response, parsed as JSON.
pub fn tool_call_body_json(msg: &Value) -> anyhow::Result<Value> {
    let text = msg
        .pointer("/result/content/0/text")
        .and_then(Value::as_str)
        .with_context(|| format!("tools/call response missing text content: {msg}"))?;
    serde_json::from_str(text).context("tool output is not JSON")
}
