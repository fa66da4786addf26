// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `dms-core` binary as a subprocess and exercises it over
//! its Unix-domain newline-delimited-JSON socket.

use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::process::Command;

/// Resolve the path to the compiled `dms-core` binary.
pub fn dms_core_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("dms-core")
}

/// A running `dms-core` process, killed on drop.
pub struct DmsCoreProcess {
    child: Child,
    socket_path: PathBuf,
    _socket_dir: tempfile::TempDir,
}

impl DmsCoreProcess {
    /// Spawn `dms-core` bound to a fresh temporary socket, with a short
    /// coalescing window so burst-coalescing tests don't need to wait 200ms.
    pub async fn start() -> anyhow::Result<Self> {
        let binary = dms_core_binary();
        anyhow::ensure!(binary.exists(), "dms-core binary not found at {}", binary.display());

        let dir = tempfile::tempdir()?;
        let socket_path = dir.path().join("dms-core.sock");

        let child = Command::new(&binary)
            .args(["--socket", &socket_path.to_string_lossy(), "--coalesce-ms", "50"])
            .env("RUST_LOG", "warn")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let process = Self { child, socket_path, _socket_dir: dir };
        process.wait_for_socket(Duration::from_secs(5)).await?;
        Ok(process)
    }

    async fn wait_for_socket(&self, timeout: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.socket_path.exists() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        anyhow::bail!("dms-core did not create its socket within {timeout:?}")
    }

    /// Open a fresh connection to the daemon's socket.
    pub async fn connect(&self) -> anyhow::Result<RpcConnection> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(RpcConnection { reader: BufReader::new(read_half), writer: write_half })
    }

    /// Wait for the process to exit within `timeout`.
    pub async fn wait_exit(&mut self, timeout: Duration) -> anyhow::Result<std::process::ExitStatus> {
        Ok(tokio::time::timeout(timeout, self.child.wait()).await??)
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

/// One client connection to the daemon's JSON-RPC-over-socket interface.
pub struct RpcConnection {
    reader: BufReader<tokio::net::unix::OwnedReadHalf>,
    writer: tokio::net::unix::OwnedWriteHalf,
}

impl RpcConnection {
    /// Send a request line `{"id":<id>,"method":<method>,"params":<params>}`.
    pub async fn send(&mut self, id: i64, method: &str, params: serde_json::Value) -> anyhow::Result<()> {
        let line = serde_json::json!({"id": id, "method": method, "params": params});
        let mut bytes = serde_json::to_vec(&line)?;
        bytes.push(b'\n');
        self.writer.write_all(&bytes).await?;
        Ok(())
    }

    /// Read and parse one response/event line.
    pub async fn recv(&mut self) -> anyhow::Result<serde_json::Value> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        anyhow::ensure!(n > 0, "connection closed before a response arrived");
        Ok(serde_json::from_str(&line)?)
    }

    /// Read one response/event line within `timeout`.
    pub async fn recv_timeout(&mut self, timeout: Duration) -> anyhow::Result<serde_json::Value> {
        tokio::time::timeout(timeout, self.recv()).await?
    }
}

/// A minimal TCP server that answers every connection with an HTTP 401,
/// simulating an authentication-gated printer endpoint.
pub struct AuthChallengeServer {
    pub addr: std::net::SocketAddr,
    _handle: tokio::task::JoinHandle<()>,
}

impl AuthChallengeServer {
    pub async fn start() -> anyhow::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else { break };
                tokio::spawn(async move {
                    let mut reader = BufReader::new(&mut stream);
                    let mut line = String::new();
                    loop {
                        line.clear();
                        match reader.read_line(&mut line).await {
                            Ok(0) | Err(_) => return,
                            Ok(_) if line.trim().is_empty() => break,
                            Ok(_) => continue,
                        }
                    }
                    let response =
                        b"HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
                    let _ = stream.write_all(response).await;
                });
            }
        });

        Ok(Self { addr, _handle: handle })
    }
}
