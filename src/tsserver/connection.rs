//! Process spawning and message framing for tsserver.
//!
//! Requests are written as a single JSON line. tsserver answers with
//! `Content-Length: N\r\n\r\n{json}` frames on stdout.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::error::{BridgeError, BridgeResult};

use super::protocol::Request;

/// A running tsserver process with its pipes split out
pub struct TsServerProcess {
    pub child: Child,
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
}

/// Spawn `command[0]` with `command[1..]` followed by `args`.
pub fn spawn(command: &[String], args: &[String]) -> BridgeResult<TsServerProcess> {
    let (program, rest) = command
        .split_first()
        .ok_or_else(|| BridgeError::config("tsserver command is empty"))?;

    let mut child = Command::new(program)
        .args(rest)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| BridgeError::Spawn {
            command: program.clone(),
            source,
        })?;

    let stdin = child.stdin.take().ok_or_else(|| BridgeError::MissingPipe {
        command: program.clone(),
        stream: "stdin",
    })?;
    let stdout = child.stdout.take().ok_or_else(|| BridgeError::MissingPipe {
        command: program.clone(),
        stream: "stdout",
    })?;

    Ok(TsServerProcess {
        child,
        stdin,
        stdout,
    })
}

/// Write one request as a newline-terminated JSON line.
pub async fn write_request<W>(writer: &mut W, request: &Request) -> BridgeResult<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut line = serde_json::to_vec(request)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

/// Reader for Content-Length framed messages
pub struct MessageReader<R> {
    inner: BufReader<R>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
        }
    }

    /// Read the next message.
    ///
    /// Fails with [`BridgeError::ServerExited`] on EOF before a header. A
    /// body that is not JSON fails with [`BridgeError::Json`] after the
    /// frame has been consumed, so the next call starts at a frame boundary.
    pub async fn read_message(&mut self) -> BridgeResult<serde_json::Value> {
        let mut content_length = None;
        let mut saw_header = false;
        let mut line = String::new();

        loop {
            line.clear();
            let read = self.inner.read_line(&mut line).await?;
            if read == 0 {
                return Err(BridgeError::server_exited("end of stream"));
            }

            let header = line.trim_end_matches(['\r', '\n']);
            if header.is_empty() {
                if saw_header {
                    break;
                }
                // Blank lines between frames
                continue;
            }
            saw_header = true;

            let Some((name, value)) = header.split_once(':') else {
                return Err(BridgeError::protocol(format!(
                    "Malformed header line: {header:?}"
                )));
            };
            if name.trim().eq_ignore_ascii_case("content-length") {
                let length = value.trim().parse::<usize>().map_err(|e| {
                    BridgeError::protocol(format!("Invalid Content-Length value: {e}"))
                })?;
                content_length = Some(length);
            }
        }

        let length = content_length
            .ok_or_else(|| BridgeError::protocol("Missing Content-Length header"))?;

        let mut body = vec![0u8; length];
        self.inner.read_exact(&mut body).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
