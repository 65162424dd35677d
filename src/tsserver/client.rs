//! Client side of one tsserver connection.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Child;
use tokio::sync::Mutex;

use crate::config::TsServerSettings;
use crate::document::{ScriptKind, TextEdit};
use crate::error::{BridgeError, BridgeResult};
use crate::service::{ClassificationRequest, ClassificationResponse, ClassificationService};

use super::connection::{self, MessageReader};
use super::protocol::{
    self, ChangeArgs, ClassificationArgs, FileArgs, OpenArgs, Request, Response,
};
use super::reader::{ReaderTaskHandle, spawn_reader_task};
use super::router::ResponseRouter;

type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Removes a registered request from the router if its waiter goes away
/// before a response arrives (for example when the request is cancelled).
struct PendingRequest<'a> {
    router: &'a ResponseRouter,
    seq: u64,
}

impl Drop for PendingRequest<'_> {
    fn drop(&mut self) {
        self.router.remove(self.seq);
    }
}

pub struct TsServerClient {
    writer: Mutex<Writer>,
    router: Arc<ResponseRouter>,
    next_seq: AtomicU64,
    reader: ReaderTaskHandle,
    child: Mutex<Option<Child>>,
}

impl std::fmt::Debug for TsServerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsServerClient")
            .field("next_seq", &self.next_seq.load(Ordering::SeqCst))
            .field("pending", &self.router.pending_count())
            .finish()
    }
}

impl TsServerClient {
    /// Spawn tsserver as configured and start reading its output.
    pub fn spawn(settings: &TsServerSettings) -> BridgeResult<Self> {
        let process = connection::spawn(&settings.command, &settings.args)?;
        debug!(
            target: "ts_semantic_ls::tsserver::client",
            "Spawned tsserver: {:?} {:?}",
            settings.command,
            settings.args
        );

        let mut client = Self::from_streams(process.stdin, process.stdout);
        client.child = Mutex::new(Some(process.child));
        Ok(client)
    }

    /// Build a client over arbitrary streams.
    pub fn from_streams<W, R>(writer: W, reader: R) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
        R: AsyncRead + Send + Unpin + 'static,
    {
        let router = Arc::new(ResponseRouter::new());
        let reader = spawn_reader_task(MessageReader::new(reader), Arc::clone(&router));

        Self {
            writer: Mutex::new(Box::new(writer)),
            router,
            next_seq: AtomicU64::new(1),
            reader,
            child: Mutex::new(None),
        }
    }

    /// Whether the reader has stopped; no further responses will arrive.
    pub fn is_closed(&self) -> bool {
        self.router.is_closed() || self.reader.is_finished()
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    async fn send(&self, request: &Request) -> BridgeResult<()> {
        let mut writer = self.writer.lock().await;
        connection::write_request(&mut *writer, request).await
    }

    /// Send a command tsserver does not answer.
    async fn notify<A: Serialize>(
        &self,
        command: &'static str,
        arguments: Option<A>,
    ) -> BridgeResult<()> {
        let arguments = arguments.map(serde_json::to_value).transpose()?;
        self.send(&Request::new(self.next_seq(), command, arguments))
            .await
    }

    /// Send a request and wait for its response.
    ///
    /// Fails with [`BridgeError::ServerExited`] without writing anything
    /// once the reader has stopped.
    pub async fn request<A: Serialize>(
        &self,
        command: &'static str,
        arguments: A,
    ) -> BridgeResult<Response> {
        if self.is_closed() {
            return Err(BridgeError::server_exited("tsserver connection closed"));
        }

        let seq = self.next_seq();
        let request = Request::new(seq, command, Some(serde_json::to_value(arguments)?));

        let rx = self.router.register(seq)?;
        let _pending = PendingRequest {
            router: &self.router,
            seq,
        };

        self.send(&request).await?;
        rx.await
            .map_err(|_| BridgeError::server_exited("response channel closed"))
    }

    pub async fn open(
        &self,
        file: &Path,
        content: &str,
        script_kind: Option<ScriptKind>,
    ) -> BridgeResult<()> {
        let file = file.to_string_lossy();
        self.notify(
            protocol::OPEN,
            Some(OpenArgs {
                file: &file,
                file_content: content,
                script_kind_name: script_kind.map(ScriptKind::as_tsserver_name),
            }),
        )
        .await
    }

    /// Forward edits in the order they were applied.
    ///
    /// Ranges are zero-based LSP positions; tsserver expects one-based lines
    /// and offsets.
    pub async fn change(&self, file: &Path, edits: &[TextEdit]) -> BridgeResult<()> {
        let file = file.to_string_lossy();
        for edit in edits {
            self.notify(
                protocol::CHANGE,
                Some(ChangeArgs {
                    file: &file,
                    line: edit.range.start.line + 1,
                    offset: edit.range.start.character + 1,
                    end_line: edit.range.end.line + 1,
                    end_offset: edit.range.end.character + 1,
                    insert_string: &edit.new_text,
                }),
            )
            .await?;
        }
        Ok(())
    }

    pub async fn close(&self, file: &Path) -> BridgeResult<()> {
        let file = file.to_string_lossy();
        self.notify(protocol::CLOSE, Some(FileArgs { file: &file }))
            .await
    }

    /// Ask tsserver to exit and reap the process.
    pub async fn exit(&self) -> BridgeResult<()> {
        let result = self.notify::<()>(protocol::EXIT, None).await;

        if let Some(mut child) = self.child.lock().await.take() {
            match tokio::time::timeout(std::time::Duration::from_secs(2), child.wait()).await {
                Ok(Ok(status)) => debug!(
                    target: "ts_semantic_ls::tsserver::client",
                    "tsserver exited with {}",
                    status
                ),
                _ => {
                    warn!(
                        target: "ts_semantic_ls::tsserver::client",
                        "tsserver did not exit, killing it"
                    );
                    child.kill().await?;
                }
            }
        }
        result
    }
}

impl ClassificationService for TsServerClient {
    async fn classify(&self, request: ClassificationRequest) -> Option<ClassificationResponse> {
        let file = request.file.to_string_lossy();
        let args = ClassificationArgs {
            file: &file,
            start: request.start,
            length: request.length,
            format: request.format,
        };

        let response = match self
            .request(protocol::ENCODED_SEMANTIC_CLASSIFICATIONS_FULL, args)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    target: "ts_semantic_ls::tsserver::client",
                    "Classification request failed: {}",
                    e
                );
                return None;
            }
        };

        if !response.success {
            debug!(
                target: "ts_semantic_ls::tsserver::client",
                "Classification for {} failed: {}",
                file,
                response.message.as_deref().unwrap_or("no message")
            );
            return None;
        }

        let body = response.into_body()?;
        match serde_json::from_value(body) {
            Ok(classifications) => Some(classifications),
            Err(e) => {
                warn!(
                    target: "ts_semantic_ls::tsserver::client",
                    "Malformed classification body: {}",
                    e
                );
                None
            }
        }
    }
}
