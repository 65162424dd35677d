//! Background task reading tsserver's stdout.
//!
//! Responses are routed to their waiters, events are logged and dropped. A
//! frame whose body is not JSON is skipped. On EOF or a read error every
//! pending request is failed and the task exits.

use std::sync::Arc;

use log::{debug, trace, warn};
use tokio::io::AsyncRead;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::BridgeError;

use super::connection::MessageReader;
use super::protocol::Message;
use super::router::ResponseRouter;

/// Handle to a running reader task. Dropping it stops the task.
pub struct ReaderTaskHandle {
    join_handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl ReaderTaskHandle {
    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }
}

impl Drop for ReaderTaskHandle {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

pub fn spawn_reader_task<R>(
    reader: MessageReader<R>,
    router: Arc<ResponseRouter>,
) -> ReaderTaskHandle
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let cancel_token = CancellationToken::new();
    let join_handle = tokio::spawn(reader_loop(reader, router, cancel_token.clone()));

    ReaderTaskHandle {
        join_handle,
        cancel_token,
    }
}

async fn reader_loop<R>(
    mut reader: MessageReader<R>,
    router: Arc<ResponseRouter>,
    cancel_token: CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                debug!(
                    target: "ts_semantic_ls::tsserver::reader",
                    "Reader task cancelled, shutting down"
                );
                router.fail_all("tsserver connection closed");
                break;
            }

            result = reader.read_message() => {
                match result {
                    Ok(message) => handle_message(message, &router),
                    // The whole body was consumed, so framing is intact
                    Err(BridgeError::Json(e)) => {
                        warn!(
                            target: "ts_semantic_ls::tsserver::reader",
                            "Skipping frame with invalid JSON body: {}",
                            e
                        );
                    }
                    Err(e) => {
                        warn!(
                            target: "ts_semantic_ls::tsserver::reader",
                            "Reader error: {}, failing pending requests",
                            e
                        );
                        router.fail_all(&format!("tsserver reader error: {e}"));
                        break;
                    }
                }
            }
        }
    }
}

fn handle_message(message: serde_json::Value, router: &ResponseRouter) {
    match serde_json::from_value::<Message>(message) {
        Ok(Message::Response(response)) => {
            let seq = response.request_seq;
            if !router.route(response) {
                debug!(
                    target: "ts_semantic_ls::tsserver::reader",
                    "Response for unknown request {}, dropping",
                    seq
                );
            }
        }
        Ok(Message::Event(event)) => {
            trace!(
                target: "ts_semantic_ls::tsserver::reader",
                "Received event: {}, skipping",
                event.event
            );
        }
        Ok(Message::Other) => {}
        Err(e) => {
            warn!(
                target: "ts_semantic_ls::tsserver::reader",
                "Unparseable message from tsserver: {}",
                e
            );
        }
    }
}
