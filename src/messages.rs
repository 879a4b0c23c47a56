use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use crate::error::MessageError;
use crate::store::{SelectionStore, SELECTED_JSON_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// The selection last captured through the context menu.
    GetSelectedJson,
    /// Whatever is selected on the active page right now.
    GetSelection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<String>,
}

impl Response {
    fn json(json: String) -> Self {
        Self { success: true, json: Some(json), selection: None }
    }

    fn selection(selection: String) -> Self {
        Self { success: true, json: None, selection: Some(selection) }
    }

    fn failure() -> Self {
        Self { success: false, json: None, selection: None }
    }
}

pub fn decode_request(raw: &str) -> Result<Request, MessageError> {
    Ok(serde_json::from_str(raw)?)
}

pub fn encode_response(response: &Response) -> Result<String, MessageError> {
    Ok(serde_json::to_string(response)?)
}

/// The page-side view of the current text selection.
pub trait SelectionSource: Send + Sync {
    fn current_selection(&self) -> String;
}

/// A fixed selection, for hosts without a live page.
#[derive(Debug, Clone, Default)]
pub struct StaticSelection(pub String);

impl SelectionSource for StaticSelection {
    fn current_selection(&self) -> String {
        self.0.clone()
    }
}

/// Answers requests from the store and the selection source.
#[derive(Clone)]
pub struct Responder {
    store: Arc<dyn SelectionStore>,
    source: Arc<dyn SelectionSource>,
}

impl Responder {
    pub fn new(store: Arc<dyn SelectionStore>, source: Arc<dyn SelectionSource>) -> Self {
        Self { store, source }
    }

    pub fn handle(&self, request: Request) -> Response {
        match request {
            Request::GetSelectedJson => match self.store.get(SELECTED_JSON_KEY) {
                Ok(value) => Response::json(value.unwrap_or_default()),
                Err(e) => {
                    error!(error = %e, "failed to read stored selection");
                    Response::failure()
                }
            },
            Request::GetSelection => Response::selection(self.source.current_selection()),
        }
    }
}

type Envelope = (Request, oneshot::Sender<Response>);

/// Sending half: issues a request and suspends until its reply arrives.
#[derive(Clone)]
pub struct Messenger {
    tx: mpsc::Sender<Envelope>,
}

/// Receiving half, drained by [`Inbox::serve`].
pub struct Inbox {
    rx: mpsc::Receiver<Envelope>,
}

pub fn channel(capacity: usize) -> (Messenger, Inbox) {
    let (tx, rx) = mpsc::channel(capacity);
    (Messenger { tx }, Inbox { rx })
}

impl Messenger {
    pub async fn request(&self, request: Request) -> Result<Response, MessageError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((request, reply_tx))
            .await
            .map_err(|_| MessageError::Disconnected)?;
        reply_rx.await.map_err(|_| MessageError::Dropped)
    }
}

impl Inbox {
    /// Answers requests one at a time until every messenger is dropped.
    pub async fn serve(mut self, responder: Responder) {
        while let Some((request, reply)) = self.rx.recv().await {
            debug!(?request, "handling message");
            let worker = responder.clone();
            let response = match tokio::task::spawn_blocking(move || worker.handle(request)).await {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, "message handler panicked");
                    Response::failure()
                }
            };
            // the requester may have given up
            let _ = reply.send(response);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn responder(store: Arc<dyn SelectionStore>) -> Responder {
        Responder::new(store, Arc::new(StaticSelection("{\"sel\":true}".into())))
    }

    #[test]
    fn wire_format_uses_tagged_types() {
        assert_eq!(decode_request(r#"{"type":"GET_SELECTED_JSON"}"#).unwrap(), Request::GetSelectedJson);
        assert_eq!(decode_request(r#"{"type":"GET_SELECTION"}"#).unwrap(), Request::GetSelection);
        assert!(decode_request(r#"{"type":"NOPE"}"#).is_err());

        let encoded = encode_response(&Response::json("[]".into())).unwrap();
        assert_eq!(encoded, r#"{"success":true,"json":"[]"}"#);
    }

    #[test]
    fn missing_selection_answers_empty_string() {
        let response = responder(Arc::new(MemoryStore::new())).handle(Request::GetSelectedJson);
        assert_eq!(response, Response::json(String::new()));
    }

    #[tokio::test]
    async fn request_round_trip_through_the_inbox() {
        let store: Arc<dyn SelectionStore> = Arc::new(MemoryStore::new());
        store.set(SELECTED_JSON_KEY, "[1,2]").unwrap();
        let (messenger, inbox) = channel(4);
        let server = tokio::spawn(inbox.serve(responder(store)));

        let reply = messenger.request(Request::GetSelectedJson).await.unwrap();
        assert_eq!(reply.json.as_deref(), Some("[1,2]"));
        let reply = messenger.request(Request::GetSelection).await.unwrap();
        assert!(reply.success);
        assert_eq!(reply.selection.as_deref(), Some("{\"sel\":true}"));

        drop(messenger);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn request_without_inbox_is_disconnected() {
        let (messenger, inbox) = channel(1);
        drop(inbox);
        assert!(matches!(
            messenger.request(Request::GetSelection).await,
            Err(MessageError::Disconnected)
        ));
    }
}
