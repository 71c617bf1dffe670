//! Realtime listener over the database's server-sent events stream.

use std::{
    collections::HashSet,
    sync::mpsc::Sender,
    time::Duration,
};

use futures_util::StreamExt;
use reqwest::{header::ACCEPT, Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tokio::{runtime::Runtime, sync::watch};

use super::{auth::TokenSource, FirebaseError};
use crate::{
    domain::message::{ChatEntry, FriendlyMessage},
    firebase::wire::MessageRecord,
    usecases::message_feed::ListenerRegistration,
};

const LISTENER_STARTED: &str = "FIREBASE_LISTENER_STARTED";
const LISTENER_STOPPED: &str = "FIREBASE_LISTENER_STOPPED";
const LISTENER_RECONNECTING: &str = "FIREBASE_LISTENER_RECONNECTING";
const LISTENER_RECORD_SKIPPED: &str = "FIREBASE_LISTENER_RECORD_SKIPPED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Incremental `text/event-stream` decoder fed with raw network chunks.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    /// Consumes a chunk and returns every event it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(end) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=end).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(event) = self.finish_event() {
                    events.push(event);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => self.event = Some(value.to_owned()),
                "data" => self.data.push(value.to_owned()),
                _ => {}
            }
        }

        events
    }

    fn finish_event(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        let data = std::mem::take(&mut self.data);
        if event.is_none() && data.is_empty() {
            return None;
        }

        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_owned()),
            data: data.join("\n"),
        })
    }
}

#[derive(Debug, Deserialize)]
struct StreamPayload {
    path: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, PartialEq, Eq)]
pub enum StreamAction {
    Children(Vec<ChatEntry>),
    Reconnect(&'static str),
    Idle,
}

/// Turns one stream event into child-added notifications.
///
/// Keys already in `seen` are dropped, so replays after a reconnect add nothing.
pub fn decode_event(event: &SseEvent, seen: &mut HashSet<String>) -> StreamAction {
    match event.event.as_str() {
        "put" | "patch" => {}
        "keep-alive" => return StreamAction::Idle,
        "cancel" => return StreamAction::Reconnect("cancel"),
        "auth_revoked" => return StreamAction::Reconnect("auth_revoked"),
        _ => return StreamAction::Idle,
    }

    let payload: StreamPayload = match serde_json::from_str(&event.data) {
        Ok(payload) => payload,
        Err(error) => {
            tracing::warn!(
                code = LISTENER_RECORD_SKIPPED,
                error = %error,
                "stream event payload is not valid json"
            );
            return StreamAction::Idle;
        }
    };

    let path = payload.path.trim_matches('/');
    let children: Vec<(String, Value)> = if path.is_empty() {
        match payload.data {
            Value::Object(map) => {
                let mut children: Vec<_> = map.into_iter().collect();
                children.sort_by(|(left, _), (right, _)| left.cmp(right));
                children
            }
            _ => Vec::new(),
        }
    } else if !path.contains('/') && !payload.data.is_null() {
        vec![(path.to_owned(), payload.data)]
    } else {
        Vec::new()
    };

    let mut entries = Vec::new();
    for (key, value) in children {
        if value.is_null() || seen.contains(&key) {
            continue;
        }
        seen.insert(key.clone());
        if let Some(entry) = decode_child(key, value) {
            entries.push(entry);
        }
    }

    StreamAction::Children(entries)
}

fn decode_child(key: String, value: Value) -> Option<ChatEntry> {
    let message = serde_json::from_value::<MessageRecord>(value)
        .map_err(|error| error.to_string())
        .and_then(|record| FriendlyMessage::try_from(record).map_err(|error| error.to_string()));

    match message {
        Ok(message) => Some(ChatEntry::new(key, message)),
        Err(reason) => {
            tracing::warn!(
                code = LISTENER_RECORD_SKIPPED,
                key = %key,
                reason = %reason,
                "skipping malformed message record"
            );
            None
        }
    }
}

pub(super) struct ListenerContext {
    pub client: Client,
    pub tokens: TokenSource,
    pub url: Url,
    pub reconnect_delay: Duration,
}

pub(super) fn spawn_listener(
    runtime: &Runtime,
    context: ListenerContext,
    sink: Sender<ChatEntry>,
) -> ListenerRegistration {
    let (stop_tx, stop_rx) = watch::channel(false);
    runtime.spawn(run_listener(context, sink, stop_rx));

    tracing::info!(code = LISTENER_STARTED, "message listener started");

    ListenerRegistration::new(move || {
        let _ = stop_tx.send(true);
    })
}

enum StreamEnd {
    SinkClosed,
    Reconnect(&'static str),
}

async fn run_listener(
    context: ListenerContext,
    sink: Sender<ChatEntry>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut seen = HashSet::new();

    loop {
        let end = tokio::select! {
            _ = stop_rx.wait_for(|stop| *stop) => StreamEnd::SinkClosed,
            end = stream_once(&context, &sink, &mut seen) => end,
        };

        match end {
            StreamEnd::SinkClosed => {
                tracing::info!(code = LISTENER_STOPPED, "message listener stopped");
                return;
            }
            StreamEnd::Reconnect(reason) => {
                tracing::info!(
                    code = LISTENER_RECONNECTING,
                    reason,
                    delay_ms = context.reconnect_delay.as_millis() as u64,
                    "message stream ended, reconnecting"
                );
            }
        }

        tokio::select! {
            _ = stop_rx.wait_for(|stop| *stop) => {
                tracing::info!(code = LISTENER_STOPPED, "message listener stopped");
                return;
            }
            _ = tokio::time::sleep(context.reconnect_delay) => {}
        }
    }
}

async fn stream_once(
    context: &ListenerContext,
    sink: &Sender<ChatEntry>,
    seen: &mut HashSet<String>,
) -> StreamEnd {
    let token = match context.tokens.id_token().await {
        Ok(token) => token,
        Err(FirebaseError::NotSignedIn) => return StreamEnd::Reconnect("signed_out"),
        Err(error) => {
            tracing::warn!(error = %error, "message stream could not obtain an id token");
            return StreamEnd::Reconnect("token");
        }
    };

    let mut url = context.url.clone();
    url.query_pairs_mut().append_pair("auth", &token);

    let response = match context
        .client
        .get(url)
        .header(ACCEPT, "text/event-stream")
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            tracing::warn!(
                status = response.status().as_u16(),
                "message stream request was refused"
            );
            return StreamEnd::Reconnect("status");
        }
        Err(error) => {
            tracing::warn!(error = %error.without_url(), "message stream request failed");
            return StreamEnd::Reconnect("transport");
        }
    };

    let mut parser = SseParser::default();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(error = %error.without_url(), "message stream read failed");
                return StreamEnd::Reconnect("read");
            }
        };

        for event in parser.push(&bytes) {
            match decode_event(&event, seen) {
                StreamAction::Children(entries) => {
                    for entry in entries {
                        if sink.send(entry).is_err() {
                            return StreamEnd::SinkClosed;
                        }
                    }
                }
                StreamAction::Reconnect(reason) => return StreamEnd::Reconnect(reason),
                StreamAction::Idle => {}
            }
        }
    }

    StreamEnd::Reconnect("closed")
}
