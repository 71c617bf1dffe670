//! Chat message model.
//!
//! A message carries either a text body or a photo URL, never both. The
//! invariant is held by [`MessageBody`]; every constructor normalizes blank
//! strings to "absent" before deciding which variant to build.

use thiserror::Error;

/// Author name used when the signed-in user has no usable display name.
pub const ANONYMOUS: &str = "anonymous";

/// Alphabet used by the backend to encode push keys (ASCII ordered).
const PUSH_KEY_CHARS: &str = "-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Number of leading push key characters that encode the creation time.
const PUSH_KEY_TIME_LEN: usize = 8;

/// Length of a push key generated by the backend.
const PUSH_KEY_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text(String),
    Photo(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("message must carry either text or a photo")]
    MissingContent,
    #[error("message cannot carry both text and a photo")]
    BothTextAndPhoto,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendlyMessage {
    author: String,
    body: MessageBody,
}

impl FriendlyMessage {
    /// Builds a text message. Fails when `text` is blank.
    pub fn text(author: impl Into<String>, text: impl Into<String>) -> Result<Self, MessageError> {
        Self::from_parts(author, Some(text.into()), None)
    }

    /// Builds a photo message pointing at an uploaded image. Fails when `url` is blank.
    pub fn photo(author: impl Into<String>, url: impl Into<String>) -> Result<Self, MessageError> {
        Self::from_parts(author, None, Some(url.into()))
    }

    /// Builds a message from loosely typed parts, as received from the store.
    pub fn from_parts(
        author: impl Into<String>,
        text: Option<String>,
        photo_url: Option<String>,
    ) -> Result<Self, MessageError> {
        let body = match (non_blank(text), non_blank(photo_url)) {
            (Some(text), None) => MessageBody::Text(text),
            (None, Some(url)) => MessageBody::Photo(url),
            (Some(_), Some(_)) => return Err(MessageError::BothTextAndPhoto),
            (None, None) => return Err(MessageError::MissingContent),
        };

        let author = author.into();
        let author = if author.trim().is_empty() {
            ANONYMOUS.to_owned()
        } else {
            author
        };

        Ok(Self { author, body })
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    pub fn text_body(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Text(text) => Some(text),
            MessageBody::Photo(_) => None,
        }
    }

    pub fn photo_url(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Text(_) => None,
            MessageBody::Photo(url) => Some(url),
        }
    }

    /// Returns the text body or the photo URL, whichever is present.
    pub fn content(&self) -> &str {
        match &self.body {
            MessageBody::Text(value) | MessageBody::Photo(value) => value,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// An observed copy of a remote record together with its server-assigned key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub key: String,
    pub message: FriendlyMessage,
}

impl ChatEntry {
    pub fn new(key: impl Into<String>, message: FriendlyMessage) -> Self {
        Self {
            key: key.into(),
            message,
        }
    }

    /// Decodes the creation time embedded in a push key, in unix milliseconds.
    ///
    /// Returns `None` for keys that were not produced by a push.
    pub fn sent_at_ms(&self) -> Option<i64> {
        decode_push_key_time(&self.key)
    }
}

fn decode_push_key_time(key: &str) -> Option<i64> {
    if key.len() != PUSH_KEY_LEN || !key.chars().all(|ch| PUSH_KEY_CHARS.contains(ch)) {
        return None;
    }

    key.chars()
        .take(PUSH_KEY_TIME_LEN)
        .try_fold(0i64, |acc, ch| {
            let digit = PUSH_KEY_CHARS.find(ch)? as i64;
            acc.checked_mul(64)?.checked_add(digit)
        })
}
