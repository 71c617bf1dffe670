//! Use case for posting a message to the shared chat.
//!
//! This module provides the `MessageStore` trait and the `send_text` /
//! `send_photo` functions that validate a message and push it to the store.

use crate::domain::message::{FriendlyMessage, MessageError};

/// Errors that can occur at the source level (remote store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSourceError {
    /// The store rejected the credentials of the current user.
    Unauthorized,
    /// The store refused the write (rules or payload).
    Rejected { code: String },
    /// Service is temporarily unavailable.
    Unavailable,
}

/// Domain-level errors for the send operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    /// Message text is empty after trimming whitespace.
    EmptyMessage,
    /// The message does not satisfy the text/photo invariant.
    InvalidMessage(MessageError),
    /// The current user may not write to the store.
    Unauthorized,
    /// The store refused the write.
    Rejected,
    /// Service is temporarily unavailable.
    TemporarilyUnavailable,
}

/// Appends records to the remote message collection.
pub trait MessageStore {
    /// Pushes a message and returns the key assigned by the server.
    ///
    /// # Errors
    /// Returns `StoreSourceError` if the record could not be written.
    fn push_message(&self, message: &FriendlyMessage) -> Result<String, StoreSourceError>;
}

impl<T: MessageStore + ?Sized> MessageStore for &T {
    fn push_message(&self, message: &FriendlyMessage) -> Result<String, StoreSourceError> {
        (*self).push_message(message)
    }
}

/// Sends a text message authored by `author`.
///
/// The text is trimmed; whitespace-only input is rejected before reaching the store.
pub fn send_text(
    store: &dyn MessageStore,
    author: &str,
    text: &str,
) -> Result<String, SendMessageError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SendMessageError::EmptyMessage);
    }

    let message = FriendlyMessage::text(author, text).map_err(SendMessageError::InvalidMessage)?;
    push(store, &message)
}

/// Sends a photo message referencing an already uploaded image.
pub fn send_photo(
    store: &dyn MessageStore,
    author: &str,
    photo_url: &str,
) -> Result<String, SendMessageError> {
    let message =
        FriendlyMessage::photo(author, photo_url).map_err(SendMessageError::InvalidMessage)?;
    push(store, &message)
}

fn push(store: &dyn MessageStore, message: &FriendlyMessage) -> Result<String, SendMessageError> {
    store.push_message(message).map_err(map_source_error)
}

fn map_source_error(error: StoreSourceError) -> SendMessageError {
    match error {
        StoreSourceError::Unauthorized => SendMessageError::Unauthorized,
        StoreSourceError::Rejected { .. } => SendMessageError::Rejected,
        StoreSourceError::Unavailable => SendMessageError::TemporarilyUnavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct StubStore {
        result: Result<String, StoreSourceError>,
        captured: RefCell<Vec<FriendlyMessage>>,
    }

    impl StubStore {
        fn with_result(result: Result<String, StoreSourceError>) -> Self {
            Self {
                result,
                captured: RefCell::new(Vec::new()),
            }
        }
    }

    impl MessageStore for StubStore {
        fn push_message(&self, message: &FriendlyMessage) -> Result<String, StoreSourceError> {
            self.captured.borrow_mut().push(message.clone());
            self.result.clone()
        }
    }

    #[test]
    fn rejects_whitespace_only_text() {
        let store = StubStore::with_result(Ok("k1".to_owned()));

        let result = send_text(&store, "Ada", "   \n\t  ");

        assert_eq!(result, Err(SendMessageError::EmptyMessage));
        assert!(store.captured.borrow().is_empty());
    }

    #[test]
    fn trims_text_and_keeps_author() {
        let store = StubStore::with_result(Ok("k1".to_owned()));

        let key = send_text(&store, "Ada", "  hello world  ").expect("send should succeed");

        assert_eq!(key, "k1");
        let captured = store.captured.borrow();
        assert_eq!(captured[0].text_body(), Some("hello world"));
        assert_eq!(captured[0].photo_url(), None);
        assert_eq!(captured[0].author(), "Ada");
    }

    #[test]
    fn photo_message_carries_only_the_url() {
        let store = StubStore::with_result(Ok("k2".to_owned()));

        send_photo(&store, "Ada", "https://example.com/cat.jpg").expect("send should succeed");

        let captured = store.captured.borrow();
        assert_eq!(captured[0].photo_url(), Some("https://example.com/cat.jpg"));
        assert_eq!(captured[0].text_body(), None);
    }

    #[test]
    fn rejects_blank_photo_url() {
        let store = StubStore::with_result(Ok("k2".to_owned()));

        assert_eq!(
            send_photo(&store, "Ada", ""),
            Err(SendMessageError::InvalidMessage(MessageError::MissingContent))
        );
    }

    #[test]
    fn maps_source_errors() {
        let cases = [
            (StoreSourceError::Unauthorized, SendMessageError::Unauthorized),
            (
                StoreSourceError::Rejected {
                    code: "PERMISSION_DENIED".to_owned(),
                },
                SendMessageError::Rejected,
            ),
            (
                StoreSourceError::Unavailable,
                SendMessageError::TemporarilyUnavailable,
            ),
        ];

        for (source, expected) in cases {
            let store = StubStore::with_result(Err(source));
            assert_eq!(send_text(&store, "Ada", "hi"), Err(expected));
        }
    }
}
