//! Realtime feed of messages appended to the shared chat.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::domain::message::ChatEntry;

/// Errors that can occur while registering a listener on the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSourceError {
    Unauthorized,
    Unavailable,
}

/// Keeps a child-added listener registered; dropping it detaches the listener.
pub struct ListenerRegistration {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerRegistration {
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }
}

impl std::fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

/// Source of child-added notifications for the message collection.
pub trait MessageFeed {
    /// Registers a listener that receives every record of the collection once,
    /// existing records first, in server order, until the registration is dropped.
    fn listen_child_added(
        &self,
        sink: Sender<ChatEntry>,
    ) -> Result<ListenerRegistration, FeedSourceError>;
}

impl<T: MessageFeed + ?Sized> MessageFeed for &T {
    fn listen_child_added(
        &self,
        sink: Sender<ChatEntry>,
    ) -> Result<ListenerRegistration, FeedSourceError> {
        (*self).listen_child_added(sink)
    }
}

/// A listener attached on behalf of one signed-in user.
///
/// Notifications still queued when the feed is dropped are discarded with it.
#[derive(Debug)]
pub struct ActiveFeed {
    owner_uid: String,
    receiver: Receiver<ChatEntry>,
    _registration: ListenerRegistration,
}

impl ActiveFeed {
    pub fn attach(feed: &dyn MessageFeed, owner_uid: &str) -> Result<Self, FeedSourceError> {
        let (sink, receiver) = mpsc::channel();
        let registration = feed.listen_child_added(sink)?;

        Ok(Self {
            owner_uid: owner_uid.to_owned(),
            receiver,
            _registration: registration,
        })
    }

    pub fn owner_uid(&self) -> &str {
        &self.owner_uid
    }

    /// Returns every notification received since the last call, in arrival order.
    pub fn drain(&self) -> Vec<ChatEntry> {
        self.receiver.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    };

    use super::*;
    use crate::domain::message::FriendlyMessage;

    #[derive(Default)]
    struct StubFeed {
        sink: Mutex<Option<Sender<ChatEntry>>>,
        detached: Arc<AtomicBool>,
    }

    impl StubFeed {
        fn emit(&self, key: &str) {
            let message = FriendlyMessage::text("Ada", key).expect("valid message");
            if let Some(sink) = self.sink.lock().expect("lock").as_ref() {
                let _ = sink.send(ChatEntry::new(key, message));
            }
        }
    }

    impl MessageFeed for StubFeed {
        fn listen_child_added(
            &self,
            sink: Sender<ChatEntry>,
        ) -> Result<ListenerRegistration, FeedSourceError> {
            *self.sink.lock().expect("lock") = Some(sink);
            let detached = Arc::clone(&self.detached);
            Ok(ListenerRegistration::new(move || {
                detached.store(true, Ordering::SeqCst)
            }))
        }
    }

    struct FailingFeed;

    impl MessageFeed for FailingFeed {
        fn listen_child_added(
            &self,
            _sink: Sender<ChatEntry>,
        ) -> Result<ListenerRegistration, FeedSourceError> {
            Err(FeedSourceError::Unauthorized)
        }
    }

    #[test]
    fn drains_notifications_in_arrival_order() {
        let feed = StubFeed::default();
        let active = ActiveFeed::attach(&feed, "uid-1").expect("attach should succeed");

        feed.emit("a");
        feed.emit("b");

        let keys: Vec<_> = active.drain().into_iter().map(|entry| entry.key).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(active.drain().is_empty());
        assert_eq!(active.owner_uid(), "uid-1");
    }

    #[test]
    fn dropping_the_feed_detaches_the_listener() {
        let feed = StubFeed::default();
        let active = ActiveFeed::attach(&feed, "uid-1").expect("attach should succeed");

        drop(active);

        assert!(feed.detached.load(Ordering::SeqCst));
    }

    #[test]
    fn propagates_registration_errors() {
        let result = ActiveFeed::attach(&FailingFeed, "uid-1");

        assert!(matches!(result, Err(FeedSourceError::Unauthorized)));
    }
}
