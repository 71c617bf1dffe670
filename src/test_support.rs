use std::{
    path::Path,
    sync::{mpsc::Sender, Arc, Mutex, MutexGuard},
};

use crate::{
    domain::{
        message::{ChatEntry, FriendlyMessage},
        user::AuthUser,
    },
    usecases::{
        message_feed::{FeedSourceError, ListenerRegistration, MessageFeed},
        send_message::{MessageStore, StoreSourceError},
        sign_in::{AuthBackendError, AuthGateway, SignInCredentials},
        upload_photo::{PhotoStorage, StorageSourceError},
    },
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().expect("env lock should not be poisoned")
}

pub fn user(uid: &str, display_name: &str) -> AuthUser {
    AuthUser {
        uid: uid.to_owned(),
        email: Some(format!("{uid}@example.com")),
        display_name: Some(display_name.to_owned()),
    }
}

#[derive(Default)]
struct MemoryState {
    user: Option<AuthUser>,
    records: Vec<ChatEntry>,
    sinks: Vec<(u64, Sender<ChatEntry>)>,
    next_sink_id: u64,
    subscribe_count: usize,
    push_error: Option<StoreSourceError>,
    upload_error: Option<StorageSourceError>,
    uploaded_names: Vec<String>,
}

impl MemoryState {
    fn append(&mut self, message: FriendlyMessage) -> String {
        let key = format!("key-{:04}", self.records.len());
        let entry = ChatEntry::new(key.clone(), message);
        self.records.push(entry.clone());
        self.sinks
            .retain(|(_, sink)| sink.send(entry.clone()).is_ok());
        key
    }
}

/// In-process stand-in for the whole backend platform.
///
/// Clones share one store, so a test can keep a handle to play "another client".
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn signed_in(user: AuthUser) -> Self {
        let backend = Self::default();
        backend.set_user(Some(user));
        backend
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().expect("memory backend lock should not be poisoned")
    }

    pub fn set_user(&self, user: Option<AuthUser>) {
        self.lock().user = user;
    }

    /// A message written by some other client.
    pub fn remote_write(&self, author: &str, text: &str) -> String {
        let message = FriendlyMessage::text(author, text).expect("valid message");
        self.lock().append(message)
    }

    pub fn records(&self) -> Vec<ChatEntry> {
        self.lock().records.clone()
    }

    pub fn active_listeners(&self) -> usize {
        self.lock().sinks.len()
    }

    pub fn subscribe_count(&self) -> usize {
        self.lock().subscribe_count
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.lock().uploaded_names.clone()
    }

    pub fn fail_pushes(&self, error: StoreSourceError) {
        self.lock().push_error = Some(error);
    }

    pub fn fail_uploads(&self, error: StorageSourceError) {
        self.lock().upload_error = Some(error);
    }
}

impl AuthGateway for MemoryBackend {
    fn current_user(&self) -> Option<AuthUser> {
        self.lock().user.clone()
    }

    fn sign_in(&self, credentials: &SignInCredentials) -> Result<AuthUser, AuthBackendError> {
        let signed_in = match credentials {
            SignInCredentials::EmailPassword { email, .. } => AuthUser {
                uid: format!("uid-{email}"),
                email: Some(email.clone()),
                display_name: None,
            },
            SignInCredentials::NewAccount {
                email,
                display_name,
                ..
            } => AuthUser {
                uid: format!("uid-{email}"),
                email: Some(email.clone()),
                display_name: Some(display_name.clone()),
            },
            SignInCredentials::Google { .. } => user("uid-google", "Google User"),
        };

        self.set_user(Some(signed_in.clone()));
        Ok(signed_in)
    }

    fn sign_out(&self) -> Result<(), AuthBackendError> {
        self.set_user(None);
        Ok(())
    }
}

impl MessageStore for MemoryBackend {
    fn push_message(&self, message: &FriendlyMessage) -> Result<String, StoreSourceError> {
        let mut state = self.lock();
        if let Some(error) = state.push_error.clone() {
            return Err(error);
        }
        if state.user.is_none() {
            return Err(StoreSourceError::Unauthorized);
        }

        Ok(state.append(message.clone()))
    }
}

impl MessageFeed for MemoryBackend {
    fn listen_child_added(
        &self,
        sink: Sender<ChatEntry>,
    ) -> Result<ListenerRegistration, FeedSourceError> {
        let mut state = self.lock();
        if state.user.is_none() {
            return Err(FeedSourceError::Unauthorized);
        }

        for entry in &state.records {
            let _ = sink.send(entry.clone());
        }

        let id = state.next_sink_id;
        state.next_sink_id += 1;
        state.subscribe_count += 1;
        state.sinks.push((id, sink));

        let inner = Arc::clone(&self.inner);
        Ok(ListenerRegistration::new(move || {
            if let Ok(mut state) = inner.lock() {
                state.sinks.retain(|(sink_id, _)| *sink_id != id);
            }
        }))
    }
}

impl PhotoStorage for MemoryBackend {
    fn upload_photo(&self, _path: &Path, file_name: &str) -> Result<String, StorageSourceError> {
        let mut state = self.lock();
        if let Some(error) = state.upload_error.clone() {
            return Err(error);
        }

        state.uploaded_names.push(file_name.to_owned());
        Ok(format!("https://storage.test/chat_photos/{file_name}"))
    }
}
