//! Firebase integration layer: REST and streaming clients behind the use case contracts.

mod auth;
mod database;
mod storage;
pub mod stream;
pub mod wire;

use std::{path::Path, sync::mpsc::Sender, sync::Arc, time::Duration};

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};

use self::{auth::TokenSource, stream::ListenerContext, wire::MessageRecord};
use crate::{
    domain::{
        message::{ChatEntry, FriendlyMessage},
        user::AuthUser,
    },
    infra::{config::FirebaseConfig, error::AppError, session_store::SessionStore},
    usecases::{
        message_feed::{FeedSourceError, ListenerRegistration, MessageFeed},
        send_message::{MessageStore, StoreSourceError},
        sign_in::{AuthBackendError, AuthGateway, SignInCredentials},
        startup::{SessionRestore, SessionRestorer},
        upload_photo::{PhotoStorage, StorageSourceError},
    },
};

const SESSION_PROBE_FAILED: &str = "SESSION_PROBE_FAILED";
const SESSION_PROBE_TIMEOUT: &str = "SESSION_PROBE_TIMEOUT";
const SESSION_FILE_UNREADABLE: &str = "SESSION_FILE_UNREADABLE";

#[derive(Debug, Error)]
pub enum FirebaseError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("server answered {status} ({})", .code.as_deref().unwrap_or("no error code"))]
    Status { status: u16, code: Option<String> },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
    #[error("no user is signed in")]
    NotSignedIn,
}

impl FirebaseError {
    /// Wraps a transport error with the request URL removed; URLs carry keys and tokens.
    fn transport(error: reqwest::Error) -> Self {
        Self::Transport(error.without_url())
    }

    fn code(&self) -> Option<&str> {
        match self {
            Self::Status { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn is_session_rejection(&self) -> bool {
        self.code().is_some_and(wire::is_session_rejection)
    }

    fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::NotSignedIn | Self::Status { status: 401 | 403, .. }
        ) || self.is_session_rejection()
    }

    fn rejection_code(&self) -> Option<String> {
        match self {
            Self::Status { status, code } if (400..500).contains(status) => Some(
                code.clone()
                    .unwrap_or_else(|| format!("HTTP_{status}")),
            ),
            _ => None,
        }
    }
}

impl From<FirebaseError> for StoreSourceError {
    fn from(error: FirebaseError) -> Self {
        if error.is_unauthorized() {
            return Self::Unauthorized;
        }
        match error.rejection_code() {
            Some(code) => Self::Rejected { code },
            None => Self::Unavailable,
        }
    }
}

impl From<FirebaseError> for StorageSourceError {
    fn from(error: FirebaseError) -> Self {
        if error.is_unauthorized() {
            return Self::Unauthorized;
        }
        match error.rejection_code() {
            Some(code) => Self::Rejected { code },
            None => Self::Unavailable,
        }
    }
}

impl From<FirebaseError> for AuthBackendError {
    fn from(error: FirebaseError) -> Self {
        match error {
            FirebaseError::Status {
                code: Some(code), ..
            } => wire::auth_error_from_code(&code),
            FirebaseError::Status { status, code: None } => Self::Transient {
                code: "AUTH_BACKEND_REJECTED",
                message: format!("identity provider answered {status}"),
            },
            FirebaseError::Transport(source) => Self::Transient {
                code: "AUTH_BACKEND_UNAVAILABLE",
                message: source.to_string(),
            },
            FirebaseError::Decode(message) => Self::Transient {
                code: "AUTH_BACKEND_PROTOCOL",
                message,
            },
            FirebaseError::InvalidUrl(message) => Self::Transient {
                code: "AUTH_CONFIG_INVALID",
                message,
            },
            FirebaseError::NotSignedIn => Self::SessionExpired,
        }
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, FirebaseError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FirebaseError::Status {
            status: status.as_u16(),
            code: wire::api_error_code(&body),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|error| FirebaseError::Decode(error.without_url().to_string()))
}

pub struct FirebaseAdapter {
    runtime: Runtime,
    client: Client,
    stream_client: Client,
    config: Arc<FirebaseConfig>,
    tokens: TokenSource,
}

impl std::fmt::Debug for FirebaseAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseAdapter")
            .field("database_url", &self.config.database_url)
            .field("storage_bucket", &self.config.storage_bucket)
            .field("signed_in", &self.tokens.current_user().is_some())
            .finish()
    }
}

impl FirebaseAdapter {
    pub fn new(config: &FirebaseConfig, session_file: &Path) -> Result<Self, AppError> {
        config.validate()?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("friendlychat-firebase")
            .enable_all()
            .build()
            .map_err(|error| AppError::BackendInit {
                details: format!("failed to initialize async runtime: {error}"),
            })?;

        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| AppError::BackendInit {
                details: format!("failed to build http client: {}", error.without_url()),
            })?;
        // The event stream stays open indefinitely, so only connecting is bounded.
        let stream_client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|error| AppError::BackendInit {
                details: format!("failed to build stream client: {}", error.without_url()),
            })?;

        let config = Arc::new(config.clone());
        let tokens = TokenSource::new(
            client.clone(),
            Arc::clone(&config),
            SessionStore::new(session_file),
        );

        Ok(Self {
            runtime,
            client,
            stream_client,
            config,
            tokens,
        })
    }

    fn messages_url(&self) -> Result<Url, FirebaseError> {
        database::messages_url(&self.config)
    }
}

impl SessionRestorer for FirebaseAdapter {
    fn restore_session(&self, probe_timeout: Duration) -> SessionRestore {
        let persisted = match self.tokens.load_persisted() {
            Ok(Some(persisted)) => persisted,
            Ok(None) => return SessionRestore::NoSession,
            Err(error) => {
                tracing::warn!(
                    code = SESSION_FILE_UNREADABLE,
                    error = %error,
                    "persisted session is unreadable and will be discarded"
                );
                self.tokens.sign_out();
                return SessionRestore::Rejected;
            }
        };

        self.tokens.adopt(&persisted);
        let probe = self
            .runtime
            .block_on(tokio::time::timeout(probe_timeout, self.tokens.id_token()));

        match probe {
            Ok(Ok(_)) => SessionRestore::Restored(persisted.user()),
            Ok(Err(error)) if error.is_session_rejection() => SessionRestore::Rejected,
            Ok(Err(error)) => {
                tracing::debug!(error = %error, "session probe failed");
                SessionRestore::Unverified {
                    user: persisted.user(),
                    code: SESSION_PROBE_FAILED,
                }
            }
            Err(_) => SessionRestore::Unverified {
                user: persisted.user(),
                code: SESSION_PROBE_TIMEOUT,
            },
        }
    }
}

impl AuthGateway for FirebaseAdapter {
    fn current_user(&self) -> Option<AuthUser> {
        self.tokens.current_user()
    }

    fn sign_in(&self, credentials: &SignInCredentials) -> Result<AuthUser, AuthBackendError> {
        let result = match credentials {
            SignInCredentials::EmailPassword { email, password } => self
                .runtime
                .block_on(self.tokens.sign_in_with_password(email, password)),
            SignInCredentials::NewAccount {
                email,
                password,
                display_name,
            } => self
                .runtime
                .block_on(self.tokens.sign_up(email, password, display_name)),
            SignInCredentials::Google { id_token } => self
                .runtime
                .block_on(self.tokens.sign_in_with_google(id_token)),
        };

        result.map_err(AuthBackendError::from)
    }

    fn sign_out(&self) -> Result<(), AuthBackendError> {
        self.tokens.sign_out();
        Ok(())
    }
}

impl MessageStore for FirebaseAdapter {
    fn push_message(&self, message: &FriendlyMessage) -> Result<String, StoreSourceError> {
        let collection = self.messages_url().map_err(StoreSourceError::from)?;
        let record = MessageRecord::from(message);

        self.runtime
            .block_on(database::push(
                &self.client,
                &self.tokens,
                &collection,
                &record,
            ))
            .map_err(StoreSourceError::from)
    }
}

impl MessageFeed for FirebaseAdapter {
    fn listen_child_added(
        &self,
        sink: Sender<ChatEntry>,
    ) -> Result<ListenerRegistration, FeedSourceError> {
        if self.tokens.current_user().is_none() {
            return Err(FeedSourceError::Unauthorized);
        }
        let url = self
            .messages_url()
            .map_err(|_| FeedSourceError::Unavailable)?;

        let context = ListenerContext {
            client: self.stream_client.clone(),
            tokens: self.tokens.clone(),
            url,
            reconnect_delay: Duration::from_millis(self.config.stream_reconnect_delay_ms),
        };

        Ok(stream::spawn_listener(&self.runtime, context, sink))
    }
}

impl PhotoStorage for FirebaseAdapter {
    fn upload_photo(&self, path: &Path, file_name: &str) -> Result<String, StorageSourceError> {
        let bytes = std::fs::read(path).map_err(|error| StorageSourceError::LocalRead {
            message: error.to_string(),
        })?;
        let object_name = storage::object_name(&self.config.photos_prefix, file_name);
        let content_type = storage::content_type_for(path);

        self.runtime
            .block_on(storage::upload(
                &self.client,
                &self.tokens,
                &self.config,
                &object_name,
                bytes,
                content_type,
            ))
            .map_err(StorageSourceError::from)
    }
}

/// Returns the firebase module name for smoke checks.
pub fn module_name() -> &'static str {
    "firebase"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16, code: Option<&str>) -> FirebaseError {
        FirebaseError::Status {
            status,
            code: code.map(ToOwned::to_owned),
        }
    }

    fn configured() -> FirebaseConfig {
        FirebaseConfig {
            api_key: "AIza-test".to_owned(),
            database_url: "https://demo-default-rtdb.firebaseio.com".to_owned(),
            storage_bucket: "demo.appspot.com".to_owned(),
            ..FirebaseConfig::default()
        }
    }

    #[test]
    fn store_errors_distinguish_auth_rules_and_outages() {
        assert_eq!(
            StoreSourceError::from(status(401, Some("AUTH_TOKEN_IS_EXPIRED"))),
            StoreSourceError::Unauthorized
        );
        assert_eq!(
            StoreSourceError::from(FirebaseError::NotSignedIn),
            StoreSourceError::Unauthorized
        );
        assert_eq!(
            StoreSourceError::from(status(400, None)),
            StoreSourceError::Rejected {
                code: "HTTP_400".to_owned()
            }
        );
        assert_eq!(
            StoreSourceError::from(status(503, None)),
            StoreSourceError::Unavailable
        );
    }

    #[test]
    fn rejected_refresh_token_is_unauthorized_everywhere() {
        let error = status(400, Some("TOKEN_EXPIRED"));
        assert!(error.is_session_rejection());

        assert_eq!(
            StorageSourceError::from(status(400, Some("TOKEN_EXPIRED"))),
            StorageSourceError::Unauthorized
        );
        assert_eq!(
            AuthBackendError::from(status(400, Some("TOKEN_EXPIRED"))),
            AuthBackendError::SessionExpired
        );
    }

    #[test]
    fn auth_errors_map_from_api_codes() {
        assert_eq!(
            AuthBackendError::from(status(400, Some("EMAIL_EXISTS"))),
            AuthBackendError::EmailExists
        );
        assert!(matches!(
            AuthBackendError::from(status(502, None)),
            AuthBackendError::Transient {
                code: "AUTH_BACKEND_REJECTED",
                ..
            }
        ));
    }

    #[test]
    fn adapter_refuses_placeholder_config() {
        let dir = tempfile::tempdir().expect("temp dir");

        let result = FirebaseAdapter::new(&FirebaseConfig::default(), &dir.path().join("s.json"));

        assert!(matches!(result, Err(AppError::ConfigInvalid { .. })));
    }

    #[test]
    fn restore_without_session_file_reports_no_session() {
        let dir = tempfile::tempdir().expect("temp dir");
        let adapter = FirebaseAdapter::new(&configured(), &dir.path().join("session.json"))
            .expect("adapter should build");

        assert_eq!(
            adapter.restore_session(Duration::from_millis(10)),
            SessionRestore::NoSession
        );
        assert_eq!(adapter.current_user(), None);
    }

    #[test]
    fn unreadable_session_file_is_discarded() {
        let dir = tempfile::tempdir().expect("temp dir");
        let session_file = dir.path().join("session.json");
        std::fs::write(&session_file, b"{broken").expect("fixture should be writable");
        let adapter = FirebaseAdapter::new(&configured(), &session_file).expect("adapter");

        assert_eq!(
            adapter.restore_session(Duration::from_millis(10)),
            SessionRestore::Rejected
        );
        assert!(!session_file.exists());
    }

    #[test]
    fn listening_requires_a_signed_in_user() {
        let dir = tempfile::tempdir().expect("temp dir");
        let adapter = FirebaseAdapter::new(&configured(), &dir.path().join("session.json"))
            .expect("adapter should build");
        let (sink, _receiver) = std::sync::mpsc::channel();

        assert!(matches!(
            adapter.listen_child_added(sink),
            Err(FeedSourceError::Unauthorized)
        ));
    }

    #[test]
    fn missing_photo_file_is_a_local_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let adapter = FirebaseAdapter::new(&configured(), &dir.path().join("session.json"))
            .expect("adapter should build");

        let result = adapter.upload_photo(&dir.path().join("missing.jpg"), "missing.jpg");

        assert!(matches!(result, Err(StorageSourceError::LocalRead { .. })));
    }
}
