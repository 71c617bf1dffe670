//! Identity Toolkit calls and the ID token lifecycle.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use super::{
    wire::{
        self, AccountResponse, IdpRequest, PasswordRequest, RefreshResponse, UpdateProfileRequest,
    },
    FirebaseError,
};
use crate::{
    domain::user::AuthUser,
    infra::{
        config::FirebaseConfig,
        error::AppError,
        session_store::{PersistedSession, SessionStore},
    },
};

const AUTH_SESSION_PERSIST_FAILED: &str = "AUTH_SESSION_PERSIST_FAILED";
const AUTH_SESSION_DISCARDED: &str = "AUTH_SESSION_DISCARDED";
const AUTH_PROFILE_UPDATE_FAILED: &str = "AUTH_PROFILE_UPDATE_FAILED";

/// ID tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Clone)]
struct ActiveSession {
    user: AuthUser,
    id_token: String,
    refresh_token: String,
    expires_at: Instant,
}

impl ActiveSession {
    fn needs_refresh(&self, now: Instant) -> bool {
        self.id_token.is_empty() || now + EXPIRY_MARGIN >= self.expires_at
    }
}

/// Shared handle on the signed-in session; cloned into background listeners.
#[derive(Clone)]
pub struct TokenSource {
    client: Client,
    config: Arc<FirebaseConfig>,
    store: SessionStore,
    session: Arc<Mutex<Option<ActiveSession>>>,
}

impl TokenSource {
    pub fn new(client: Client, config: Arc<FirebaseConfig>, store: SessionStore) -> Self {
        Self {
            client,
            config,
            store,
            session: Arc::new(Mutex::new(None)),
        }
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.lock().as_ref().map(|session| session.user.clone())
    }

    pub fn load_persisted(&self) -> Result<Option<PersistedSession>, AppError> {
        self.store.load()
    }

    /// Installs a persisted session whose ID token still has to be fetched.
    pub fn adopt(&self, persisted: &PersistedSession) {
        *self.lock() = Some(ActiveSession {
            user: persisted.user(),
            id_token: String::new(),
            refresh_token: persisted.refresh_token.clone(),
            expires_at: Instant::now(),
        });
    }

    /// Returns a valid ID token, refreshing it when it is about to expire.
    ///
    /// A refresh token the server no longer accepts ends the session.
    pub async fn id_token(&self) -> Result<String, FirebaseError> {
        let refresh_token = {
            let guard = self.lock();
            let session = guard.as_ref().ok_or(FirebaseError::NotSignedIn)?;
            if !session.needs_refresh(Instant::now()) {
                return Ok(session.id_token.clone());
            }
            session.refresh_token.clone()
        };

        match self.refresh(&refresh_token).await {
            Ok(refreshed) => {
                let expires_in = wire::parse_expires_in(Some(&refreshed.expires_in));
                let session = {
                    let mut guard = self.lock();
                    let session = guard.as_mut().ok_or(FirebaseError::NotSignedIn)?;
                    if session.user.uid != refreshed.user_id {
                        return Err(FirebaseError::NotSignedIn);
                    }
                    session.id_token = refreshed.id_token.clone();
                    session.refresh_token = refreshed.refresh_token;
                    session.expires_at = Instant::now() + Duration::from_secs(expires_in);
                    session.clone()
                };
                self.persist(&session);
                Ok(refreshed.id_token)
            }
            Err(error) if error.is_session_rejection() => {
                self.discard();
                Err(error)
            }
            Err(error) => Err(error),
        }
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, FirebaseError> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let account = self.account_call("signInWithPassword", &request).await?;
        self.establish(account)
    }

    /// Creates an email account, names it, and signs it in.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthUser, FirebaseError> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let mut account: AccountResponse = self.account_call("signUp", &request).await?;

        let display_name = display_name.trim();
        if !display_name.is_empty() {
            if let Some(id_token) = account.id_token.as_deref() {
                let update = UpdateProfileRequest {
                    id_token,
                    display_name,
                    return_secure_token: true,
                };
                match self
                    .account_call::<_, AccountResponse>("update", &update)
                    .await
                {
                    Ok(_) => account.display_name = Some(display_name.to_owned()),
                    Err(error) => tracing::warn!(
                        code = AUTH_PROFILE_UPDATE_FAILED,
                        error = %error,
                        "account created but display name could not be set"
                    ),
                }
            }
        }

        self.establish(account)
    }

    pub async fn sign_in_with_google(&self, id_token: &str) -> Result<AuthUser, FirebaseError> {
        let account = self
            .account_call("signInWithIdp", &IdpRequest::google(id_token))
            .await?;
        self.establish(account)
    }

    pub fn sign_out(&self) {
        self.discard();
    }

    async fn account_call<Req, Res>(&self, method: &str, request: &Req) -> Result<Res, FirebaseError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let url = format!("{}/v1/accounts:{method}", self.config.auth_url);
        let response = self
            .client
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(FirebaseError::transport)?;

        super::read_json(response).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, FirebaseError> {
        let url = format!("{}/v1/token", self.config.token_url);
        let response = self
            .client
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(FirebaseError::transport)?;

        super::read_json(response).await
    }

    fn establish(&self, account: AccountResponse) -> Result<AuthUser, FirebaseError> {
        let (Some(id_token), Some(refresh_token)) = (account.id_token, account.refresh_token) else {
            return Err(FirebaseError::Decode(
                "account response carried no tokens".to_owned(),
            ));
        };

        let expires_in = wire::parse_expires_in(account.expires_in.as_deref());
        let session = ActiveSession {
            user: AuthUser {
                uid: account.local_id,
                email: account.email.filter(|email| !email.trim().is_empty()),
                display_name: account.display_name.filter(|name| !name.trim().is_empty()),
            },
            id_token,
            refresh_token,
            expires_at: Instant::now() + Duration::from_secs(expires_in),
        };

        *self.lock() = Some(session.clone());
        self.persist(&session);

        Ok(session.user)
    }

    fn persist(&self, session: &ActiveSession) {
        let persisted = PersistedSession::new(&session.user, session.refresh_token.clone());
        if let Err(error) = self.store.save(&persisted) {
            tracing::warn!(
                code = AUTH_SESSION_PERSIST_FAILED,
                error = %error,
                "session could not be persisted; next start will ask to sign in"
            );
        }
    }

    fn discard(&self) {
        *self.lock() = None;
        match self.store.clear() {
            Ok(removed) => tracing::info!(
                code = AUTH_SESSION_DISCARDED,
                removed,
                "signed-in session discarded"
            ),
            Err(error) => tracing::warn!(
                code = AUTH_SESSION_DISCARDED,
                error = %error,
                "session file could not be removed"
            ),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(dir: &std::path::Path) -> TokenSource {
        TokenSource::new(
            Client::new(),
            Arc::new(FirebaseConfig::default()),
            SessionStore::new(dir.join("session.json")),
        )
    }

    fn account() -> AccountResponse {
        serde_json::from_value(serde_json::json!({
            "localId": "uid-1",
            "email": "ada@example.com",
            "displayName": "",
            "idToken": "id-token",
            "refreshToken": "refresh-token",
            "expiresIn": "3600"
        }))
        .expect("decodable account")
    }

    #[test]
    fn establishing_a_session_persists_it() {
        let dir = tempfile::tempdir().expect("temp dir");
        let tokens = source(dir.path());

        let user = tokens.establish(account()).expect("session should be established");

        assert_eq!(user.uid, "uid-1");
        assert_eq!(user.display_name, None);
        assert_eq!(tokens.current_user(), Some(user));
        let stored = tokens.store.load().expect("load").expect("session stored");
        assert_eq!(stored.refresh_token, "refresh-token");
    }

    #[test]
    fn fresh_token_is_served_without_a_refresh() {
        let dir = tempfile::tempdir().expect("temp dir");
        let tokens = source(dir.path());
        tokens.establish(account()).expect("session should be established");

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        let token = runtime
            .block_on(tokens.id_token())
            .expect("token should be served");

        assert_eq!(token, "id-token");
    }

    #[test]
    fn signed_out_source_has_no_token() {
        let dir = tempfile::tempdir().expect("temp dir");
        let tokens = source(dir.path());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");

        assert!(matches!(
            runtime.block_on(tokens.id_token()),
            Err(FirebaseError::NotSignedIn)
        ));
    }

    #[test]
    fn adopted_session_needs_a_refresh() {
        let dir = tempfile::tempdir().expect("temp dir");
        let tokens = source(dir.path());
        let persisted = PersistedSession::new(
            &AuthUser {
                uid: "uid-1".to_owned(),
                email: None,
                display_name: Some("Ada".to_owned()),
            },
            "refresh-token",
        );

        tokens.adopt(&persisted);

        let guard = tokens.lock();
        let session = guard.as_ref().expect("session adopted");
        assert!(session.needs_refresh(Instant::now()));
        assert_eq!(session.user.display_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn sign_out_clears_memory_and_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let tokens = source(dir.path());
        tokens.establish(account()).expect("session should be established");

        tokens.sign_out();

        assert_eq!(tokens.current_user(), None);
        assert_eq!(tokens.store.load().expect("load"), None);
    }

    #[test]
    fn response_without_tokens_is_a_decode_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let tokens = source(dir.path());
        let account: AccountResponse =
            serde_json::from_value(serde_json::json!({"localId": "uid-1"})).expect("decodable");

        assert!(matches!(
            tokens.establish(account),
            Err(FirebaseError::Decode(_))
        ));
        assert_eq!(tokens.current_user(), None);
    }
}
