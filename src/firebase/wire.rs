//! JSON shapes exchanged with the Firebase REST endpoints.

use serde::{Deserialize, Serialize};

use crate::{
    domain::message::{FriendlyMessage, MessageError},
    usecases::sign_in::AuthBackendError,
};

/// A chat message as stored under the messages path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl From<&FriendlyMessage> for MessageRecord {
    fn from(message: &FriendlyMessage) -> Self {
        Self {
            name: message.author().to_owned(),
            text: message.text_body().map(ToOwned::to_owned),
            photo_url: message.photo_url().map(ToOwned::to_owned),
        }
    }
}

impl TryFrom<MessageRecord> for FriendlyMessage {
    type Error = MessageError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        FriendlyMessage::from_parts(record.name, record.text, record.photo_url)
    }
}

#[derive(Debug, Deserialize)]
pub struct PushResponse {
    pub name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest<'a> {
    pub id_token: &'a str,
    pub display_name: &'a str,
    pub return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdpRequest {
    pub post_body: String,
    pub request_uri: &'static str,
    pub return_secure_token: bool,
    pub return_idp_credential: bool,
}

impl IdpRequest {
    pub fn google(id_token: &str) -> Self {
        let post_body = reqwest::Url::parse_with_params(
            "http://localhost",
            &[("id_token", id_token), ("providerId", "google.com")],
        )
        .ok()
        .and_then(|url| url.query().map(ToOwned::to_owned))
        .unwrap_or_default();

        Self {
            post_body,
            request_uri: "http://localhost",
            return_secure_token: true,
            return_idp_credential: true,
        }
    }
}

/// Successful answer of the Identity Toolkit account endpoints.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<String>,
}

/// Answer of the Secure Token refresh endpoint (snake_case on the wire).
#[derive(Deserialize)]
pub struct RefreshResponse {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub name: String,
    pub bucket: String,
    #[serde(default)]
    pub download_tokens: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Structured { message: String },
    Plain(String),
}

/// Extracts a stable error code from a Firebase error body.
///
/// Identity Toolkit sends `{"error":{"message":"CODE : detail"}}`, the database
/// sends `{"error":"Permission denied"}`; both become `UPPER_SNAKE` codes.
pub fn api_error_code(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    let message = match envelope.error {
        ErrorDetail::Structured { message } | ErrorDetail::Plain(message) => message,
    };

    let head = message.split(" : ").next().unwrap_or_default();
    let code = head
        .trim()
        .trim_end_matches('.')
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect::<String>();

    (!code.is_empty()).then_some(code)
}

pub fn auth_error_from_code(code: &str) -> AuthBackendError {
    match code {
        "EMAIL_NOT_FOUND" => AuthBackendError::EmailNotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" => {
            AuthBackendError::InvalidCredentials
        }
        "EMAIL_EXISTS" => AuthBackendError::EmailExists,
        "WEAK_PASSWORD" => AuthBackendError::WeakPassword,
        "INVALID_IDP_RESPONSE" => AuthBackendError::InvalidIdpToken,
        "USER_DISABLED" => AuthBackendError::UserDisabled,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthBackendError::TooManyAttempts,
        "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" | "INVALID_ID_TOKEN" => {
            AuthBackendError::SessionExpired
        }
        other => AuthBackendError::Rejected {
            code: other.to_owned(),
        },
    }
}

/// Codes from the token endpoint that mean the stored session is gone for good.
pub fn is_session_rejection(code: &str) -> bool {
    matches!(
        code,
        "TOKEN_EXPIRED"
            | "INVALID_REFRESH_TOKEN"
            | "USER_DISABLED"
            | "USER_NOT_FOUND"
            | "INVALID_GRANT_TYPE"
            | "MISSING_REFRESH_TOKEN"
    )
}

/// Token lifetime in seconds; Firebase sends it as a decimal string.
pub fn parse_expires_in(value: Option<&str>) -> u64 {
    value
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(3_600)
}
