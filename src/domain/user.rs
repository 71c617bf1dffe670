/// The signed-in identity as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl AuthUser {
    /// Name shown as the author of outgoing messages.
    ///
    /// Falls back to the local part of the email, then to `anonymous_name`.
    pub fn chat_name(&self, anonymous_name: &str) -> String {
        if let Some(name) = self.display_name.as_deref().map(str::trim) {
            if !name.is_empty() {
                return name.to_owned();
            }
        }

        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.trim().is_empty())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| anonymous_name.to_owned())
    }
}
