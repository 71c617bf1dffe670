//! Guided sign-in flow run on the plain terminal before the chat screen opens.

use std::io;

use crate::{domain::user::AuthUser, infra::secrets::sanitize_error_code};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub method_attempts: usize,
    pub credential_attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            method_attempts: 3,
            credential_attempts: 3,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum SignInCredentials {
    EmailPassword {
        email: String,
        password: String,
    },
    /// Creates the account, then signs in with it.
    NewAccount {
        email: String,
        password: String,
        display_name: String,
    },
    /// A Google ID token exchanged for a session.
    Google {
        id_token: String,
    },
}

impl std::fmt::Debug for SignInCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailPassword { email, .. } => f
                .debug_struct("EmailPassword")
                .field("email", email)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::NewAccount {
                email,
                display_name,
                ..
            } => f
                .debug_struct("NewAccount")
                .field("email", email)
                .field("password", &"[REDACTED]")
                .field("display_name", display_name)
                .finish(),
            Self::Google { .. } => f
                .debug_struct("Google")
                .field("id_token", &"[REDACTED]")
                .finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthBackendError {
    EmailNotFound,
    InvalidCredentials,
    EmailExists,
    WeakPassword,
    InvalidIdpToken,
    UserDisabled,
    TooManyAttempts,
    /// The session can no longer be refreshed and must be discarded.
    SessionExpired,
    Rejected { code: String },
    Transient { code: &'static str, message: String },
}

impl AuthBackendError {
    /// Stable, non-secret code for terminal output and logs.
    pub fn code(&self) -> String {
        match self {
            Self::EmailNotFound => "AUTH_EMAIL_NOT_FOUND".to_owned(),
            Self::InvalidCredentials => "AUTH_INVALID_CREDENTIALS".to_owned(),
            Self::EmailExists => "AUTH_EMAIL_EXISTS".to_owned(),
            Self::WeakPassword => "AUTH_WEAK_PASSWORD".to_owned(),
            Self::InvalidIdpToken => "AUTH_INVALID_IDP_TOKEN".to_owned(),
            Self::UserDisabled => "AUTH_USER_DISABLED".to_owned(),
            Self::TooManyAttempts => "AUTH_TOO_MANY_ATTEMPTS".to_owned(),
            Self::SessionExpired => "AUTH_SESSION_EXPIRED".to_owned(),
            Self::Rejected { code } => sanitize_error_code(&format!("AUTH_{code}")),
            Self::Transient { code, .. } => sanitize_error_code(code),
        }
    }
}

/// Identity provider as seen by the application.
pub trait AuthGateway {
    fn current_user(&self) -> Option<AuthUser>;
    fn sign_in(&self, credentials: &SignInCredentials) -> Result<AuthUser, AuthBackendError>;
    fn sign_out(&self) -> Result<(), AuthBackendError>;
}

impl<T: AuthGateway + ?Sized> AuthGateway for &T {
    fn current_user(&self) -> Option<AuthUser> {
        (*self).current_user()
    }

    fn sign_in(&self, credentials: &SignInCredentials) -> Result<AuthUser, AuthBackendError> {
        (*self).sign_in(credentials)
    }

    fn sign_out(&self) -> Result<(), AuthBackendError> {
        (*self).sign_out()
    }
}

pub trait AuthTerminal {
    fn print_line(&mut self, line: &str) -> io::Result<()>;
    fn prompt_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
    fn prompt_secret(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

pub struct StdTerminal;

impl AuthTerminal for StdTerminal {
    fn print_line(&mut self, line: &str) -> io::Result<()> {
        println!("{line}");
        Ok(())
    }

    fn prompt_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        use std::io::Write;

        print!("{prompt}");
        io::stdout().flush()?;

        let mut line = String::new();
        let bytes = io::stdin().read_line(&mut line)?;
        if bytes == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim().to_owned()))
    }

    fn prompt_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match rpassword::prompt_password(prompt) {
            Ok(secret) => Ok(Some(strip_line_ending(secret))),
            Err(source) if source.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(source) => Err(source),
        }
    }
}

/// Error payload of a failed sign-in, safe to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInResult {
    SignedIn(AuthUser),
    /// The user left the flow without an error.
    Cancelled,
    Failed(AuthFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignInMethod {
    Email,
    Google,
}

enum Attempt {
    Done(SignInResult),
    Retry(AuthFailure),
}

pub fn run_sign_in(
    terminal: &mut dyn AuthTerminal,
    auth: &dyn AuthGateway,
    retry_policy: &RetryPolicy,
) -> io::Result<SignInResult> {
    terminal.print_line("Sign in to FriendlyChat.")?;

    let Some(method) = choose_method(terminal, retry_policy.method_attempts)? else {
        return Ok(SignInResult::Cancelled);
    };

    let attempts = retry_policy.credential_attempts;
    let mut last_failure = None;

    for attempt in 1..=attempts {
        let step = match method {
            SignInMethod::Email => email_attempt(terminal, auth, attempt, attempts)?,
            SignInMethod::Google => google_attempt(terminal, auth, attempt, attempts)?,
        };

        match step {
            Attempt::Done(result) => return Ok(result),
            Attempt::Retry(failure) => last_failure = Some(failure),
        }
    }

    terminal.print_line("Sign-in failed too many times.")?;
    Ok(match last_failure {
        Some(failure) => SignInResult::Failed(failure),
        None => SignInResult::Cancelled,
    })
}

fn choose_method(
    terminal: &mut dyn AuthTerminal,
    attempts: usize,
) -> io::Result<Option<SignInMethod>> {
    for attempt in 1..=attempts {
        terminal.print_line("Choose a sign-in method: [1] Email  [2] Google")?;
        let Some(choice) = terminal.prompt_line("Method (empty to cancel): ")? else {
            return Ok(None);
        };

        match choice.to_ascii_lowercase().as_str() {
            "" => return Ok(None),
            "1" | "email" => return Ok(Some(SignInMethod::Email)),
            "2" | "google" => return Ok(Some(SignInMethod::Google)),
            _ => terminal.print_line(&format!(
                "Unknown choice. Attempts left: {}",
                attempts.saturating_sub(attempt)
            ))?,
        }
    }

    Ok(None)
}

fn email_attempt(
    terminal: &mut dyn AuthTerminal,
    auth: &dyn AuthGateway,
    attempt: usize,
    attempts: usize,
) -> io::Result<Attempt> {
    let Some(email) = terminal.prompt_line("Email: ")? else {
        return Ok(Attempt::Done(SignInResult::Cancelled));
    };
    if email.is_empty() {
        return Ok(Attempt::Done(SignInResult::Cancelled));
    }
    if !is_valid_email(&email) {
        terminal.print_line(&format!(
            "That does not look like an email address. Attempts left: {}",
            attempts.saturating_sub(attempt)
        ))?;
        return Ok(Attempt::Retry(AuthFailure {
            code: "AUTH_INVALID_EMAIL".to_owned(),
        }));
    }

    let Some(password) = terminal.prompt_secret("Password: ")? else {
        return Ok(Attempt::Done(SignInResult::Cancelled));
    };

    let credentials = SignInCredentials::EmailPassword {
        email: email.clone(),
        password: password.clone(),
    };

    match auth.sign_in(&credentials) {
        Ok(user) => Ok(Attempt::Done(SignInResult::SignedIn(user))),
        Err(AuthBackendError::EmailNotFound) => {
            if confirm(terminal, "No account uses this email. Create one? [y/N]: ")? {
                create_account(terminal, auth, email, password, attempt, attempts)
            } else {
                Ok(Attempt::Done(SignInResult::Cancelled))
            }
        }
        // Projects with email enumeration protection answer unknown emails this way too.
        Err(AuthBackendError::InvalidCredentials) => {
            if confirm(
                terminal,
                "Email or password is incorrect. Create a new account with this email? [y/N]: ",
            )? {
                create_account(terminal, auth, email, password, attempt, attempts)
            } else {
                let error = AuthBackendError::InvalidCredentials;
                handle_backend_error(terminal, error, attempt, attempts)
            }
        }
        Err(error) => handle_backend_error(terminal, error, attempt, attempts),
    }
}

fn confirm(terminal: &mut dyn AuthTerminal, prompt: &str) -> io::Result<bool> {
    let answer = terminal.prompt_line(prompt)?;
    Ok(matches!(answer.as_deref(), Some("y" | "Y" | "yes")))
}

fn create_account(
    terminal: &mut dyn AuthTerminal,
    auth: &dyn AuthGateway,
    email: String,
    password: String,
    attempt: usize,
    attempts: usize,
) -> io::Result<Attempt> {
    let Some(display_name) = terminal.prompt_line("Your name: ")? else {
        return Ok(Attempt::Done(SignInResult::Cancelled));
    };

    let credentials = SignInCredentials::NewAccount {
        email,
        password,
        display_name,
    };

    match auth.sign_in(&credentials) {
        Ok(user) => Ok(Attempt::Done(SignInResult::SignedIn(user))),
        Err(error) => handle_backend_error(terminal, error, attempt, attempts),
    }
}

fn google_attempt(
    terminal: &mut dyn AuthTerminal,
    auth: &dyn AuthGateway,
    attempt: usize,
    attempts: usize,
) -> io::Result<Attempt> {
    let Some(id_token) = terminal.prompt_secret("Google ID token: ")? else {
        return Ok(Attempt::Done(SignInResult::Cancelled));
    };
    if id_token.trim().is_empty() {
        return Ok(Attempt::Done(SignInResult::Cancelled));
    }

    match auth.sign_in(&SignInCredentials::Google { id_token }) {
        Ok(user) => Ok(Attempt::Done(SignInResult::SignedIn(user))),
        Err(error) => handle_backend_error(terminal, error, attempt, attempts),
    }
}

fn handle_backend_error(
    terminal: &mut dyn AuthTerminal,
    error: AuthBackendError,
    attempt: usize,
    max_attempts: usize,
) -> io::Result<Attempt> {
    let attempts_left = max_attempts.saturating_sub(attempt);
    let failure = AuthFailure { code: error.code() };

    let retryable = match error {
        AuthBackendError::InvalidCredentials => {
            terminal.print_line(&format!(
                "{}: email or password is incorrect. Attempts left: {attempts_left}",
                failure.code
            ))?;
            true
        }
        AuthBackendError::EmailExists => {
            terminal.print_line(&format!(
                "{}: an account already uses this email. Attempts left: {attempts_left}",
                failure.code
            ))?;
            true
        }
        AuthBackendError::WeakPassword => {
            terminal.print_line(&format!(
                "{}: password must be at least 6 characters. Attempts left: {attempts_left}",
                failure.code
            ))?;
            true
        }
        AuthBackendError::InvalidIdpToken => {
            terminal.print_line(&format!(
                "{}: Google rejected the token. Attempts left: {attempts_left}",
                failure.code
            ))?;
            true
        }
        AuthBackendError::Transient { .. } => {
            terminal.print_line(&format!(
                "{}: temporary sign-in issue. Please retry. Attempts left: {attempts_left}",
                failure.code
            ))?;
            true
        }
        AuthBackendError::EmailNotFound
        | AuthBackendError::UserDisabled
        | AuthBackendError::TooManyAttempts
        | AuthBackendError::SessionExpired
        | AuthBackendError::Rejected { .. } => {
            terminal.print_line(&format!("{}: sign-in is not possible.", failure.code))?;
            false
        }
    };

    if retryable && attempts_left > 0 {
        Ok(Attempt::Retry(failure))
    } else {
        Ok(Attempt::Done(SignInResult::Failed(failure)))
    }
}

/// Drops only the trailing line break; spaces are part of the secret.
fn strip_line_ending(mut secret: String) -> String {
    while secret.ends_with(['\n', '\r']) {
        secret.pop();
    }
    secret
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}
