//! Session holder: current identity and its durable credential token.
//!
//! # Responsibility
//! - Restore a persisted sign-in at startup (`bootstrap`).
//! - Drive login/register through an injected `Verifier` capability.
//! - Persist and clear the token + identity pair in a `KeyValueStore`.
//!
//! # Invariants
//! - At most one identity is current at a time.
//! - State writes happen only after the verifier resolves; dropping an
//!   in-flight login future leaves the holder untouched.
//! - A malformed persisted identity is never surfaced as an error: both
//!   keys are cleared and the holder becomes anonymous.
//! - Tokens, emails and passwords are never logged.

use crate::model::identity::{
    CredentialValidationError, Identity, LoginCredentials, RegisterCredentials,
};
use crate::repo::kv_store::{KeyValueStore, KvError};
use async_trait::async_trait;
use log::{info, warn};
use thiserror::Error;
use uuid::Uuid;

/// Durable key holding the opaque auth token.
pub const AUTH_TOKEN_KEY: &str = "authToken";
/// Durable key holding the serialized `Identity`.
pub const IDENTITY_KEY: &str = "user";

const STUB_DISPLAY_NAME: &str = "Demo User";

pub type SessionResult<T> = Result<T, SessionError>;

/// Credential verification failure reported by a `Verifier`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("verification rejected: {0}")]
    Rejected(String),
}

/// Session operation failure.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] CredentialValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("session storage failed: {0}")]
    Store(#[from] KvError),
    #[error("failed to encode identity: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Successful verification result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    pub identity: Identity,
    pub token: String,
}

/// External credential verification capability.
///
/// Implementations decide what "valid" means; the holder only relies on
/// the success/`AuthError` contract.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn login(&self, credentials: &LoginCredentials) -> Result<Verified, AuthError>;
    async fn register(&self, credentials: &RegisterCredentials) -> Result<Verified, AuthError>;
}

/// Verifier that accepts everything. Stands in for a real backend.
#[derive(Debug, Clone)]
pub struct StubVerifier {
    display_name: String,
}

impl StubVerifier {
    /// Display name assigned to identities produced by `login`.
    pub fn with_display_name(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }

    fn issue(name: String, email: String) -> Verified {
        Verified {
            identity: Identity {
                id: Uuid::new_v4().to_string(),
                name,
                email,
                avatar: None,
            },
            token: format!("stub-{}", Uuid::new_v4().simple()),
        }
    }
}

impl Default for StubVerifier {
    fn default() -> Self {
        Self::with_display_name(STUB_DISPLAY_NAME)
    }
}

#[async_trait]
impl Verifier for StubVerifier {
    async fn login(&self, credentials: &LoginCredentials) -> Result<Verified, AuthError> {
        Ok(Self::issue(
            self.display_name.clone(),
            credentials.email.clone(),
        ))
    }

    async fn register(&self, credentials: &RegisterCredentials) -> Result<Verified, AuthError> {
        Ok(Self::issue(
            credentials.name.clone(),
            credentials.email.clone(),
        ))
    }
}

/// Authenticated identity with its opaque token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub token: String,
}

/// Session lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Persisted credentials not checked yet.
    #[default]
    Unknown,
    Anonymous,
    Authenticated(Session),
}

enum Persisted {
    Missing,
    Corrupt(serde_json::Error),
    Found(Session),
}

/// Explicitly constructed session context over a durable store.
///
/// `&mut self` receivers keep at most one operation in flight per holder.
pub struct SessionHolder<S: KeyValueStore> {
    store: S,
    state: SessionState,
}

impl<S: KeyValueStore> SessionHolder<S> {
    /// Creates a holder in `Unknown` state. Call `bootstrap` before use.
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: SessionState::Unknown,
        }
    }

    /// Restores a persisted session, if any.
    ///
    /// Never fails: unreadable storage and corrupt identity blobs both
    /// resolve to `Anonymous`; only the corrupt case clears the keys.
    pub fn bootstrap(&mut self) -> &SessionState {
        self.state = match self.read_persisted() {
            Ok(Persisted::Found(session)) => {
                info!("event=session_bootstrap module=session status=ok outcome=restored");
                SessionState::Authenticated(session)
            }
            Ok(Persisted::Missing) => {
                info!("event=session_bootstrap module=session status=ok outcome=anonymous");
                SessionState::Anonymous
            }
            Ok(Persisted::Corrupt(err)) => {
                warn!(
                    "event=session_bootstrap module=session status=recovered outcome=cleared error_code=identity_corrupt error={err}"
                );
                if let Err(err) = self.clear_persisted() {
                    warn!(
                        "event=session_bootstrap module=session status=error error_code=clear_failed error={err}"
                    );
                }
                SessionState::Anonymous
            }
            Err(err) => {
                warn!(
                    "event=session_bootstrap module=session status=error outcome=anonymous error_code=store_read_failed error={err}"
                );
                SessionState::Anonymous
            }
        };
        &self.state
    }

    /// Signs in through `verifier` and persists the resulting session.
    ///
    /// # Errors
    /// - `Auth` when the verifier rejects the credentials; state unchanged.
    /// - `Store` when persistence fails; the holder ends up `Anonymous`.
    pub async fn login<V>(
        &mut self,
        credentials: &LoginCredentials,
        verifier: &V,
    ) -> SessionResult<Identity>
    where
        V: Verifier + ?Sized,
    {
        let verified = match verifier.login(credentials).await {
            Ok(verified) => verified,
            Err(err) => {
                warn!("event=session_login module=session status=error error_code=auth_failed");
                return Err(err.into());
            }
        };
        self.establish("session_login", verified)
    }

    /// Creates an account through `verifier` and signs it in.
    ///
    /// The password confirmation is checked before the verifier is called.
    pub async fn register<V>(
        &mut self,
        credentials: &RegisterCredentials,
        verifier: &V,
    ) -> SessionResult<Identity>
    where
        V: Verifier + ?Sized,
    {
        if let Err(err) = credentials.validate() {
            warn!("event=session_register module=session status=rejected reason={err}");
            return Err(err.into());
        }

        let verified = match verifier.register(credentials).await {
            Ok(verified) => verified,
            Err(err) => {
                warn!(
                    "event=session_register module=session status=error error_code=auth_failed"
                );
                return Err(err.into());
            }
        };
        self.establish("session_register", verified)
    }

    /// Drops the current identity and clears durable entries.
    ///
    /// The holder is `Anonymous` afterwards even when clearing storage
    /// fails; that failure is still reported.
    pub fn logout(&mut self) -> SessionResult<()> {
        let was_authenticated = self.is_authenticated();
        self.state = SessionState::Anonymous;
        self.clear_persisted()?;
        info!(
            "event=session_logout module=session status=ok was_authenticated={was_authenticated}"
        );
        Ok(())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Authenticated(session) => Some(session),
            SessionState::Unknown | SessionState::Anonymous => None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session().map(|session| &session.identity)
    }

    pub fn token(&self) -> Option<&str> {
        self.session().map(|session| session.token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    /// True until `bootstrap` has run.
    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Unknown
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn establish(&mut self, event: &'static str, verified: Verified) -> SessionResult<Identity> {
        if let Err(err) = self.persist(&verified) {
            warn!("event={event} module=session status=error error_code=persist_failed error={err}");
            if let Err(clear_err) = self.clear_persisted() {
                warn!(
                    "event={event} module=session status=error error_code=clear_failed error={clear_err}"
                );
            }
            self.state = SessionState::Anonymous;
            return Err(err);
        }

        let identity = verified.identity.clone();
        self.state = SessionState::Authenticated(Session {
            identity: verified.identity,
            token: verified.token,
        });
        info!("event={event} module=session status=ok");
        Ok(identity)
    }

    fn persist(&mut self, verified: &Verified) -> SessionResult<()> {
        let blob = serde_json::to_string(&verified.identity)?;
        self.store.set(AUTH_TOKEN_KEY, &verified.token)?;
        self.store.set(IDENTITY_KEY, &blob)?;
        Ok(())
    }

    fn read_persisted(&self) -> Result<Persisted, KvError> {
        let token = non_empty(self.store.get(AUTH_TOKEN_KEY)?);
        let blob = non_empty(self.store.get(IDENTITY_KEY)?);
        let (Some(token), Some(blob)) = (token, blob) else {
            return Ok(Persisted::Missing);
        };

        match serde_json::from_str::<Identity>(&blob) {
            Ok(identity) => Ok(Persisted::Found(Session { identity, token })),
            Err(err) => Ok(Persisted::Corrupt(err)),
        }
    }

    fn clear_persisted(&mut self) -> Result<(), KvError> {
        let token_result = self.store.remove(AUTH_TOKEN_KEY);
        let identity_result = self.store.remove(IDENTITY_KEY);
        token_result.and(identity_result)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}
