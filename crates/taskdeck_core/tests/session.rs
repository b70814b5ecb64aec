use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use taskdeck_core::{
    AuthError, CredentialValidationError, Identity, KeyValueStore, KvError, KvResult,
    LoginCredentials, MemoryKvStore, RegisterCredentials, SessionError, SessionHolder,
    SessionState, StubVerifier, Verified, Verifier, AUTH_TOKEN_KEY, IDENTITY_KEY,
};

/// Verifier that counts calls and accepts only one password.
#[derive(Default)]
struct CountingVerifier {
    calls: AtomicUsize,
}

impl CountingVerifier {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn verified(email: &str, name: &str) -> Verified {
        Verified {
            identity: Identity {
                id: "42".to_string(),
                name: name.to_string(),
                email: email.to_string(),
                avatar: None,
            },
            token: "token-42".to_string(),
        }
    }
}

#[async_trait]
impl Verifier for CountingVerifier {
    async fn login(&self, credentials: &LoginCredentials) -> Result<Verified, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if credentials.password != "correct" {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(Self::verified(&credentials.email, "Known User"))
    }

    async fn register(&self, credentials: &RegisterCredentials) -> Result<Verified, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if credentials.email.ends_with("@taken.example") {
            return Err(AuthError::Rejected("email already registered".to_string()));
        }
        Ok(Self::verified(&credentials.email, &credentials.name))
    }
}

/// Store whose writes can be switched off.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryKvStore,
    fail_reads: bool,
    fail_writes: bool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        if self.fail_reads {
            return Err(KvError::Unavailable("read disabled".to_string()));
        }
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> KvResult<()> {
        if self.fail_writes {
            return Err(KvError::Unavailable("write disabled".to_string()));
        }
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> KvResult<()> {
        self.inner.remove(key)
    }
}

fn register_input(password: &str, confirm: &str) -> RegisterCredentials {
    RegisterCredentials {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        password: password.to_string(),
        confirm_password: confirm.to_string(),
    }
}

fn persisted_store(token: &str, identity_blob: &str) -> MemoryKvStore {
    let mut store = MemoryKvStore::new();
    store.set(AUTH_TOKEN_KEY, token).unwrap();
    store.set(IDENTITY_KEY, identity_blob).unwrap();
    store
}

#[test]
fn new_holder_is_unknown_until_bootstrap() {
    let mut holder = SessionHolder::new(MemoryKvStore::new());
    assert_eq!(holder.state(), &SessionState::Unknown);
    assert!(holder.is_loading());

    assert_eq!(holder.bootstrap(), &SessionState::Anonymous);
    assert!(!holder.is_loading());
    assert!(holder.identity().is_none());
}

#[test]
fn bootstrap_restores_well_formed_session() {
    let store = persisted_store(
        "tok",
        r#"{"id":"1","name":"John Doe","email":"john@example.com"}"#,
    );
    let mut holder = SessionHolder::new(store);

    holder.bootstrap();

    assert!(holder.is_authenticated());
    assert_eq!(holder.token(), Some("tok"));
    let identity = holder.identity().unwrap();
    assert_eq!(identity.name, "John Doe");
    assert_eq!(identity.avatar, None);
}

#[test]
fn bootstrap_with_corrupt_identity_clears_both_keys() {
    let store = persisted_store("tok", "{not json");
    let mut holder = SessionHolder::new(store);

    assert_eq!(holder.bootstrap(), &SessionState::Anonymous);

    let store = holder.into_store();
    assert!(store.get(AUTH_TOKEN_KEY).unwrap().is_none());
    assert!(store.get(IDENTITY_KEY).unwrap().is_none());
}

#[test]
fn bootstrap_with_wrong_identity_shape_is_treated_as_corrupt() {
    let store = persisted_store("tok", r#"{"id":"1"}"#);
    let mut holder = SessionHolder::new(store);

    assert_eq!(holder.bootstrap(), &SessionState::Anonymous);
    assert!(holder.store().is_empty());
}

#[test]
fn bootstrap_with_partial_or_empty_entries_is_anonymous_without_clearing() {
    let mut store = MemoryKvStore::new();
    store.set(AUTH_TOKEN_KEY, "").unwrap();
    store
        .set(IDENTITY_KEY, r#"{"id":"1","name":"n","email":"e"}"#)
        .unwrap();
    let mut holder = SessionHolder::new(store);

    assert_eq!(holder.bootstrap(), &SessionState::Anonymous);
    assert_eq!(holder.store().len(), 2);
}

#[test]
fn bootstrap_survives_unreadable_store() {
    let store = FlakyStore {
        fail_reads: true,
        ..FlakyStore::default()
    };
    let mut holder = SessionHolder::new(store);
    assert_eq!(holder.bootstrap(), &SessionState::Anonymous);
}

#[tokio::test]
async fn login_success_persists_token_and_identity() {
    let verifier = CountingVerifier::default();
    let mut holder = SessionHolder::new(MemoryKvStore::new());
    holder.bootstrap();

    let identity = holder
        .login(
            &LoginCredentials::new("known@example.com", "correct"),
            &verifier,
        )
        .await
        .unwrap();

    assert_eq!(identity.email, "known@example.com");
    assert_eq!(holder.identity(), Some(&identity));
    assert_eq!(holder.token(), Some("token-42"));

    let stored_blob = holder.store().get(IDENTITY_KEY).unwrap().unwrap();
    let stored: Identity = serde_json::from_str(&stored_blob).unwrap();
    assert_eq!(stored, identity);
    assert_eq!(
        holder.store().get(AUTH_TOKEN_KEY).unwrap().as_deref(),
        Some("token-42")
    );
}

#[tokio::test]
async fn persisted_login_round_trips_through_bootstrap() {
    let mut holder = SessionHolder::new(MemoryKvStore::new());
    holder.bootstrap();
    let identity = holder
        .login(
            &LoginCredentials::new("known@example.com", "correct"),
            &CountingVerifier::default(),
        )
        .await
        .unwrap();

    let mut restored = SessionHolder::new(holder.into_store());
    restored.bootstrap();
    assert_eq!(restored.identity(), Some(&identity));
    assert_eq!(restored.token(), Some("token-42"));
}

#[tokio::test]
async fn login_failure_stays_anonymous_and_surfaces_auth_error() {
    let verifier = CountingVerifier::default();
    let mut holder = SessionHolder::new(MemoryKvStore::new());
    holder.bootstrap();

    let err = holder
        .login(&LoginCredentials::new("known@example.com", "wrong"), &verifier)
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Auth(AuthError::InvalidCredentials)));
    assert_eq!(holder.state(), &SessionState::Anonymous);
    assert!(holder.store().is_empty());
    assert_eq!(verifier.calls(), 1);
}

#[tokio::test]
async fn register_with_mismatched_confirmation_never_calls_verifier() {
    let verifier = CountingVerifier::default();
    let mut holder = SessionHolder::new(MemoryKvStore::new());
    holder.bootstrap();

    let err = holder
        .register(&register_input("secret", "secreT"), &verifier)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SessionError::Validation(CredentialValidationError::PasswordMismatch)
    ));
    assert_eq!(verifier.calls(), 0);
    assert_eq!(holder.state(), &SessionState::Anonymous);
}

#[tokio::test]
async fn register_success_uses_given_name() {
    let verifier = CountingVerifier::default();
    let mut holder = SessionHolder::new(MemoryKvStore::new());
    holder.bootstrap();

    let identity = holder
        .register(&register_input("secret", "secret"), &verifier)
        .await
        .unwrap();

    assert_eq!(identity.name, "Ada Lovelace");
    assert!(holder.is_authenticated());
    assert_eq!(verifier.calls(), 1);
}

#[tokio::test]
async fn register_rejected_by_verifier_surfaces_auth_error() {
    let mut holder = SessionHolder::new(MemoryKvStore::new());
    holder.bootstrap();
    let mut input = register_input("pw", "pw");
    input.email = "ada@taken.example".to_string();

    let err = holder
        .register(&input, &CountingVerifier::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Auth(AuthError::Rejected(_))));
    assert!(!holder.is_authenticated());
}

#[tokio::test]
async fn persist_failure_leaves_holder_anonymous_and_store_clean() {
    let store = FlakyStore {
        fail_writes: true,
        ..FlakyStore::default()
    };
    let mut holder = SessionHolder::new(store);
    holder.bootstrap();

    let err = holder
        .login(
            &LoginCredentials::new("known@example.com", "correct"),
            &CountingVerifier::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::Store(_)));
    assert_eq!(holder.state(), &SessionState::Anonymous);
    assert!(holder.into_store().inner.is_empty());
}

#[tokio::test]
async fn logout_clears_store_and_is_idempotent() {
    let mut holder = SessionHolder::new(MemoryKvStore::new());
    holder.bootstrap();
    holder
        .login(
            &LoginCredentials::new("someone@example.com", "anything"),
            &StubVerifier::default(),
        )
        .await
        .unwrap();
    assert!(holder.is_authenticated());

    holder.logout().unwrap();
    assert_eq!(holder.state(), &SessionState::Anonymous);
    assert!(holder.store().is_empty());

    holder.logout().unwrap();
    assert_eq!(holder.state(), &SessionState::Anonymous);
}

#[tokio::test]
async fn stub_verifier_accepts_everything() {
    let verifier = StubVerifier::with_display_name("John Doe");

    let login = verifier
        .login(&LoginCredentials::new("john@example.com", ""))
        .await
        .unwrap();
    assert_eq!(login.identity.name, "John Doe");
    assert_eq!(login.identity.email, "john@example.com");
    assert!(!login.token.is_empty());

    let registered = verifier
        .register(&register_input("x", "x"))
        .await
        .unwrap();
    assert_eq!(registered.identity.name, "Ada Lovelace");
    assert_ne!(registered.token, login.token);
}

#[tokio::test]
async fn dropped_login_future_leaves_state_untouched() {
    let mut holder = SessionHolder::new(MemoryKvStore::new());
    holder.bootstrap();

    let credentials = LoginCredentials::new("known@example.com", "correct");
    let verifier = StubVerifier::default();
    {
        let pending = holder.login(&credentials, &verifier);
        drop(pending);
    }

    assert_eq!(holder.state(), &SessionState::Anonymous);
    assert!(holder.store().is_empty());
}

#[tokio::test]
async fn holder_can_borrow_an_external_store() {
    let mut store = MemoryKvStore::new();
    {
        let mut holder = SessionHolder::new(&mut store);
        holder.bootstrap();
        holder
            .login(
                &LoginCredentials::new("known@example.com", "correct"),
                &StubVerifier::default(),
            )
            .await
            .unwrap();
    }
    assert_eq!(store.len(), 2);
}
