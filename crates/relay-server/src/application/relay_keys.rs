//! RelayService: resolves abstract keys and dispatches them to a backend.
//!
//! This use case sits at the application layer and delegates to a
//! [`BackendAdapter`] trait object.  Concrete adapters live in
//! [`super::adapters`]; the OS and hardware collaborators they drive live in
//! the infrastructure layer.
//!
//! The service is stateless per key: it never remembers which keys are held,
//! so a repeated hold-down or a release without a hold-down is forwarded to
//! the backend unchanged.

use std::sync::Arc;

use relay_core::{
    AbstractKey, BackendToken, KeyAction, KeyEventRequest, KeyMappingTable, MappingError,
    TokenKind,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Error type for a single backend action.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The hardware endpoint or OS primitive could not be reached or failed.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// The target window handle no longer refers to an open window.
    #[error("target window is no longer open")]
    WindowClosed,
    /// No window matched the startup query.
    #[error("no window matches {0}")]
    WindowNotFound(String),
    /// The token has a kind this backend cannot act on.
    #[error("backend cannot act on a {found} token")]
    UnsupportedToken { found: TokenKind },
    /// A name token that no synthesizer can interpret.
    #[error("invalid key name {0:?}")]
    InvalidKeyName(String),
}

/// Error type for a relayed request.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The key has no entry in the active mapping table.
    #[error("key {0} is not mapped for the active backend")]
    UnmappedKey(AbstractKey),
    /// The backend action failed.
    #[error("{action} of {key} failed: {source}")]
    Backend {
        key: AbstractKey,
        action: KeyAction,
        #[source]
        source: BackendError,
    },
}

/// Backend-agnostic key action trait.
///
/// Each backend (hardware injection, focus-gated synthesis, dry run) provides
/// an implementation.  Calls are synchronous: the result of the underlying
/// transport or OS call is the result of the method.
pub trait BackendAdapter: Send + Sync {
    /// The single token kind this backend acts on.
    fn token_kind(&self) -> TokenKind;

    /// Complete key stroke.
    fn press(&self, token: &BackendToken) -> Result<(), BackendError>;

    /// Key-down only.
    fn hold_down(&self, token: &BackendToken) -> Result<(), BackendError>;

    /// Key-up only.
    fn release(&self, token: &BackendToken) -> Result<(), BackendError>;

    /// Whether at most one call may be in flight at a time.
    fn requires_exclusive_dispatch(&self) -> bool {
        false
    }
}

/// The relay use case.
///
/// Owns the mapping table for the process lifetime and shares the adapter.
pub struct RelayService {
    table: KeyMappingTable,
    adapter: Arc<dyn BackendAdapter>,
}

impl RelayService {
    /// Binds a mapping table to an adapter.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::TokenKind`] if any token in `table` is of a kind
    /// the adapter does not accept.
    pub fn new(
        table: KeyMappingTable,
        adapter: Arc<dyn BackendAdapter>,
    ) -> Result<Self, MappingError> {
        table.ensure_token_kind(adapter.token_kind())?;
        Ok(Self { table, adapter })
    }

    pub fn table(&self) -> &KeyMappingTable {
        &self.table
    }

    /// Whether the bound adapter needs single-worker dispatch.
    pub fn requires_exclusive_dispatch(&self) -> bool {
        self.adapter.requires_exclusive_dispatch()
    }

    /// Resolves the request's key and performs its action on the backend.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::UnmappedKey`] if the key has no table entry, or
    /// [`RelayError::Backend`] if the backend call fails.  Nothing is retried.
    pub fn dispatch(&self, request: KeyEventRequest) -> Result<(), RelayError> {
        let KeyEventRequest { key, action } = request;
        let token = self.table.resolve(key).map_err(|_| {
            warn!(%key, %action, "request for unmapped key");
            RelayError::UnmappedKey(key)
        })?;

        debug!(%key, %action, %token, "dispatching key event");
        let result = match action {
            KeyAction::Press => self.adapter.press(token),
            KeyAction::HoldDown => self.adapter.hold_down(token),
            KeyAction::Release => self.adapter.release(token),
        };

        result.map_err(|source| {
            warn!(%key, %action, error = %source, "backend action failed");
            RelayError::Backend { key, action, source }
        })
    }

    /// `Send`: press `key`.
    pub fn send(&self, key: AbstractKey) -> Result<(), RelayError> {
        self.dispatch(KeyEventRequest::new(key, KeyAction::Press))
    }

    /// `SendUp`: release `key`.
    pub fn send_up(&self, key: AbstractKey) -> Result<(), RelayError> {
        self.dispatch(KeyEventRequest::new(key, KeyAction::Release))
    }

    /// `SendDown`: hold `key` down.
    pub fn send_down(&self, key: AbstractKey) -> Result<(), RelayError> {
        self.dispatch(KeyEventRequest::new(key, KeyAction::HoldDown))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // ── Recording adapter ─────────────────────────────────────────────────────

    struct RecordingAdapter {
        kind: TokenKind,
        calls: Mutex<Vec<(KeyAction, BackendToken)>>,
        should_fail: bool,
    }

    impl RecordingAdapter {
        fn new(kind: TokenKind) -> Self {
            Self {
                kind,
                calls: Mutex::new(Vec::new()),
                should_fail: false,
            }
        }

        fn record(&self, action: KeyAction, token: &BackendToken) -> Result<(), BackendError> {
            if self.should_fail {
                return Err(BackendError::Unavailable("injected failure".to_string()));
            }
            self.calls.lock().unwrap().push((action, token.clone()));
            Ok(())
        }
    }

    impl BackendAdapter for RecordingAdapter {
        fn token_kind(&self) -> TokenKind {
            self.kind
        }

        fn press(&self, token: &BackendToken) -> Result<(), BackendError> {
            self.record(KeyAction::Press, token)
        }

        fn hold_down(&self, token: &BackendToken) -> Result<(), BackendError> {
            self.record(KeyAction::HoldDown, token)
        }

        fn release(&self, token: &BackendToken) -> Result<(), BackendError> {
            self.record(KeyAction::Release, token)
        }
    }

    fn arrows_table() -> KeyMappingTable {
        KeyMappingTable::new([
            (AbstractKey::Up, BackendToken::Keycode(82)),
            (AbstractKey::Down, BackendToken::Keycode(81)),
        ])
        .unwrap()
    }

    fn make_service(adapter: RecordingAdapter) -> (RelayService, Arc<RecordingAdapter>) {
        let adapter = Arc::new(adapter);
        let service = RelayService::new(
            arrows_table(),
            Arc::clone(&adapter) as Arc<dyn BackendAdapter>,
        )
        .unwrap();
        (service, adapter)
    }

    // ── Operation mapping ─────────────────────────────────────────────────────

    #[test]
    fn test_send_maps_to_press() {
        // Arrange
        let (service, adapter) = make_service(RecordingAdapter::new(TokenKind::Keycode));

        // Act
        service.send(AbstractKey::Up).unwrap();

        // Assert
        assert_eq!(
            *adapter.calls.lock().unwrap(),
            vec![(KeyAction::Press, BackendToken::Keycode(82))]
        );
    }

    #[test]
    fn test_send_down_then_send_up_maps_to_hold_then_release() {
        // Arrange
        let (service, adapter) = make_service(RecordingAdapter::new(TokenKind::Keycode));

        // Act
        service.send_down(AbstractKey::Up).unwrap();
        service.send_up(AbstractKey::Up).unwrap();

        // Assert
        assert_eq!(
            *adapter.calls.lock().unwrap(),
            vec![
                (KeyAction::HoldDown, BackendToken::Keycode(82)),
                (KeyAction::Release, BackendToken::Keycode(82)),
            ]
        );
    }

    #[test]
    fn test_stray_release_and_double_hold_are_forwarded_unchanged() {
        // Arrange
        let (service, adapter) = make_service(RecordingAdapter::new(TokenKind::Keycode));

        // Act
        service.send_up(AbstractKey::Down).unwrap();
        service.send_down(AbstractKey::Down).unwrap();
        service.send_down(AbstractKey::Down).unwrap();

        // Assert
        let actions: Vec<KeyAction> = adapter.calls.lock().unwrap().iter().map(|c| c.0).collect();
        assert_eq!(
            actions,
            vec![KeyAction::Release, KeyAction::HoldDown, KeyAction::HoldDown]
        );
    }

    // ── Failures ──────────────────────────────────────────────────────────────

    #[test]
    fn test_unmapped_key_fails_without_backend_call() {
        // Arrange
        let (service, adapter) = make_service(RecordingAdapter::new(TokenKind::Keycode));

        // Act
        let result = service.send(AbstractKey::Enter);

        // Assert
        assert!(matches!(result, Err(RelayError::UnmappedKey(AbstractKey::Enter))));
        assert!(adapter.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_backend_failure_is_surfaced_with_key_and_action() {
        // Arrange
        let mut adapter = RecordingAdapter::new(TokenKind::Keycode);
        adapter.should_fail = true;
        let (service, _adapter) = make_service(adapter);

        // Act
        let result = service.send_down(AbstractKey::Down);

        // Assert
        match result {
            Err(RelayError::Backend { key, action, source }) => {
                assert_eq!(key, AbstractKey::Down);
                assert_eq!(action, KeyAction::HoldDown);
                assert!(matches!(source, BackendError::Unavailable(_)));
            }
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[test]
    fn test_failure_does_not_affect_next_request() {
        // Arrange
        let (service, adapter) = make_service(RecordingAdapter::new(TokenKind::Keycode));
        let _ = service.send(AbstractKey::Left);

        // Act
        let result = service.send(AbstractKey::Up);

        // Assert
        assert!(result.is_ok());
        assert_eq!(adapter.calls.lock().unwrap().len(), 1);
    }

    // ── Construction ──────────────────────────────────────────────────────────

    #[test]
    fn test_new_rejects_table_of_wrong_token_kind() {
        // Arrange
        let adapter: Arc<dyn BackendAdapter> = Arc::new(RecordingAdapter::new(TokenKind::Name));

        // Act
        let result = RelayService::new(arrows_table(), adapter);

        // Assert
        assert!(matches!(result, Err(MappingError::TokenKind { .. })));
    }

    #[test]
    fn test_default_dispatch_policy_is_concurrent() {
        let (service, _) = make_service(RecordingAdapter::new(TokenKind::Keycode));
        assert!(!service.requires_exclusive_dispatch());
    }
}
