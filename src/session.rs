use crate::store::SessionStore;

/// The guest session the client currently trusts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub id: Option<String>,
}

/// Owns bootstrap, persistence and replacement of the guest session id.
///
/// The manager never talks to the catalog itself: when a new session is
/// needed, `ensure_session` and `invalidate` return `true` and the caller
/// issues the creation request, reporting back through `session_created` or
/// `creation_failed`. At most one creation is outstanding at a time.
pub struct GuestSessionManager {
    store: Box<dyn SessionStore>,
    session: Session,
    creating: bool,
    rejected: Option<String>,
}

impl GuestSessionManager {
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self {
            store,
            session: Session::default(),
            creating: false,
            rejected: None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.session.id.as_deref()
    }

    pub fn is_creating(&self) -> bool {
        self.creating
    }

    /// Adopt a stored id if there is one (without asking the catalog whether
    /// it is still valid). Returns `true` when a new session must be created.
    pub fn ensure_session(&mut self) -> bool {
        if self.session.id.is_some() || self.creating {
            return false;
        }

        match self.store.load() {
            Ok(Some(id)) if self.rejected.as_deref() != Some(id.as_str()) => {
                tracing::info!("Using stored guest session");
                self.session.id = Some(id);
                return false;
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Could not read stored guest session: {}", e),
        }

        tracing::info!("Requesting a new guest session");
        self.creating = true;
        true
    }

    /// Persist a freshly created id, then expose it.
    pub fn session_created(&mut self, id: String) {
        self.creating = false;
        if let Err(e) = self.store.save(&id) {
            tracing::warn!("Could not persist guest session: {}", e);
        }
        self.session.id = Some(id);
    }

    pub fn creation_failed(&mut self) {
        self.creating = false;
    }

    /// Drop the current id everywhere and start over. Returns `true` when a
    /// new session must be created.
    pub fn invalidate(&mut self) -> bool {
        tracing::info!("Guest session rejected by catalog, replacing it");
        self.rejected = self.session.id.take();
        if let Err(e) = self.store.clear() {
            tracing::warn!("Could not clear stored guest session: {}", e);
        }
        self.ensure_session()
    }

    /// Whether `id` is the session currently in use.
    pub fn is_current(&self, id: &str) -> bool {
        self.session.id.as_deref() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemorySessionStore, StoreError};

    #[test]
    fn test_stored_id_is_trusted() {
        let store = MemorySessionStore::with_id("stored");
        let mut manager = GuestSessionManager::new(Box::new(store));
        assert!(!manager.ensure_session());
        assert_eq!(manager.id(), Some("stored"));
        assert!(!manager.is_creating());
    }

    #[test]
    fn test_missing_id_requests_once() {
        let store = MemorySessionStore::default();
        let mut manager = GuestSessionManager::new(Box::new(store.clone()));
        assert!(manager.ensure_session());
        // Still pending: no second request.
        assert!(!manager.ensure_session());
        assert_eq!(manager.id(), None);

        manager.session_created("fresh".to_string());
        assert_eq!(manager.id(), Some("fresh"));
        assert_eq!(store.value().as_deref(), Some("fresh"));
        assert!(!manager.ensure_session());
    }

    #[test]
    fn test_failed_creation_can_be_retried_later() {
        let mut manager = GuestSessionManager::new(Box::new(MemorySessionStore::default()));
        assert!(manager.ensure_session());
        manager.creation_failed();
        assert!(manager.ensure_session());
    }

    #[test]
    fn test_invalidate_clears_store_and_requests_new() {
        let store = MemorySessionStore::with_id("old");
        let mut manager = GuestSessionManager::new(Box::new(store.clone()));
        manager.ensure_session();

        assert!(manager.invalidate());
        assert_eq!(manager.id(), None);
        assert_eq!(store.value(), None);
        assert_eq!(store.clears(), 1);
        assert!(!manager.is_current("old"));

        manager.session_created("new".to_string());
        assert!(manager.is_current("new"));
    }

    struct StickyStore;

    impl SessionStore for StickyStore {
        fn load(&self) -> Result<Option<String>, StoreError> {
            Ok(Some("old".to_string()))
        }

        fn save(&mut self, _id: &str) -> Result<(), StoreError> {
            Ok(())
        }

        fn clear(&mut self) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("read-only")))
        }
    }

    #[test]
    fn test_rejected_id_not_reloaded_when_clear_fails() {
        let mut manager = GuestSessionManager::new(Box::new(StickyStore));
        manager.ensure_session();
        assert_eq!(manager.id(), Some("old"));

        assert!(manager.invalidate());
        assert_eq!(manager.id(), None);
    }
}
