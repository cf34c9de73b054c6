//! Session context shared between a front end and the synchronizer.

use tokio::sync::watch;

use crate::auth::AuthUser;

/// Publishes the currently signed-in user (or none) to subscribers.
///
/// Injected explicitly wherever the current identity matters; there is no
/// ambient global. The synchronizer holds a subscription and clears its
/// collection when the user signs out.
#[derive(Debug, Clone)]
pub struct SessionContext {
    user: watch::Sender<Option<AuthUser>>,
}

impl SessionContext {
    /// Start signed out.
    #[must_use]
    pub fn new() -> Self {
        let (user, _) = watch::channel(None);
        Self { user }
    }

    /// Start with an already-restored user (e.g. from stored credentials).
    #[must_use]
    pub fn with_user(user: AuthUser) -> Self {
        let (sender, _) = watch::channel(Some(user));
        Self { user: sender }
    }

    pub fn sign_in(&self, user: AuthUser) {
        self.user.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        self.user.send_replace(None);
    }

    #[must_use]
    pub fn current_user(&self) -> Option<AuthUser> {
        self.user.borrow().clone()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.user.borrow().is_some()
    }

    /// Subscribe to identity changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.user.subscribe()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
