//! Route Guard
//!
//! Gate in front of a protected subtree. It starts in `Checking`, where only
//! a loading indicator is shown, and settles exactly once into either
//! `Authenticated` (children are mounted) or `Redirecting` (one navigation
//! to the public root, nothing rendered).

use crate::context::AuthContext;
use crate::role::RoleRequirement;
use crate::store::{SessionEvent, SessionStore};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Public entry point unauthenticated sessions are sent to
pub const PUBLIC_ROOT: &str = "/";

/// Client-side navigation
pub trait Navigator: Send + Sync {
    /// Replace the current location without adding a history entry
    fn replace(&self, path: &str);
}

impl<N: Navigator + ?Sized> Navigator for std::sync::Arc<N> {
    fn replace(&self, path: &str) {
        (**self).replace(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authenticated,
    Redirecting,
}

/// What the guarded layout should render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardView {
    Loading,
    Children,
    Nothing,
}

pub struct RouteGuard<N: Navigator> {
    navigator: N,
    state: GuardState,
    public_root: String,
    requirement: Option<RoleRequirement>,
    redirect_target: Option<String>,
}

impl<N: Navigator> RouteGuard<N> {
    pub fn new(navigator: N) -> Self {
        Self {
            navigator,
            state: GuardState::Checking,
            public_root: PUBLIC_ROOT.to_string(),
            requirement: None,
            redirect_target: None,
        }
    }

    pub fn with_public_root(mut self, path: impl Into<String>) -> Self {
        self.public_root = path.into();
        self
    }

    /// Restrict the subtree to a role-scoped dashboard
    pub fn with_requirement(mut self, requirement: impl Into<RoleRequirement>) -> Self {
        self.requirement = Some(requirement.into());
        self
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Where the guard navigated to, once it has redirected
    pub fn redirect_target(&self) -> Option<&str> {
        self.redirect_target.as_deref()
    }

    pub fn render(&self) -> GuardView {
        match self.state {
            GuardState::Checking => GuardView::Loading,
            GuardState::Authenticated => GuardView::Children,
            GuardState::Redirecting => GuardView::Nothing,
        }
    }

    /// Run the authentication check; only the first call has any effect
    pub fn check(&mut self, store: &SessionStore) -> GuardState {
        if self.state != GuardState::Checking {
            return self.state;
        }

        let session = store.snapshot();
        if !session.is_authenticated() {
            debug!("No session token, redirecting to {}", self.public_root);
            let target = self.public_root.clone();
            self.redirect(target);
            return self.state;
        }

        if let Some(requirement) = &self.requirement {
            let ctx = AuthContext::from_session(&session);
            if !ctx.can_access(requirement.clone()) {
                let target = ctx
                    .role()
                    .map(|role| role.home_path().to_string())
                    .unwrap_or_else(|| self.public_root.clone());
                info!(role = ?ctx.role(), "Role not allowed here, redirecting to {}", target);
                self.redirect(target);
                return self.state;
            }
        }

        self.state = GuardState::Authenticated;
        self.state
    }

    /// React to a session change while mounted
    pub fn on_session_event(&mut self, event: &SessionEvent) {
        if self.state == GuardState::Authenticated && *event == SessionEvent::Cleared {
            info!("Session cleared while mounted, redirecting");
            let target = self.public_root.clone();
            self.redirect(target);
        }
    }

    /// Follow session changes until the guard redirects or the store goes away
    ///
    /// Only an authenticated guard has anything to watch for; any other
    /// state is returned as is.
    pub async fn watch(&mut self, mut events: broadcast::Receiver<SessionEvent>) -> GuardState {
        while self.state == GuardState::Authenticated {
            match events.recv().await {
                Ok(event) => self.on_session_event(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Guard lagged behind session events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        self.state
    }

    fn redirect(&mut self, target: String) {
        self.state = GuardState::Redirecting;
        self.navigator.replace(&target);
        self.redirect_target = Some(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionSet;
    use crate::role::Role;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingNavigator {
        calls: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn replace(&self, path: &str) {
            self.calls.lock().push(path.to_string());
        }
    }

    fn logged_in(role: Role) -> SessionStore {
        let store = SessionStore::in_memory();
        store
            .set_session("abc", &json!({}), Some(role), &PermissionSet::new())
            .unwrap();
        store
    }

    #[test]
    fn test_starts_checking_and_shows_loading() {
        let guard = RouteGuard::new(RecordingNavigator::default());
        assert_eq!(guard.state(), GuardState::Checking);
        assert_eq!(guard.render(), GuardView::Loading);
    }

    #[test]
    fn test_without_token_redirects_once() {
        let navigator = Arc::new(RecordingNavigator::default());
        let store = SessionStore::in_memory();
        let mut guard = RouteGuard::new(navigator.clone());

        assert_eq!(guard.check(&store), GuardState::Redirecting);
        assert_eq!(guard.check(&store), GuardState::Redirecting);

        assert_eq!(guard.render(), GuardView::Nothing);
        assert_eq!(*navigator.calls.lock(), vec!["/".to_string()]);
        assert_eq!(guard.redirect_target(), Some("/"));
    }

    #[test]
    fn test_with_token_renders_children() {
        let navigator = Arc::new(RecordingNavigator::default());
        let store = logged_in(Role::Docente);
        let mut guard = RouteGuard::new(navigator.clone());

        assert_eq!(guard.check(&store), GuardState::Authenticated);
        assert_eq!(guard.render(), GuardView::Children);
        assert!(navigator.calls.lock().is_empty());
    }

    #[test]
    fn test_check_runs_once_per_mount() {
        let navigator = Arc::new(RecordingNavigator::default());
        let store = logged_in(Role::Docente);
        let mut guard = RouteGuard::new(navigator.clone());
        guard.check(&store);

        store.clear_session().unwrap();
        assert_eq!(guard.check(&store), GuardState::Authenticated);
        assert!(navigator.calls.lock().is_empty());
    }

    #[test]
    fn test_role_gate_sends_to_own_dashboard() {
        let navigator = Arc::new(RecordingNavigator::default());
        let store = logged_in(Role::Docente);
        let mut guard =
            RouteGuard::new(navigator.clone()).with_requirement([Role::Admin, Role::Coordinador]);

        assert_eq!(guard.check(&store), GuardState::Redirecting);
        assert_eq!(*navigator.calls.lock(), vec!["/docente".to_string()]);
    }

    #[test]
    fn test_role_gate_without_known_role_goes_to_public_root() {
        let navigator = Arc::new(RecordingNavigator::default());
        let store = SessionStore::in_memory();
        store
            .set_session("abc", &json!({}), None, &PermissionSet::new())
            .unwrap();
        let mut guard = RouteGuard::new(navigator.clone()).with_requirement(Role::Docente);
        assert_eq!(guard.check(&store), GuardState::Redirecting);
        assert_eq!(guard.redirect_target(), Some("/"));

        let navigator = Arc::new(RecordingNavigator::default());
        let store = logged_in(Role::Docente);
        store
            .storage()
            .set(crate::store::ROLE_KEY, "superuser")
            .unwrap();
        let mut guard = RouteGuard::new(navigator.clone())
            .with_public_root("/login")
            .with_requirement([Role::Coordinador]);
        assert_eq!(guard.check(&store), GuardState::Redirecting);
        assert_eq!(*navigator.calls.lock(), vec!["/login".to_string()]);
    }

    #[test]
    fn test_role_gate_lets_admin_through() {
        let navigator = Arc::new(RecordingNavigator::default());
        let store = logged_in(Role::Admin);
        let mut guard = RouteGuard::new(navigator.clone()).with_requirement(Role::Coordinador);

        assert_eq!(guard.check(&store), GuardState::Authenticated);
    }

    #[test]
    fn test_custom_public_root() {
        let navigator = Arc::new(RecordingNavigator::default());
        let mut guard = RouteGuard::new(navigator.clone()).with_public_root("/login");
        guard.check(&SessionStore::in_memory());
        assert_eq!(*navigator.calls.lock(), vec!["/login".to_string()]);
    }

    #[tokio::test]
    async fn test_watch_reacts_to_logout_elsewhere() {
        let navigator = Arc::new(RecordingNavigator::default());
        let store = logged_in(Role::Coordinador);
        let mut guard = RouteGuard::new(navigator.clone());
        guard.check(&store);

        let events = store.subscribe();
        let other_tab = store.clone();
        let logout = tokio::spawn(async move {
            other_tab.clear_session().unwrap();
        });

        let state = guard.watch(events).await;
        logout.await.unwrap();

        assert_eq!(state, GuardState::Redirecting);
        assert_eq!(*navigator.calls.lock(), vec!["/".to_string()]);
    }

    #[tokio::test]
    async fn test_watch_returns_at_once_unless_authenticated() {
        let store = logged_in(Role::Docente);
        let mut guard = RouteGuard::new(RecordingNavigator::default());
        let state = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            guard.watch(store.subscribe()),
        )
        .await
        .unwrap();
        assert_eq!(state, GuardState::Checking);

        let mut guard = RouteGuard::new(RecordingNavigator::default());
        guard.check(&SessionStore::in_memory());
        let state = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            guard.watch(store.subscribe()),
        )
        .await
        .unwrap();
        assert_eq!(state, GuardState::Redirecting);
    }

    #[test]
    fn test_events_ignored_before_authentication() {
        let navigator = Arc::new(RecordingNavigator::default());
        let mut guard = RouteGuard::new(navigator.clone());
        guard.on_session_event(&SessionEvent::Cleared);
        assert_eq!(guard.state(), GuardState::Checking);
        assert!(navigator.calls.lock().is_empty());
    }
}
