//! Session Store - typed access to the persisted session
//!
//! The session lives under four storage keys: `token`, `user` (JSON),
//! `rol` and `permisos` (JSON array). Everything in the client reads them
//! through a [`SessionStore`] handed to it, never from storage directly.

use crate::permissions::PermissionSet;
use crate::role::Role;
use crate::storage::{FileStorage, MemoryStorage, SessionStorage};
use ficct_core::{FicctResult, SessionConfig, StorageBackend};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const ROLE_KEY: &str = "rol";
pub const PERMISSIONS_KEY: &str = "permisos";

/// Every key owned by the session
pub const SESSION_KEYS: [&str; 4] = [TOKEN_KEY, USER_KEY, ROLE_KEY, PERMISSIONS_KEY];

/// Snapshot of the stored session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<Value>,
    pub role: Option<Role>,
    pub permissions: PermissionSet,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Display name taken from the stored user record, if it has one
    pub fn user_name(&self) -> Option<&str> {
        let user = self.user.as_ref()?;
        ["name", "nombre", "email"]
            .iter()
            .find_map(|field| user.get(field).and_then(Value::as_str))
    }
}

/// Notification sent whenever the session is written or cleared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Established { role: Option<Role> },
    Cleared,
}

/// Typed handle over the session keys
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self { storage, events }
    }

    /// Store kept in process memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Store built from the `[session]` configuration section
    pub fn from_config(config: &SessionConfig) -> Self {
        match config.backend {
            StorageBackend::Memory => Self::in_memory(),
            StorageBackend::File => Self::new(Arc::new(FileStorage::new(config.resolved_path()))),
        }
    }

    /// Persist all four session values, replacing whatever was there
    pub fn set_session(
        &self,
        token: &str,
        user: &Value,
        role: Option<Role>,
        permissions: &PermissionSet,
    ) -> FicctResult<()> {
        let entries = [
            (TOKEN_KEY, token.to_string()),
            (USER_KEY, user.to_string()),
            (ROLE_KEY, role.map(|r| r.as_str()).unwrap_or_default().to_string()),
            (PERMISSIONS_KEY, Value::from(permissions.to_vec()).to_string()),
        ];
        self.storage.set_many(&entries)?;

        info!(role = ?role, permissions = permissions.len(), "Session established");
        let _ = self.events.send(SessionEvent::Established { role });
        Ok(())
    }

    /// Remove all four session values; calling it again is harmless
    pub fn clear_session(&self) -> FicctResult<()> {
        let had_session = self.is_authenticated();
        self.storage.remove_many(&SESSION_KEYS)?;

        if had_session {
            info!("Session cleared");
            let _ = self.events.send(SessionEvent::Cleared);
        } else {
            debug!("Session clear requested with no active session");
        }
        Ok(())
    }

    /// Stored bearer token; empty strings count as absent
    pub fn token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.storage
            .get(ROLE_KEY)
            .and_then(|value| Role::from_wire(&value))
    }

    /// Stored permission names; an absent or malformed list is empty
    pub fn permissions(&self) -> PermissionSet {
        let Some(raw) = self.storage.get(PERMISSIONS_KEY) else {
            return PermissionSet::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring malformed stored permissions: {}", e);
            PermissionSet::new()
        })
    }

    /// Stored user record; a malformed record is treated as no user
    pub fn user(&self) -> Option<Value> {
        let raw = self.storage.get(USER_KEY)?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Null) => None,
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Ignoring malformed stored user record: {}", e);
                None
            }
        }
    }

    pub fn snapshot(&self) -> Session {
        Session {
            token: self.token(),
            user: self.user(),
            role: self.role(),
            permissions: self.permissions(),
        }
    }

    /// Subscribe to session changes made through this store or its clones
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Raw storage, for callers that persist extra keys of their own
    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .field("role", &self.role())
            .finish()
    }
}
