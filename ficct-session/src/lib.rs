//! FICCT Session - Client-side session state and access control
//!
//! This crate holds everything the client knows about "who is using it":
//!
//! - **Storage** ([`storage`]): key-value persistence for the four session keys
//! - **Store** ([`store`]): typed session reads/writes plus change notifications
//! - **Predicates** ([`context`]): role and permission checks for hiding controls
//! - **Guard** ([`guard`]): the `checking -> authenticated | redirecting` gate
//! - **Menu** ([`menu`]): role-filtered navigation
//!
//! None of this is a security boundary. The backend re-validates the bearer
//! token and role on every call; these checks only decide what to show.

pub mod context;
pub mod guard;
pub mod menu;
pub mod permissions;
pub mod role;
pub mod storage;
pub mod store;

pub use context::AuthContext;
pub use guard::{GuardState, GuardView, Navigator, RouteGuard, PUBLIC_ROOT};
pub use menu::{visible_items, MenuItem, MENU};
pub use permissions::PermissionSet;
pub use role::{Role, RoleRequirement};
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use store::{Session, SessionEvent, SessionStore, SESSION_KEYS};
