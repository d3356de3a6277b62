//! crates/taskboard_core/src/state/mod.rs
//!
//! The two state containers and the effects their reducers request.
//!
//! Reducers never touch storage themselves. They mutate their state and
//! return a list of [`Effect`]s which the [`crate::store::Store`] executes
//! synchronously against the [`crate::ports::LocalStorage`] port.

pub mod auth;
pub mod workspace;

pub use auth::{AuthAction, AuthOp, AuthState};
pub use workspace::{TaskSelector, WorkspaceAction, WorkspaceState};

use crate::domain::WorkspaceId;

/// A durable-storage side effect requested by a reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Delete the persisted session record.
    RemoveSession,
    /// Remember `id` as the last selected workspace.
    PersistSelection(WorkspaceId),
    /// Forget the last selected workspace.
    RemoveSelection,
}
