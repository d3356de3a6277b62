pub mod commands;
pub mod domain;
pub mod ports;
pub mod state;
pub mod storage;
pub mod store;

#[cfg(test)]
mod testing;

pub use domain::{
    Comment, CommentId, InviteMember, Project, ProjectDraft, ProjectId, ProjectStatus, Priority,
    Session, Task, TaskDraft, TaskId, TaskStatus, TaskType, User, UserId, Workspace,
    WorkspaceDraft, WorkspaceId, WorkspaceRole,
};
pub use ports::{
    AuthService, CommentService, LocalStorage, PortError, PortResult, ProjectService, RemoteApi,
    TaskService, WorkspaceService, CURRENT_WORKSPACE_KEY, SESSION_KEY,
};
pub use state::{AuthState, TaskSelector, WorkspaceState};
pub use storage::MemoryStorage;
pub use store::{Action, Store, StoreState};
