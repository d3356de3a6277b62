//! crates/taskboard_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on.
//! These traits form the boundary of the hexagonal architecture: the remote
//! REST API and the durable local storage are provided by adapters in the
//! `client` service, and by in-memory fakes in tests.

use async_trait::async_trait;

use crate::domain::{
    Comment, CommentId, InviteMember, Project, ProjectDraft, ProjectId, Session, Task, TaskDraft,
    TaskId, Workspace, WorkspaceDraft, WorkspaceId,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// Shown for every failure to reach the server, regardless of the transport cause.
pub const UNREACHABLE_MESSAGE: &str =
    "Unable to connect to the server. Please make sure the backend is running.";

/// The error type for all port operations.
///
/// The `Display` output of each variant is the human-readable message surfaced
/// in the `error` fields of the state containers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// Input rejected before any request was sent.
    #[error("{0}")]
    Validation(String),
    /// The server answered 401. Outside of login and register this means the
    /// stored session is no longer valid.
    #[error("{0}")]
    Unauthorized(String),
    /// Any other non-2xx response, with the message extracted from its body.
    #[error("{message}")]
    Request { status: u16, message: String },
    /// The server could not be reached. The payload is the underlying cause, for logs.
    #[error("{}", UNREACHABLE_MESSAGE)]
    Transport(String),
    /// A 2xx response whose body did not have the expected shape.
    #[error("Unexpected response from server: {0}")]
    Decode(String),
    #[error("{0} not found")]
    NotFound(String),
    /// Durable local storage could not be written.
    #[error("Local storage error: {0}")]
    Storage(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Remote API Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> PortResult<Session>;

    async fn register(&self, name: &str, email: &str, password: &str) -> PortResult<Session>;
}

#[async_trait]
pub trait WorkspaceService: Send + Sync {
    async fn list_workspaces(&self) -> PortResult<Vec<Workspace>>;

    async fn get_workspace(&self, id: &WorkspaceId) -> PortResult<Workspace>;

    async fn create_workspace(&self, draft: &WorkspaceDraft) -> PortResult<Workspace>;

    async fn update_workspace(
        &self,
        id: &WorkspaceId,
        draft: &WorkspaceDraft,
    ) -> PortResult<Workspace>;

    async fn delete_workspace(&self, id: &WorkspaceId) -> PortResult<()>;

    async fn add_workspace_member(
        &self,
        id: &WorkspaceId,
        invite: &InviteMember,
    ) -> PortResult<()>;
}

#[async_trait]
pub trait ProjectService: Send + Sync {
    async fn list_projects(&self) -> PortResult<Vec<Project>>;

    async fn list_workspace_projects(&self, workspace_id: &WorkspaceId) -> PortResult<Vec<Project>>;

    async fn get_project(&self, id: &ProjectId) -> PortResult<Project>;

    async fn create_project(&self, draft: &ProjectDraft) -> PortResult<Project>;

    async fn update_project(&self, id: &ProjectId, draft: &ProjectDraft) -> PortResult<Project>;

    async fn delete_project(&self, id: &ProjectId) -> PortResult<()>;

    async fn add_project_member(&self, id: &ProjectId, email: &str) -> PortResult<()>;
}

#[async_trait]
pub trait TaskService: Send + Sync {
    async fn list_tasks(&self) -> PortResult<Vec<Task>>;

    async fn list_project_tasks(&self, project_id: &ProjectId) -> PortResult<Vec<Task>>;

    async fn get_task(&self, id: &TaskId) -> PortResult<Task>;

    async fn create_task(&self, draft: &TaskDraft) -> PortResult<Task>;

    async fn update_task(&self, id: &TaskId, draft: &TaskDraft) -> PortResult<Task>;

    async fn delete_task(&self, id: &TaskId) -> PortResult<()>;
}

#[async_trait]
pub trait CommentService: Send + Sync {
    async fn list_comments(&self, task_id: &TaskId) -> PortResult<Vec<Comment>>;

    async fn create_comment(&self, task_id: &TaskId, content: &str) -> PortResult<Comment>;

    async fn delete_comment(&self, id: &CommentId) -> PortResult<()>;
}

/// The whole remote API, as consumed by the store and the commands.
pub trait RemoteApi:
    AuthService + WorkspaceService + ProjectService + TaskService + CommentService
{
}

impl<T> RemoteApi for T where
    T: AuthService + WorkspaceService + ProjectService + TaskService + CommentService
{
}

//=========================================================================================
// Durable Local Storage Port
//=========================================================================================

/// Storage key of the serialized [`Session`] record.
pub const SESSION_KEY: &str = "user";
/// Storage key of the last selected workspace id.
pub const CURRENT_WORKSPACE_KEY: &str = "currentWorkspaceId";

/// A synchronous string key-value store that survives restarts.
pub trait LocalStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removing a key that does not exist is not an error.
    fn remove(&self, key: &str) -> PortResult<()>;
}
