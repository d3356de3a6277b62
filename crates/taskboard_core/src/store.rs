//! crates/taskboard_core/src/store.rs
//!
//! The `Store` owns the auth and workspace state containers together with the
//! ports they need. It is the only way to mutate state: every change is a typed
//! action run through a reducer, and the storage effects the reducer returns
//! are applied before the new revision is published.
//!
//! The state lock is never held across an `.await`, so callers can keep
//! dispatching while a request is in flight.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::domain::{Project, ProjectId, Session, Task, TaskId, Workspace, WorkspaceId};
use crate::ports::{
    LocalStorage, PortError, PortResult, RemoteApi, CURRENT_WORKSPACE_KEY, SESSION_KEY,
};
use crate::state::{
    AuthAction, AuthOp, AuthState, Effect, TaskSelector, WorkspaceAction, WorkspaceState,
};

//=========================================================================================
// Actions and Snapshots
//=========================================================================================

#[derive(Debug, Clone)]
pub enum Action {
    Auth(AuthAction),
    Workspace(WorkspaceAction),
}

impl From<AuthAction> for Action {
    fn from(action: AuthAction) -> Self {
        Action::Auth(action)
    }
}

impl From<WorkspaceAction> for Action {
    fn from(action: WorkspaceAction) -> Self {
        Action::Workspace(action)
    }
}

/// Both state containers, as one owned value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    pub auth: AuthState,
    pub workspace: WorkspaceState,
}

//=========================================================================================
// Store
//=========================================================================================

struct Inner {
    state: Mutex<StoreState>,
    api: Arc<dyn RemoteApi>,
    storage: Arc<dyn LocalStorage>,
    revision: watch::Sender<u64>,
    fetch_seq: AtomicU64,
}

/// A cheaply cloneable handle to the application state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Store {
    pub fn new(api: Arc<dyn RemoteApi>, storage: Arc<dyn LocalStorage>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(StoreState::default()),
                api,
                storage,
                revision,
                fetch_seq: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn api(&self) -> &dyn RemoteApi {
        self.inner.api.as_ref()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    //-------------------------------------------------------------------------------------
    // Reading
    //-------------------------------------------------------------------------------------

    /// Receives the revision number after every dispatch.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    pub fn snapshot(&self) -> StoreState {
        self.lock().clone()
    }

    pub fn auth(&self) -> AuthState {
        self.lock().auth.clone()
    }

    pub fn workspaces(&self) -> Vec<Workspace> {
        self.lock().workspace.workspaces()
    }

    pub fn current_workspace(&self) -> Option<Workspace> {
        self.lock().workspace.current_workspace()
    }

    pub fn current_workspace_id(&self) -> Option<WorkspaceId> {
        self.lock().workspace.current_workspace_id().cloned()
    }

    pub fn project(&self, id: &ProjectId) -> Option<Project> {
        self.lock().workspace.project(id)
    }

    /// Looks a task up among the projects of the current workspace.
    pub fn find_task(&self, id: &TaskId) -> Option<Task> {
        self.lock().workspace.find_task(id)
    }

    //-------------------------------------------------------------------------------------
    // Dispatch
    //-------------------------------------------------------------------------------------

    /// Runs `action` through its reducer and applies the returned effects.
    ///
    /// Effects are written while the state lock is held, so the persisted
    /// values always follow the same order as the state changes.
    pub fn dispatch(&self, action: impl Into<Action>) {
        {
            let mut state = self.lock();
            let effects = match action.into() {
                Action::Auth(action) => state.auth.reduce(action),
                Action::Workspace(action) => state.workspace.reduce(action),
            };
            self.apply(effects);
        }
        self.inner.revision.send_modify(|revision| *revision += 1);
    }

    fn apply(&self, effects: Vec<Effect>) {
        let storage = &self.inner.storage;
        for effect in effects {
            let result = match &effect {
                Effect::RemoveSession => storage.remove(SESSION_KEY),
                Effect::PersistSelection(id) => storage.set(CURRENT_WORKSPACE_KEY, id.as_str()),
                Effect::RemoveSelection => storage.remove(CURRENT_WORKSPACE_KEY),
            };
            if let Err(e) = result {
                warn!(?effect, error = %e, "Failed to apply storage effect");
            }
        }
    }

    /// Tears the session down if `error` says the server no longer accepts it.
    pub(crate) fn note_failure(&self, error: &PortError) {
        if let PortError::Unauthorized(_) = error {
            warn!("Session rejected by server; logging out");
            self.dispatch(AuthAction::SessionExpired);
            self.dispatch(WorkspaceAction::Clear);
        }
    }

    //-------------------------------------------------------------------------------------
    // Auth
    //-------------------------------------------------------------------------------------

    /// Restores the persisted session, if there is a well-formed one.
    ///
    /// A record that does not parse is deleted and the store stays logged out.
    pub fn load_from_storage(&self) -> bool {
        let Some(raw) = self.inner.storage.get(SESSION_KEY) else {
            return false;
        };
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => {
                info!(user = %session.user.email, "Restored session from storage");
                self.dispatch(AuthAction::Restored(session));
                true
            }
            Err(e) => {
                warn!(error = %e, "Discarding corrupt session record");
                if let Err(e) = self.inner.storage.remove(SESSION_KEY) {
                    warn!(error = %e, "Failed to remove corrupt session record");
                }
                false
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> PortResult<Session> {
        self.authenticate(AuthOp::Login, self.inner.api.login(email, password))
            .await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> PortResult<Session> {
        self.authenticate(
            AuthOp::Register,
            self.inner.api.register(name, email, password),
        )
        .await
    }

    async fn authenticate(
        &self,
        op: AuthOp,
        request: impl Future<Output = PortResult<Session>>,
    ) -> PortResult<Session> {
        self.dispatch(AuthAction::Pending);
        let result = match request.await {
            Ok(session) => self.persist_session(&session).map(|()| session),
            Err(e) => Err(e),
        };
        match result {
            Ok(session) => {
                info!(?op, user = %session.user.email, "Authenticated");
                self.dispatch(AuthAction::Fulfilled(session.clone()));
                Ok(session)
            }
            Err(e) => {
                error!(?op, error = ?e, "Authentication failed");
                self.dispatch(AuthAction::Rejected(e.to_string()));
                Err(e)
            }
        }
    }

    fn persist_session(&self, session: &Session) -> PortResult<()> {
        let record =
            serde_json::to_string(session).map_err(|e| PortError::Storage(e.to_string()))?;
        self.inner.storage.set(SESSION_KEY, &record)
    }

    /// Ends the session and forgets every workspace.
    pub fn logout(&self) {
        info!("Logging out");
        self.dispatch(AuthAction::Logout);
        self.dispatch(WorkspaceAction::Clear);
    }

    pub fn clear_auth_error(&self) {
        self.dispatch(AuthAction::ClearError);
    }

    //-------------------------------------------------------------------------------------
    // Workspaces
    //-------------------------------------------------------------------------------------

    /// Replaces the workspace list with the server's.
    ///
    /// Results of a fetch that was overtaken by a newer one are dropped.
    pub async fn fetch_workspaces(&self) -> PortResult<()> {
        let seq = self.inner.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.dispatch(WorkspaceAction::FetchPending { seq });
        match self.inner.api.list_workspaces().await {
            Ok(workspaces) => {
                debug!(seq, count = workspaces.len(), "Fetched workspaces");
                let remembered = self
                    .inner
                    .storage
                    .get(CURRENT_WORKSPACE_KEY)
                    .map(WorkspaceId::from);
                self.dispatch(WorkspaceAction::FetchFulfilled {
                    seq,
                    workspaces,
                    remembered,
                });
                Ok(())
            }
            Err(e) => {
                error!(seq, error = ?e, "Failed to fetch workspaces");
                self.note_failure(&e);
                self.dispatch(WorkspaceAction::FetchRejected {
                    seq,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    pub fn set_workspaces(&self, workspaces: Vec<Workspace>) {
        self.dispatch(WorkspaceAction::SetWorkspaces(workspaces));
    }

    pub fn set_current_workspace(&self, id: impl Into<WorkspaceId>) {
        self.dispatch(WorkspaceAction::SetCurrent(id.into()));
    }

    pub fn add_workspace(&self, workspace: Workspace) {
        self.dispatch(WorkspaceAction::AddWorkspace(workspace));
    }

    pub fn update_workspace(&self, workspace: Workspace) {
        self.dispatch(WorkspaceAction::UpdateWorkspace(workspace));
    }

    pub fn delete_workspace(&self, id: impl Into<WorkspaceId>) {
        self.dispatch(WorkspaceAction::DeleteWorkspace(id.into()));
    }

    pub fn clear_workspaces(&self) {
        self.dispatch(WorkspaceAction::Clear);
    }

    pub fn clear_workspace_error(&self) {
        self.dispatch(WorkspaceAction::ClearError);
    }

    pub fn add_project(&self, project: Project) {
        self.dispatch(WorkspaceAction::AddProject(project));
    }

    pub fn add_task(&self, task: Task) {
        self.dispatch(WorkspaceAction::AddTask(task));
    }

    pub fn update_task(&self, task: Task) {
        self.dispatch(WorkspaceAction::UpdateTask(task));
    }

    pub fn delete_task(&self, selector: impl Into<TaskSelector>) {
        self.dispatch(WorkspaceAction::DeleteTask(selector.into()));
    }
}
