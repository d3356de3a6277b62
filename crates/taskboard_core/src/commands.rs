//! crates/taskboard_core/src/commands.rs
//!
//! The user-facing workflows built on top of the `Store`.
//!
//! Each command validates its input first (no request is sent when that
//! fails), calls the remote API, merges the result into local state, and then
//! refetches the workspace tree so the server stays the source of truth.
//! A failed refetch does not fail a command whose mutation already succeeded;
//! the fetch error is left in the workspace state instead.

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::domain::{
    Comment, CommentId, InviteMember, Project, ProjectDraft, ProjectId, Task, TaskDraft, TaskId,
    TaskStatus, Workspace, WorkspaceDraft, WorkspaceId, WorkspaceRole,
};
use crate::ports::{PortError, PortResult};
use crate::state::TaskSelector;
use crate::store::Store;

fn require(value: &str, message: &str) -> PortResult<()> {
    if value.trim().is_empty() {
        Err(PortError::Validation(message.to_string()))
    } else {
        Ok(())
    }
}

/// A loose shape check: something before a single `@`, and a dot in the domain.
fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

fn require_email(email: &str) -> PortResult<()> {
    require(email, "Email is required")?;
    if !looks_like_email(email) {
        return Err(PortError::Validation("Email must be valid".to_string()));
    }
    Ok(())
}

impl Store {
    /// Runs a remote call, tearing the session down on 401 and logging failures.
    async fn remote<T>(
        &self,
        what: &str,
        call: impl std::future::Future<Output = PortResult<T>>,
    ) -> PortResult<T> {
        call.await.map_err(|e| {
            error!(operation = what, error = ?e, "Remote call failed");
            self.note_failure(&e);
            e
        })
    }

    async fn refresh(&self) {
        if let Err(e) = self.fetch_workspaces().await {
            warn!(error = %e, "Refetch after mutation failed");
        }
    }

    //-------------------------------------------------------------------------------------
    // Workspaces
    //-------------------------------------------------------------------------------------

    pub async fn create_workspace(&self, draft: WorkspaceDraft) -> PortResult<Workspace> {
        require(&draft.name, "Workspace name is required")?;
        if self.auth().user.is_none() {
            return Err(PortError::Validation(
                "You must be logged in to create a workspace".to_string(),
            ));
        }

        let created = self
            .remote("create workspace", self.api().create_workspace(&draft))
            .await?;
        info!(workspace_id = %created.id, "Created workspace");
        self.add_workspace(created.clone());
        self.refresh().await;
        self.set_current_workspace(created.id.clone());
        Ok(created)
    }

    pub async fn edit_workspace(
        &self,
        id: &WorkspaceId,
        draft: WorkspaceDraft,
    ) -> PortResult<Workspace> {
        require(&draft.name, "Workspace name is required")?;
        let updated = self
            .remote("update workspace", self.api().update_workspace(id, &draft))
            .await?;
        self.update_workspace(updated.clone());
        self.refresh().await;
        Ok(updated)
    }

    pub async fn remove_workspace(&self, id: &WorkspaceId) -> PortResult<()> {
        self.remote("delete workspace", self.api().delete_workspace(id))
            .await?;
        info!(workspace_id = %id, "Deleted workspace");
        self.delete_workspace(id.clone());
        self.refresh().await;
        Ok(())
    }

    pub async fn invite_workspace_member(
        &self,
        id: &WorkspaceId,
        email: &str,
        role: Option<WorkspaceRole>,
    ) -> PortResult<()> {
        require_email(email)?;
        let invite = InviteMember {
            email: email.trim().to_string(),
            role,
        };
        self.remote(
            "add workspace member",
            self.api().add_workspace_member(id, &invite),
        )
        .await?;
        self.refresh().await;
        Ok(())
    }

    //-------------------------------------------------------------------------------------
    // Projects
    //-------------------------------------------------------------------------------------

    /// Creates a project in the current workspace.
    pub async fn create_project(&self, mut draft: ProjectDraft) -> PortResult<Project> {
        require(&draft.name, "Project name is required")?;
        let Some(workspace_id) = self.current_workspace_id() else {
            return Err(PortError::Validation(
                "Please select a workspace first".to_string(),
            ));
        };
        if draft.progress > 100 {
            return Err(PortError::Validation(
                "Progress must be between 0 and 100".to_string(),
            ));
        }
        draft.workspace_id = Some(workspace_id);

        let created = self
            .remote("create project", self.api().create_project(&draft))
            .await?;
        info!(project_id = %created.id, "Created project");
        self.add_project(created.clone());
        self.refresh().await;
        Ok(created)
    }

    pub async fn edit_project(&self, id: &ProjectId, draft: ProjectDraft) -> PortResult<Project> {
        require(&draft.name, "Project name is required")?;
        let updated = self
            .remote("update project", self.api().update_project(id, &draft))
            .await?;
        self.refresh().await;
        Ok(updated)
    }

    pub async fn remove_project(&self, id: &ProjectId) -> PortResult<()> {
        self.remote("delete project", self.api().delete_project(id))
            .await?;
        self.refresh().await;
        Ok(())
    }

    pub async fn add_project_member(&self, project_id: &ProjectId, email: &str) -> PortResult<()> {
        require(email, "Please select a member")?;
        require(project_id.as_str(), "Project ID is required")?;
        self.remote(
            "add project member",
            self.api().add_project_member(project_id, email.trim()),
        )
        .await?;
        self.refresh().await;
        Ok(())
    }

    //-------------------------------------------------------------------------------------
    // Tasks
    //-------------------------------------------------------------------------------------

    pub async fn create_task(&self, draft: TaskDraft) -> PortResult<Task> {
        require(&draft.title, "Task title is required")?;
        require(draft.project_id.as_str(), "Project ID is required")?;
        if draft.assignee_id.as_ref().map_or(true, |id| id.as_str().trim().is_empty()) {
            return Err(PortError::Validation("Assignee is required".to_string()));
        }

        let created = self
            .remote("create task", self.api().create_task(&draft))
            .await?;
        info!(task_id = %created.id, project_id = %created.project_id, "Created task");
        self.add_task(created.clone());
        self.refresh().await;
        Ok(created)
    }

    pub async fn update_task_status(&self, id: &TaskId, status: TaskStatus) -> PortResult<Task> {
        let task = self
            .find_task(id)
            .ok_or_else(|| PortError::NotFound("Task".to_string()))?;
        let mut draft = TaskDraft::from(&task);
        draft.status = status;

        let updated = self
            .remote("update task", self.api().update_task(id, &draft))
            .await?;
        self.update_task(updated.clone());
        self.refresh().await;
        Ok(updated)
    }

    /// Deletes several tasks. Nothing changes locally unless every delete succeeds.
    pub async fn delete_tasks(&self, ids: Vec<TaskId>) -> PortResult<()> {
        if ids.is_empty() {
            return Err(PortError::Validation("No tasks selected".to_string()));
        }

        let results = join_all(ids.iter().map(|id| self.api().delete_task(id))).await;
        if let Some(e) = results.into_iter().find_map(Result::err) {
            error!(error = ?e, "Deleting tasks failed");
            self.note_failure(&e);
            return Err(e);
        }
        info!(count = ids.len(), "Deleted tasks");
        self.delete_task(TaskSelector::Many(ids));
        self.refresh().await;
        Ok(())
    }

    /// Deletes one task, removing it only from the project that owns it.
    pub async fn delete_single_task(&self, id: &TaskId) -> PortResult<()> {
        let task = self
            .find_task(id)
            .ok_or_else(|| PortError::NotFound("Task".to_string()))?;
        self.remote("delete task", self.api().delete_task(id)).await?;
        self.delete_task(&task);
        self.refresh().await;
        Ok(())
    }

    //-------------------------------------------------------------------------------------
    // Reads
    //-------------------------------------------------------------------------------------

    /// Projects of one workspace, or of every workspace the user can see.
    /// Read straight from the server; local state is not touched.
    pub async fn list_projects(&self, workspace: Option<&WorkspaceId>) -> PortResult<Vec<Project>> {
        match workspace {
            Some(id) => {
                self.remote("list workspace projects", self.api().list_workspace_projects(id))
                    .await
            }
            None => self.remote("list projects", self.api().list_projects()).await,
        }
    }

    /// Tasks of one project, or every task the user can see.
    pub async fn list_tasks(&self, project: Option<&ProjectId>) -> PortResult<Vec<Task>> {
        match project {
            Some(id) => {
                self.remote("list project tasks", self.api().list_project_tasks(id))
                    .await
            }
            None => self.remote("list tasks", self.api().list_tasks()).await,
        }
    }

    pub async fn project_details(&self, id: &ProjectId) -> PortResult<Project> {
        require(id.as_str(), "Project ID is required")?;
        self.remote("get project", self.api().get_project(id)).await
    }

    pub async fn task_details(&self, id: &TaskId) -> PortResult<Task> {
        require(id.as_str(), "Task ID is required")?;
        self.remote("get task", self.api().get_task(id)).await
    }

    //-------------------------------------------------------------------------------------
    // Comments
    //-------------------------------------------------------------------------------------

    pub async fn list_comments(&self, task_id: &TaskId) -> PortResult<Vec<Comment>> {
        self.remote("list comments", self.api().list_comments(task_id))
            .await
    }

    pub async fn add_comment(&self, task_id: &TaskId, content: &str) -> PortResult<Comment> {
        require(content, "Comment cannot be empty")?;
        self.remote(
            "create comment",
            self.api().create_comment(task_id, content.trim()),
        )
        .await
    }

    pub async fn delete_comment(&self, id: &CommentId) -> PortResult<()> {
        self.remote("delete comment", self.api().delete_comment(id))
            .await
    }
}
