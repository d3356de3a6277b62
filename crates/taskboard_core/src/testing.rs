//! crates/taskboard_core/src/testing.rs
//!
//! An in-process stand-in for the remote API, backed by a tiny in-memory
//! server model so that refetches observe earlier mutations.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::{
    Comment, CommentId, InviteMember, Project, ProjectDraft, ProjectId, ProjectMember, Session,
    Task, TaskDraft, TaskId, User, UserId, Workspace, WorkspaceDraft, WorkspaceId,
    WorkspaceMember,
};
use crate::ports::{
    AuthService, CommentService, PortError, PortResult, ProjectService, TaskService,
    WorkspaceService,
};

pub(crate) const EMAIL: &str = "ann@example.com";
pub(crate) const PASSWORD: &str = "hunter22";

#[derive(Default)]
pub(crate) struct Server {
    pub workspaces: Vec<Workspace>,
    pub comments: Vec<Comment>,
    /// Returned by the next call, whatever it is.
    pub fail_next: Option<PortError>,
    /// Names of the calls made, in order.
    pub calls: Vec<String>,
    next_id: u32,
}

impl Server {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn project_mut(&mut self, id: &ProjectId) -> PortResult<&mut Project> {
        self.workspaces
            .iter_mut()
            .flat_map(|w| w.projects.iter_mut())
            .find(|p| &p.id == id)
            .ok_or_else(|| PortError::NotFound("Project".to_string()))
    }
}

#[derive(Default)]
pub(crate) struct FakeApi {
    server: Mutex<Server>,
}

pub(crate) fn session() -> Session {
    Session {
        user: User {
            id: UserId::from("u1"),
            name: "Ann".to_string(),
            email: EMAIL.to_string(),
            image: String::new(),
        },
        token: "token-u1".to_string(),
    }
}

pub(crate) fn workspace(id: &str) -> Workspace {
    Workspace {
        id: id.into(),
        name: format!("Workspace {id}"),
        description: None,
        image_url: String::new(),
        owner_id: Some("u1".into()),
        members: Vec::new(),
        projects: Vec::new(),
    }
}

pub(crate) fn project(id: &str, workspace_id: &str) -> Project {
    Project {
        id: id.into(),
        workspace_id: Some(workspace_id.into()),
        name: format!("Project {id}"),
        description: None,
        status: Default::default(),
        priority: Default::default(),
        start_date: None,
        end_date: None,
        progress: 0,
        team_lead: None,
        members: Vec::new(),
        tasks: Vec::new(),
    }
}

pub(crate) fn task(id: &str, project_id: &str) -> Task {
    Task {
        id: id.into(),
        project_id: project_id.into(),
        title: format!("Task {id}"),
        description: None,
        task_type: Default::default(),
        status: Default::default(),
        priority: Default::default(),
        due_date: None,
        assignee_id: Some("u1".into()),
        assignee: None,
    }
}

impl FakeApi {
    pub fn with_workspaces(workspaces: Vec<Workspace>) -> Self {
        let api = Self::default();
        api.server().workspaces = workspaces;
        api
    }

    pub fn server(&self) -> MutexGuard<'_, Server> {
        self.server.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn fail_next(&self, error: PortError) {
        self.server().fail_next = Some(error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.server().calls.clone()
    }

    fn begin(&self, call: &str) -> PortResult<MutexGuard<'_, Server>> {
        let mut server = self.server();
        server.calls.push(call.to_string());
        match server.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(server),
        }
    }
}

#[async_trait]
impl AuthService for FakeApi {
    async fn login(&self, email: &str, password: &str) -> PortResult<Session> {
        self.begin("login")?;
        if email == EMAIL && password == PASSWORD {
            Ok(session())
        } else {
            Err(PortError::Unauthorized("Invalid email or password".to_string()))
        }
    }

    async fn register(&self, name: &str, email: &str, _password: &str) -> PortResult<Session> {
        self.begin("register")?;
        if email == EMAIL {
            return Err(PortError::Request {
                status: 409,
                message: "Email already exists".to_string(),
            });
        }
        let mut session = session();
        session.user.name = name.to_string();
        session.user.email = email.to_string();
        Ok(session)
    }
}

#[async_trait]
impl WorkspaceService for FakeApi {
    async fn list_workspaces(&self) -> PortResult<Vec<Workspace>> {
        Ok(self.begin("list_workspaces")?.workspaces.clone())
    }

    async fn get_workspace(&self, id: &WorkspaceId) -> PortResult<Workspace> {
        self.begin("get_workspace")?
            .workspaces
            .iter()
            .find(|w| &w.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Workspace".to_string()))
    }

    async fn create_workspace(&self, draft: &WorkspaceDraft) -> PortResult<Workspace> {
        let mut server = self.begin("create_workspace")?;
        let mut created = workspace(&server.next_id("w"));
        created.name = draft.name.clone();
        created.description = draft.description.clone();
        server.workspaces.push(created.clone());
        Ok(created)
    }

    async fn update_workspace(
        &self,
        id: &WorkspaceId,
        draft: &WorkspaceDraft,
    ) -> PortResult<Workspace> {
        let mut server = self.begin("update_workspace")?;
        let existing = server
            .workspaces
            .iter_mut()
            .find(|w| &w.id == id)
            .ok_or_else(|| PortError::NotFound("Workspace".to_string()))?;
        existing.name = draft.name.clone();
        existing.description = draft.description.clone();
        Ok(existing.clone())
    }

    async fn delete_workspace(&self, id: &WorkspaceId) -> PortResult<()> {
        self.begin("delete_workspace")?
            .workspaces
            .retain(|w| &w.id != id);
        Ok(())
    }

    async fn add_workspace_member(
        &self,
        id: &WorkspaceId,
        invite: &InviteMember,
    ) -> PortResult<()> {
        let mut server = self.begin("add_workspace_member")?;
        let workspace = server
            .workspaces
            .iter_mut()
            .find(|w| &w.id == id)
            .ok_or_else(|| PortError::NotFound("Workspace".to_string()))?;
        workspace.members.push(WorkspaceMember {
            user_id: UserId::from(invite.email.as_str()),
            user: None,
            role: invite.role.unwrap_or_default(),
        });
        Ok(())
    }
}

#[async_trait]
impl ProjectService for FakeApi {
    async fn list_projects(&self) -> PortResult<Vec<Project>> {
        let server = self.begin("list_projects")?;
        Ok(server
            .workspaces
            .iter()
            .flat_map(|w| w.projects.clone())
            .collect())
    }

    async fn list_workspace_projects(&self, workspace_id: &WorkspaceId) -> PortResult<Vec<Project>> {
        let server = self.begin("list_workspace_projects")?;
        Ok(server
            .workspaces
            .iter()
            .filter(|w| &w.id == workspace_id)
            .flat_map(|w| w.projects.clone())
            .collect())
    }

    async fn get_project(&self, id: &ProjectId) -> PortResult<Project> {
        let mut server = self.begin("get_project")?;
        server.project_mut(id).map(|p| p.clone())
    }

    async fn create_project(&self, draft: &ProjectDraft) -> PortResult<Project> {
        let mut server = self.begin("create_project")?;
        let workspace_id = draft
            .workspace_id
            .clone()
            .ok_or_else(|| PortError::Request {
                status: 400,
                message: "Workspace ID is required".to_string(),
            })?;
        let id = server.next_id("p");
        let mut created = project(&id, workspace_id.as_str());
        created.name = draft.name.clone();
        created.status = draft.status;
        created.priority = draft.priority;
        let workspace = server
            .workspaces
            .iter_mut()
            .find(|w| w.id == workspace_id)
            .ok_or_else(|| PortError::NotFound("Workspace".to_string()))?;
        workspace.projects.push(created.clone());
        Ok(created)
    }

    async fn update_project(&self, id: &ProjectId, draft: &ProjectDraft) -> PortResult<Project> {
        let mut server = self.begin("update_project")?;
        let existing = server.project_mut(id)?;
        existing.name = draft.name.clone();
        existing.status = draft.status;
        existing.priority = draft.priority;
        existing.progress = draft.progress;
        Ok(existing.clone())
    }

    async fn delete_project(&self, id: &ProjectId) -> PortResult<()> {
        let mut server = self.begin("delete_project")?;
        for workspace in &mut server.workspaces {
            workspace.projects.retain(|p| &p.id != id);
        }
        Ok(())
    }

    async fn add_project_member(&self, id: &ProjectId, email: &str) -> PortResult<()> {
        let mut server = self.begin("add_project_member")?;
        server.project_mut(id)?.members.push(ProjectMember {
            user_id: UserId::from(email),
            user: None,
        });
        Ok(())
    }
}

#[async_trait]
impl TaskService for FakeApi {
    async fn list_tasks(&self) -> PortResult<Vec<Task>> {
        let server = self.begin("list_tasks")?;
        Ok(server
            .workspaces
            .iter()
            .flat_map(|w| w.projects.iter())
            .flat_map(|p| p.tasks.clone())
            .collect())
    }

    async fn list_project_tasks(&self, project_id: &ProjectId) -> PortResult<Vec<Task>> {
        let mut server = self.begin("list_project_tasks")?;
        Ok(server.project_mut(project_id)?.tasks.clone())
    }

    async fn get_task(&self, id: &TaskId) -> PortResult<Task> {
        let server = self.begin("get_task")?;
        server
            .workspaces
            .iter()
            .flat_map(|w| w.projects.iter())
            .flat_map(|p| p.tasks.iter())
            .find(|t| &t.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Task".to_string()))
    }

    async fn create_task(&self, draft: &TaskDraft) -> PortResult<Task> {
        let mut server = self.begin("create_task")?;
        let id = server.next_id("t");
        let mut created = task(&id, draft.project_id.as_str());
        created.title = draft.title.clone();
        created.status = draft.status;
        created.assignee_id = draft.assignee_id.clone();
        server
            .project_mut(&draft.project_id)?
            .tasks
            .push(created.clone());
        Ok(created)
    }

    async fn update_task(&self, id: &TaskId, draft: &TaskDraft) -> PortResult<Task> {
        let mut server = self.begin("update_task")?;
        let project = server.project_mut(&draft.project_id)?;
        let existing = project
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| PortError::NotFound("Task".to_string()))?;
        existing.title = draft.title.clone();
        existing.status = draft.status;
        existing.priority = draft.priority;
        Ok(existing.clone())
    }

    async fn delete_task(&self, id: &TaskId) -> PortResult<()> {
        let mut server = self.begin("delete_task")?;
        for project in server
            .workspaces
            .iter_mut()
            .flat_map(|w| w.projects.iter_mut())
        {
            project.tasks.retain(|t| &t.id != id);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentService for FakeApi {
    async fn list_comments(&self, task_id: &TaskId) -> PortResult<Vec<Comment>> {
        let server = self.begin("list_comments")?;
        Ok(server
            .comments
            .iter()
            .filter(|c| &c.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn create_comment(&self, task_id: &TaskId, content: &str) -> PortResult<Comment> {
        let mut server = self.begin("create_comment")?;
        let comment = Comment {
            id: CommentId::from(server.next_id("c")),
            content: content.to_string(),
            user_id: "u1".into(),
            user: None,
            task_id: task_id.clone(),
            created_at: None,
        };
        server.comments.push(comment.clone());
        Ok(comment)
    }

    async fn delete_comment(&self, id: &CommentId) -> PortResult<()> {
        self.begin("delete_comment")?.comments.retain(|c| &c.id != id);
        Ok(())
    }
}
