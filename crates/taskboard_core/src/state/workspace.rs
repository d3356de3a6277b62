//! crates/taskboard_core/src/state/workspace.rs
//!
//! The normalized workspace / project / task store.
//!
//! Workspaces, projects and tasks each live in their own map keyed by id, and
//! parents keep the ordered ids of their children. The current workspace is a
//! key into the workspace map, never a copy, so every mutation is visible
//! through both the list view and the current-workspace view at once.
//! Nested [`Workspace`] trees are only rebuilt on read.

use std::collections::{HashMap, HashSet};
use std::mem;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{Project, ProjectId, Task, TaskId, Workspace, WorkspaceId};
use crate::state::Effect;

//=========================================================================================
// Actions
//=========================================================================================

/// Which tasks a delete applies to.
///
/// Accepts the three shapes callers send: a bare id, a list of ids, or an
/// `{ id, projectId }` record that limits the delete to one project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TaskSelector {
    Many(Vec<TaskId>),
    Scoped {
        id: TaskId,
        #[serde(default, rename = "projectId")]
        project_id: Option<ProjectId>,
    },
    One(TaskId),
}

impl From<TaskId> for TaskSelector {
    fn from(id: TaskId) -> Self {
        TaskSelector::One(id)
    }
}

impl From<&str> for TaskSelector {
    fn from(id: &str) -> Self {
        TaskSelector::One(id.into())
    }
}

impl From<Vec<TaskId>> for TaskSelector {
    fn from(ids: Vec<TaskId>) -> Self {
        TaskSelector::Many(ids)
    }
}

impl From<&Task> for TaskSelector {
    fn from(task: &Task) -> Self {
        TaskSelector::Scoped {
            id: task.id.clone(),
            project_id: Some(task.project_id.clone()),
        }
    }
}

/// The ids to drop, optionally limited to one project.
struct TaskRemoval {
    ids: HashSet<TaskId>,
    project: Option<ProjectId>,
}

impl From<TaskSelector> for TaskRemoval {
    fn from(selector: TaskSelector) -> Self {
        match selector {
            TaskSelector::Many(ids) => TaskRemoval {
                ids: ids.into_iter().collect(),
                project: None,
            },
            TaskSelector::Scoped { id, project_id } => TaskRemoval {
                ids: HashSet::from([id]),
                project: project_id,
            },
            TaskSelector::One(id) => TaskRemoval {
                ids: HashSet::from([id]),
                project: None,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub enum WorkspaceAction {
    FetchPending {
        seq: u64,
    },
    FetchFulfilled {
        seq: u64,
        workspaces: Vec<Workspace>,
        /// The last selected id read from local storage, if any.
        remembered: Option<WorkspaceId>,
    },
    FetchRejected {
        seq: u64,
        message: String,
    },
    SetWorkspaces(Vec<Workspace>),
    Clear,
    SetCurrent(WorkspaceId),
    AddWorkspace(Workspace),
    UpdateWorkspace(Workspace),
    DeleteWorkspace(WorkspaceId),
    AddProject(Project),
    AddTask(Task),
    UpdateTask(Task),
    DeleteTask(TaskSelector),
    ClearError,
}

//=========================================================================================
// State
//=========================================================================================

/// A workspace without its projects, plus the ordered ids of those projects.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WorkspaceEntry {
    workspace: Workspace,
    project_ids: Vec<ProjectId>,
}

/// A project without its tasks, plus the ordered ids of those tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ProjectEntry {
    project: Project,
    task_ids: Vec<TaskId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceState {
    order: Vec<WorkspaceId>,
    workspaces: HashMap<WorkspaceId, WorkspaceEntry>,
    projects: HashMap<ProjectId, ProjectEntry>,
    /// Task ids are only unique within their project.
    tasks: HashMap<(ProjectId, TaskId), Task>,
    current: Option<WorkspaceId>,
    /// Sequence number of the most recently started fetch.
    latest_fetch: u64,
    /// Fetches at or below this sequence were started before a clear.
    invalidated_through: u64,
    pub loading: bool,
    pub error: Option<String>,
}

impl WorkspaceState {
    //-------------------------------------------------------------------------------------
    // Selectors
    //-------------------------------------------------------------------------------------

    /// All workspaces, in list order, as full trees.
    pub fn workspaces(&self) -> Vec<Workspace> {
        self.order
            .iter()
            .filter_map(|id| self.workspace(id))
            .collect()
    }

    pub fn workspace(&self, id: &WorkspaceId) -> Option<Workspace> {
        let entry = self.workspaces.get(id)?;
        let mut workspace = entry.workspace.clone();
        workspace.projects = entry
            .project_ids
            .iter()
            .filter_map(|project_id| self.project(project_id))
            .collect();
        Some(workspace)
    }

    pub fn current_workspace_id(&self) -> Option<&WorkspaceId> {
        self.current.as_ref()
    }

    pub fn current_workspace(&self) -> Option<Workspace> {
        self.current.as_ref().and_then(|id| self.workspace(id))
    }

    pub fn project(&self, id: &ProjectId) -> Option<Project> {
        let entry = self.projects.get(id)?;
        let mut project = entry.project.clone();
        project.tasks = entry
            .task_ids
            .iter()
            .filter_map(|task_id| self.tasks.get(&(id.clone(), task_id.clone())).cloned())
            .collect();
        Some(project)
    }

    /// Finds a task by id among the projects of the current workspace.
    pub fn find_task(&self, id: &TaskId) -> Option<Task> {
        let current = self.workspaces.get(self.current.as_ref()?)?;
        current
            .project_ids
            .iter()
            .find_map(|project_id| self.tasks.get(&(project_id.clone(), id.clone())))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    //-------------------------------------------------------------------------------------
    // Reducer
    //-------------------------------------------------------------------------------------

    pub fn reduce(&mut self, action: WorkspaceAction) -> Vec<Effect> {
        match action {
            WorkspaceAction::FetchPending { seq } => {
                self.latest_fetch = self.latest_fetch.max(seq);
                self.loading = true;
                self.error = None;
                vec![]
            }
            WorkspaceAction::FetchFulfilled {
                seq,
                workspaces,
                remembered,
            } => {
                if self.is_stale(seq) {
                    warn!(seq, latest = self.latest_fetch, "Discarding stale workspace fetch");
                    return vec![];
                }
                self.loading = false;
                self.replace_all(workspaces);
                self.reselect(remembered)
            }
            WorkspaceAction::FetchRejected { seq, message } => {
                if self.is_stale(seq) {
                    warn!(seq, latest = self.latest_fetch, "Discarding stale workspace fetch error");
                    return vec![];
                }
                self.loading = false;
                self.error = Some(message);
                vec![]
            }
            WorkspaceAction::SetWorkspaces(workspaces) => {
                self.replace_all(workspaces);
                self.reselect(None)
            }
            WorkspaceAction::Clear => {
                self.order.clear();
                self.workspaces.clear();
                self.projects.clear();
                self.tasks.clear();
                self.current = None;
                self.loading = false;
                self.invalidated_through = self.latest_fetch;
                vec![]
            }
            WorkspaceAction::SetCurrent(id) => {
                if !self.workspaces.contains_key(&id) {
                    debug!(workspace_id = %id, "Ignoring selection of unknown workspace");
                    return vec![];
                }
                self.current = Some(id.clone());
                vec![Effect::PersistSelection(id)]
            }
            WorkspaceAction::AddWorkspace(workspace) => {
                let id = workspace.id.clone();
                if self.workspaces.contains_key(&id) {
                    self.remove_tree(&id);
                } else {
                    self.order.push(id.clone());
                }
                self.insert_tree(workspace);
                self.current = Some(id.clone());
                vec![Effect::PersistSelection(id)]
            }
            WorkspaceAction::UpdateWorkspace(workspace) => {
                if !self.workspaces.contains_key(&workspace.id) {
                    debug!(workspace_id = %workspace.id, "Ignoring update of unknown workspace");
                    return vec![];
                }
                self.remove_tree(&workspace.id);
                self.insert_tree(workspace);
                vec![]
            }
            WorkspaceAction::DeleteWorkspace(id) => self.delete_workspace(&id),
            WorkspaceAction::AddProject(project) => {
                self.add_project(project);
                vec![]
            }
            WorkspaceAction::AddTask(task) => {
                self.add_task(task);
                vec![]
            }
            WorkspaceAction::UpdateTask(task) => {
                self.update_task(task);
                vec![]
            }
            WorkspaceAction::DeleteTask(selector) => {
                self.delete_tasks(selector.into());
                vec![]
            }
            WorkspaceAction::ClearError => {
                self.error = None;
                vec![]
            }
        }
    }

    fn is_stale(&self, seq: u64) -> bool {
        seq < self.latest_fetch || seq <= self.invalidated_through
    }

    /// Keeps the selection if it survived a list replacement. Otherwise picks
    /// `preferred` when listed, else the first entry, and persists the choice.
    fn reselect(&mut self, preferred: Option<WorkspaceId>) -> Vec<Effect> {
        let had_selection = self.current.is_some();
        self.drop_missing_selection();
        if self.current.is_some() {
            return vec![];
        }

        let chosen = preferred
            .filter(|id| self.workspaces.contains_key(id))
            .or_else(|| self.order.first().cloned());
        match chosen {
            Some(id) => {
                debug!(workspace_id = %id, "Selecting workspace after list change");
                self.current = Some(id.clone());
                vec![Effect::PersistSelection(id)]
            }
            None if had_selection => vec![Effect::RemoveSelection],
            None => vec![],
        }
    }

    fn drop_missing_selection(&mut self) {
        if let Some(id) = &self.current {
            if !self.workspaces.contains_key(id) {
                self.current = None;
            }
        }
    }

    fn delete_workspace(&mut self, id: &WorkspaceId) -> Vec<Effect> {
        if !self.workspaces.contains_key(id) {
            return vec![];
        }
        self.remove_tree(id);
        self.order.retain(|w| w != id);

        if self.current.as_ref() != Some(id) {
            return vec![];
        }
        match self.order.first().cloned() {
            Some(first) => {
                self.current = Some(first.clone());
                vec![Effect::PersistSelection(first)]
            }
            None => {
                self.current = None;
                vec![Effect::RemoveSelection]
            }
        }
    }

    fn add_project(&mut self, project: Project) {
        let Some(current) = self.current.clone() else {
            debug!(project_id = %project.id, "No current workspace; dropping new project");
            return;
        };
        let project_id = project.id.clone();
        self.insert_project(project);
        if let Some(entry) = self.workspaces.get_mut(&current) {
            if !entry.project_ids.contains(&project_id) {
                entry.project_ids.push(project_id);
            }
        }
    }

    /// Resolves `project_id` only if it belongs to the current workspace.
    fn current_project_mut(&mut self, project_id: &ProjectId) -> Option<&mut ProjectEntry> {
        let current = self.workspaces.get(self.current.as_ref()?)?;
        if !current.project_ids.contains(project_id) {
            return None;
        }
        self.projects.get_mut(project_id)
    }

    fn add_task(&mut self, task: Task) {
        let Some(entry) = self.current_project_mut(&task.project_id) else {
            debug!(task_id = %task.id, project_id = %task.project_id, "Task's project is not in the current workspace");
            return;
        };
        if !entry.task_ids.contains(&task.id) {
            entry.task_ids.push(task.id.clone());
        }
        self.tasks
            .insert((task.project_id.clone(), task.id.clone()), task);
    }

    fn update_task(&mut self, task: Task) {
        if self.current_project_mut(&task.project_id).is_none() {
            return;
        }
        let key = (task.project_id.clone(), task.id.clone());
        if let Some(slot) = self.tasks.get_mut(&key) {
            *slot = task;
        }
    }

    fn delete_tasks(&mut self, removal: TaskRemoval) {
        let Some(current) = self.current.as_ref().and_then(|id| self.workspaces.get(id)) else {
            return;
        };
        let project_ids: Vec<ProjectId> = current
            .project_ids
            .iter()
            .filter(|id| removal.project.as_ref().map_or(true, |scope| scope == *id))
            .cloned()
            .collect();

        for project_id in project_ids {
            let Some(entry) = self.projects.get_mut(&project_id) else {
                continue;
            };
            entry.task_ids.retain(|task_id| !removal.ids.contains(task_id));
            for task_id in &removal.ids {
                self.tasks.remove(&(project_id.clone(), task_id.clone()));
            }
        }
    }

    //-------------------------------------------------------------------------------------
    // Normalization
    //-------------------------------------------------------------------------------------

    fn replace_all(&mut self, workspaces: Vec<Workspace>) {
        self.order.clear();
        self.workspaces.clear();
        self.projects.clear();
        self.tasks.clear();
        for workspace in workspaces {
            if self.workspaces.contains_key(&workspace.id) {
                self.remove_tree(&workspace.id);
            } else {
                self.order.push(workspace.id.clone());
            }
            self.insert_tree(workspace);
        }
    }

    fn insert_tree(&mut self, mut workspace: Workspace) {
        let projects = mem::take(&mut workspace.projects);
        let mut project_ids = Vec::with_capacity(projects.len());
        for project in projects {
            if !project_ids.contains(&project.id) {
                project_ids.push(project.id.clone());
            }
            self.insert_project(project);
        }
        self.workspaces.insert(
            workspace.id.clone(),
            WorkspaceEntry {
                workspace,
                project_ids,
            },
        );
    }

    fn insert_project(&mut self, mut project: Project) {
        self.remove_project_tasks(&project.id);
        let tasks = mem::take(&mut project.tasks);
        let mut task_ids = Vec::with_capacity(tasks.len());
        for task in tasks {
            if !task_ids.contains(&task.id) {
                task_ids.push(task.id.clone());
            }
            self.tasks.insert((project.id.clone(), task.id.clone()), task);
        }
        self.projects
            .insert(project.id.clone(), ProjectEntry { project, task_ids });
    }

    fn remove_tree(&mut self, id: &WorkspaceId) {
        let Some(entry) = self.workspaces.remove(id) else {
            return;
        };
        for project_id in &entry.project_ids {
            self.remove_project_tasks(project_id);
            self.projects.remove(project_id);
        }
    }

    fn remove_project_tasks(&mut self, project_id: &ProjectId) {
        if let Some(entry) = self.projects.get(project_id) {
            for task_id in &entry.task_ids {
                self.tasks.remove(&(project_id.clone(), task_id.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, project_id: &str) -> Task {
        Task {
            id: id.into(),
            project_id: project_id.into(),
            title: format!("task {id}"),
            description: None,
            task_type: Default::default(),
            status: Default::default(),
            priority: Default::default(),
            due_date: None,
            assignee_id: None,
            assignee: None,
        }
    }

    fn project(id: &str, workspace_id: &str, tasks: Vec<Task>) -> Project {
        Project {
            id: id.into(),
            workspace_id: Some(workspace_id.into()),
            name: format!("project {id}"),
            description: None,
            status: Default::default(),
            priority: Default::default(),
            start_date: None,
            end_date: None,
            progress: 0,
            team_lead: None,
            members: Vec::new(),
            tasks,
        }
    }

    fn workspace(id: &str, projects: Vec<Project>) -> Workspace {
        Workspace {
            id: id.into(),
            name: format!("workspace {id}"),
            description: None,
            image_url: String::new(),
            owner_id: None,
            members: Vec::new(),
            projects,
        }
    }

    fn loaded(workspaces: Vec<Workspace>) -> WorkspaceState {
        let mut state = WorkspaceState::default();
        state.reduce(WorkspaceAction::FetchPending { seq: 1 });
        state.reduce(WorkspaceAction::FetchFulfilled {
            seq: 1,
            workspaces,
            remembered: None,
        });
        state
    }

    /// The current workspace view must equal its entry in the list view.
    fn assert_in_sync(state: &WorkspaceState) {
        if let Some(current) = state.current_workspace() {
            let listed = state
                .workspaces()
                .into_iter()
                .find(|w| w.id == current.id)
                .expect("current workspace must be listed");
            assert_eq!(listed, current);
        } else {
            assert!(state.is_empty() || state.current_workspace_id().is_none());
        }
    }

    fn task_ids(state: &WorkspaceState, project_id: &str) -> Vec<String> {
        state
            .project(&project_id.into())
            .unwrap()
            .tasks
            .into_iter()
            .map(|t| t.id.0)
            .collect()
    }

    #[test]
    fn fetch_selects_first_without_remembered_id() {
        let mut state = WorkspaceState::default();
        state.reduce(WorkspaceAction::FetchPending { seq: 1 });
        assert!(state.loading);
        let effects = state.reduce(WorkspaceAction::FetchFulfilled {
            seq: 1,
            workspaces: vec![workspace("w1", vec![]), workspace("w2", vec![])],
            remembered: None,
        });
        assert!(!state.loading);
        assert_eq!(state.current_workspace_id(), Some(&WorkspaceId::from("w1")));
        assert_eq!(effects, vec![Effect::PersistSelection("w1".into())]);
    }

    #[test]
    fn fetch_prefers_remembered_id_and_falls_back_when_missing() {
        let mut state = WorkspaceState::default();
        state.reduce(WorkspaceAction::FetchFulfilled {
            seq: 1,
            workspaces: vec![workspace("w1", vec![]), workspace("w2", vec![])],
            remembered: Some("w2".into()),
        });
        assert_eq!(state.current_workspace_id(), Some(&WorkspaceId::from("w2")));

        let mut state = WorkspaceState::default();
        state.reduce(WorkspaceAction::FetchFulfilled {
            seq: 1,
            workspaces: vec![workspace("w1", vec![])],
            remembered: Some("gone".into()),
        });
        assert_eq!(state.current_workspace_id(), Some(&WorkspaceId::from("w1")));
    }

    #[test]
    fn fetch_keeps_existing_selection() {
        let mut state = loaded(vec![workspace("w1", vec![]), workspace("w2", vec![])]);
        state.reduce(WorkspaceAction::SetCurrent("w2".into()));
        let effects = state.reduce(WorkspaceAction::FetchFulfilled {
            seq: 2,
            workspaces: vec![workspace("w1", vec![]), workspace("w2", vec![])],
            remembered: None,
        });
        assert!(effects.is_empty());
        assert_eq!(state.current_workspace_id(), Some(&WorkspaceId::from("w2")));
    }

    #[test]
    fn fetch_that_removes_current_reselects() {
        let mut state = loaded(vec![workspace("w1", vec![]), workspace("w2", vec![])]);
        state.reduce(WorkspaceAction::FetchFulfilled {
            seq: 2,
            workspaces: vec![workspace("w2", vec![])],
            remembered: None,
        });
        assert_eq!(state.current_workspace_id(), Some(&WorkspaceId::from("w2")));

        let effects = state.reduce(WorkspaceAction::FetchFulfilled {
            seq: 3,
            workspaces: vec![],
            remembered: None,
        });
        assert_eq!(state.current_workspace_id(), None);
        assert_eq!(effects, vec![Effect::RemoveSelection]);
    }

    #[test]
    fn set_workspaces_reselects_when_current_is_dropped() {
        let mut state = loaded(vec![workspace("w1", vec![]), workspace("w2", vec![])]);
        let effects = state.reduce(WorkspaceAction::SetWorkspaces(vec![workspace("w2", vec![])]));
        assert_eq!(state.current_workspace_id(), Some(&WorkspaceId::from("w2")));
        assert_eq!(effects, vec![Effect::PersistSelection("w2".into())]);

        let effects = state.reduce(WorkspaceAction::SetWorkspaces(vec![]));
        assert_eq!(state.current_workspace_id(), None);
        assert_eq!(effects, vec![Effect::RemoveSelection]);
    }

    #[test]
    fn set_workspaces_keeps_surviving_selection() {
        let mut state = loaded(vec![workspace("w1", vec![]), workspace("w2", vec![])]);
        state.reduce(WorkspaceAction::SetCurrent("w2".into()));
        let effects = state.reduce(WorkspaceAction::SetWorkspaces(vec![
            workspace("w3", vec![]),
            workspace("w2", vec![]),
        ]));
        assert!(effects.is_empty());
        assert_eq!(state.current_workspace_id(), Some(&WorkspaceId::from("w2")));
        assert_in_sync(&state);
    }

    #[test]
    fn out_of_order_fetch_is_discarded() {
        let mut state = WorkspaceState::default();
        state.reduce(WorkspaceAction::FetchPending { seq: 1 });
        state.reduce(WorkspaceAction::FetchPending { seq: 2 });
        state.reduce(WorkspaceAction::FetchFulfilled {
            seq: 2,
            workspaces: vec![workspace("fresh", vec![])],
            remembered: None,
        });
        state.reduce(WorkspaceAction::FetchFulfilled {
            seq: 1,
            workspaces: vec![workspace("stale", vec![])],
            remembered: None,
        });
        assert_eq!(state.len(), 1);
        assert!(state.workspace(&"fresh".into()).is_some());
        assert!(!state.loading);
    }

    #[test]
    fn loading_clears_only_when_latest_fetch_settles() {
        let mut state = WorkspaceState::default();
        state.reduce(WorkspaceAction::FetchPending { seq: 1 });
        state.reduce(WorkspaceAction::FetchPending { seq: 2 });
        state.reduce(WorkspaceAction::FetchRejected {
            seq: 1,
            message: "boom".to_string(),
        });
        assert!(state.loading);
        assert_eq!(state.error, None);

        state.reduce(WorkspaceAction::FetchRejected {
            seq: 2,
            message: "Server error. Please try again later.".to_string(),
        });
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Server error. Please try again later."));
    }

    #[test]
    fn clear_discards_fetch_started_before_it() {
        let mut state = WorkspaceState::default();
        state.reduce(WorkspaceAction::FetchPending { seq: 1 });
        state.reduce(WorkspaceAction::Clear);
        state.reduce(WorkspaceAction::FetchFulfilled {
            seq: 1,
            workspaces: vec![workspace("w1", vec![])],
            remembered: None,
        });
        assert!(state.is_empty());
        assert_eq!(state.current_workspace_id(), None);
    }

    #[test]
    fn set_current_unknown_id_is_ignored() {
        let mut state = loaded(vec![workspace("w1", vec![])]);
        let effects = state.reduce(WorkspaceAction::SetCurrent("nope".into()));
        assert!(effects.is_empty());
        assert_eq!(state.current_workspace_id(), Some(&WorkspaceId::from("w1")));
    }

    #[test]
    fn set_current_with_same_id_only_rewrites_selection() {
        let mut state = loaded(vec![workspace("w1", vec![]), workspace("w2", vec![])]);
        let before = state.clone();
        let effects = state.reduce(WorkspaceAction::SetCurrent("w1".into()));
        assert_eq!(state, before);
        assert_eq!(effects, vec![Effect::PersistSelection("w1".into())]);
    }

    #[test]
    fn delete_current_falls_back_to_first_then_none() {
        let mut state = loaded(vec![workspace("w1", vec![]), workspace("w2", vec![])]);
        let effects = state.reduce(WorkspaceAction::DeleteWorkspace("w1".into()));
        assert_eq!(state.current_workspace_id(), Some(&WorkspaceId::from("w2")));
        assert_eq!(effects, vec![Effect::PersistSelection("w2".into())]);

        let effects = state.reduce(WorkspaceAction::DeleteWorkspace("w2".into()));
        assert_eq!(state.current_workspace_id(), None);
        assert!(state.is_empty());
        assert_eq!(effects, vec![Effect::RemoveSelection]);
    }

    #[test]
    fn delete_other_workspace_keeps_selection() {
        let mut state = loaded(vec![workspace("w1", vec![]), workspace("w2", vec![])]);
        let effects = state.reduce(WorkspaceAction::DeleteWorkspace("w2".into()));
        assert!(effects.is_empty());
        assert_eq!(state.current_workspace_id(), Some(&WorkspaceId::from("w1")));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn add_workspace_appends_and_selects() {
        let mut state = loaded(vec![workspace("w1", vec![])]);
        let effects = state.reduce(WorkspaceAction::AddWorkspace(workspace("w2", vec![])));
        assert_eq!(effects, vec![Effect::PersistSelection("w2".into())]);
        let ids: Vec<_> = state.workspaces().into_iter().map(|w| w.id.0).collect();
        assert_eq!(ids, vec!["w1", "w2"]);
        assert_in_sync(&state);
    }

    #[test]
    fn update_workspace_replaces_in_place() {
        let mut state = loaded(vec![
            workspace("w1", vec![project("p1", "w1", vec![task("t1", "p1")])]),
            workspace("w2", vec![]),
        ]);
        let mut renamed = workspace("w1", vec![project("p2", "w1", vec![])]);
        renamed.name = "Renamed".to_string();
        state.reduce(WorkspaceAction::UpdateWorkspace(renamed.clone()));

        assert_eq!(state.workspaces()[0], renamed);
        assert!(state.project(&"p1".into()).is_none());
        assert_in_sync(&state);

        let before = state.clone();
        state.reduce(WorkspaceAction::UpdateWorkspace(workspace("w9", vec![])));
        assert_eq!(state, before);
    }

    #[test]
    fn add_project_requires_current_workspace() {
        let mut state = WorkspaceState::default();
        state.reduce(WorkspaceAction::AddProject(project("p1", "w1", vec![])));
        assert!(state.project(&"p1".into()).is_none());
    }

    #[test]
    fn task_mutations_keep_views_in_sync() {
        let mut state = loaded(vec![
            workspace("w1", vec![project("p1", "w1", vec![task("t1", "p1")])]),
            workspace("w2", vec![]),
        ]);
        assert_in_sync(&state);

        state.reduce(WorkspaceAction::AddProject(project("p2", "w1", vec![])));
        assert_in_sync(&state);

        state.reduce(WorkspaceAction::AddTask(task("t2", "p2")));
        assert_in_sync(&state);
        assert_eq!(task_ids(&state, "p2"), vec!["t2"]);

        let mut done = task("t1", "p1");
        done.status = crate::domain::TaskStatus::Done;
        state.reduce(WorkspaceAction::UpdateTask(done.clone()));
        assert_in_sync(&state);
        assert_eq!(state.find_task(&"t1".into()), Some(done));

        state.reduce(WorkspaceAction::DeleteTask("t2".into()));
        assert_in_sync(&state);
        assert!(task_ids(&state, "p2").is_empty());

        state.reduce(WorkspaceAction::DeleteWorkspace("w2".into()));
        assert_in_sync(&state);
    }

    #[test]
    fn task_for_project_outside_current_workspace_is_ignored() {
        let mut state = loaded(vec![
            workspace("w1", vec![]),
            workspace("w2", vec![project("p9", "w2", vec![])]),
        ]);
        state.reduce(WorkspaceAction::AddTask(task("t1", "p9")));
        assert!(task_ids(&state, "p9").is_empty());
    }

    #[test]
    fn update_of_unknown_task_is_ignored() {
        let mut state = loaded(vec![workspace("w1", vec![project("p1", "w1", vec![])])]);
        state.reduce(WorkspaceAction::UpdateTask(task("t1", "p1")));
        assert!(task_ids(&state, "p1").is_empty());
    }

    #[test]
    fn delete_list_of_ids() {
        let mut state = loaded(vec![workspace(
            "w1",
            vec![project(
                "p1",
                "w1",
                vec![task("t1", "p1"), task("t2", "p1"), task("t3", "p1")],
            )],
        )]);
        state.reduce(WorkspaceAction::DeleteTask(
            vec![TaskId::from("t1"), TaskId::from("t3")].into(),
        ));
        assert_eq!(task_ids(&state, "p1"), vec!["t2"]);
    }

    #[test]
    fn scoped_delete_leaves_same_id_in_other_project() {
        let mut state = loaded(vec![workspace(
            "w1",
            vec![
                project("p1", "w1", vec![task("t1", "p1"), task("t2", "p1")]),
                project("p2", "w1", vec![task("t2", "p2")]),
            ],
        )]);
        state.reduce(WorkspaceAction::DeleteTask(TaskSelector::Scoped {
            id: "t2".into(),
            project_id: Some("p1".into()),
        }));
        assert_eq!(task_ids(&state, "p1"), vec!["t1"]);
        assert_eq!(task_ids(&state, "p2"), vec!["t2"]);

        state.reduce(WorkspaceAction::DeleteTask("t2".into()));
        assert!(task_ids(&state, "p2").is_empty());
    }

    #[test]
    fn selector_accepts_all_three_json_shapes() {
        let one: TaskSelector = serde_json::from_str(r#""t1""#).unwrap();
        assert_eq!(one, TaskSelector::One("t1".into()));

        let many: TaskSelector = serde_json::from_str(r#"["t1","t3"]"#).unwrap();
        assert_eq!(many, TaskSelector::Many(vec!["t1".into(), "t3".into()]));

        let scoped: TaskSelector =
            serde_json::from_str(r#"{"id":"t2","projectId":"p1"}"#).unwrap();
        assert_eq!(
            scoped,
            TaskSelector::Scoped {
                id: "t2".into(),
                project_id: Some("p1".into()),
            }
        );
    }

    #[test]
    fn clear_resets_everything() {
        let mut state = loaded(vec![workspace("w1", vec![project("p1", "w1", vec![])])]);
        state.reduce(WorkspaceAction::Clear);
        assert!(state.is_empty());
        assert!(state.current_workspace().is_none());
        assert!(state.project(&"p1".into()).is_none());
    }
}
