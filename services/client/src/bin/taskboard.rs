//! services/client/src/bin/taskboard.rs

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use client_lib::{
    adapters::{FileStorage, HttpApi},
    config::Config,
    error::ClientError,
};
use serde::de::DeserializeOwned;
use taskboard_core::domain::{
    Priority, Project, ProjectDraft, ProjectId, ProjectStatus, Task, TaskDraft, TaskStatus, TaskType,
    WorkspaceDraft, WorkspaceRole,
};
use taskboard_core::store::Store;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line client for the project-management server.
#[derive(Debug, Parser)]
#[command(name = "taskboard", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and remember the session.
    Login { email: String, password: String },
    /// Create an account and remember the session.
    Register {
        name: String,
        email: String,
        password: String,
    },
    /// Forget the stored session and workspace selection.
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// List workspaces, marking the current one.
    Workspaces,
    /// Select the current workspace.
    Use { id: String },
    #[command(subcommand)]
    Workspace(WorkspaceCommand),
    /// List the projects of the current workspace.
    Projects {
        /// List projects of every workspace instead.
        #[arg(long)]
        all: bool,
    },
    #[command(subcommand)]
    Project(ProjectCommand),
    /// List the tasks of a project, or every visible task.
    Tasks { project_id: Option<String> },
    #[command(subcommand)]
    Task(TaskCommand),
    /// List the comments of a task.
    Comments { task_id: String },
    #[command(subcommand)]
    Comment(CommentCommand),
}

#[derive(Debug, Subcommand)]
enum WorkspaceCommand {
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete { id: String },
    /// Invite a member into a workspace by email.
    Invite {
        id: String,
        email: String,
        #[arg(long, value_parser = parse_wire::<WorkspaceRole>)]
        role: Option<WorkspaceRole>,
    },
}

#[derive(Debug, Subcommand)]
enum ProjectCommand {
    /// Create a project in the current workspace.
    Create(ProjectArgs),
    /// Add a member to a project by email.
    Member { project_id: String, email: String },
    /// Show one project with its tasks.
    Show { id: String },
}

#[derive(Debug, Args)]
struct ProjectArgs {
    name: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, default_value = "planning", value_parser = parse_wire::<ProjectStatus>)]
    status: ProjectStatus,
    #[arg(long, default_value = "medium", value_parser = parse_wire::<Priority>)]
    priority: Priority,
    /// Emails of the initial members.
    #[arg(long = "member")]
    members: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum TaskCommand {
    Create(TaskArgs),
    /// Show one task.
    Show { id: String },
    /// Move a task of the current workspace to another status.
    Status {
        id: String,
        #[arg(value_parser = parse_wire::<TaskStatus>)]
        status: TaskStatus,
    },
    /// Delete one or more tasks.
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Debug, Args)]
struct TaskArgs {
    project_id: String,
    title: String,
    #[arg(long)]
    assignee: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long = "type", default_value = "task", value_parser = parse_wire::<TaskType>)]
    task_type: TaskType,
    #[arg(long, default_value = "medium", value_parser = parse_wire::<Priority>)]
    priority: Priority,
}

#[derive(Debug, Subcommand)]
enum CommentCommand {
    Add { task_id: String, content: String },
    Delete { id: String },
}

/// Parses `in-progress` or `in_progress` into the `IN_PROGRESS` wire variant.
fn parse_wire<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let wire = raw.trim().replace('-', "_").to_uppercase();
    serde_json::from_value(serde_json::Value::String(wire))
        .map_err(|_| format!("unknown value '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- 2. Wire Adapters into the Store ---
    let storage = Arc::new(FileStorage::open(config.state_dir.clone())?);
    let api = Arc::new(HttpApi::new(config.api_url.clone(), storage.clone()));
    let store = Store::new(api, storage);
    if store.load_from_storage() {
        info!("Restored stored session");
    }

    // --- 3. Run the Command ---
    run(&store, cli.command).await
}

fn print_project(project: &Project) {
    println!(
        "{}\t{}\t{:?}\t{}%\t{} tasks",
        project.id,
        project.name,
        project.status,
        project.progress,
        project.tasks.len()
    );
}

fn print_task(task: &Task) {
    println!(
        "{}\t{:?}\t{:?}\t{}",
        task.id, task.status, task.priority, task.title
    );
}

fn require_session(store: &Store) -> Result<(), ClientError> {
    if store.auth().is_authenticated {
        Ok(())
    } else {
        Err(ClientError::Internal(
            "Not logged in. Run `taskboard login` first.".to_string(),
        ))
    }
}

async fn run(store: &Store, command: Command) -> Result<(), ClientError> {
    match command {
        Command::Login { email, password } => {
            let session = store.login(&email, &password).await?;
            println!("Logged in as {} <{}>", session.user.name, session.user.email);
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            let session = store.register(&name, &email, &password).await?;
            println!("Registered {} <{}>", session.user.name, session.user.email);
        }
        Command::Logout => {
            store.logout();
            println!("Logged out");
        }
        Command::Whoami => match store.auth().user {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.id),
            None => println!("Not logged in"),
        },
        Command::Workspaces => {
            require_session(store)?;
            store.fetch_workspaces().await?;
            let current = store.current_workspace_id();
            for workspace in store.workspaces() {
                let marker = if Some(&workspace.id) == current.as_ref() { "*" } else { " " };
                println!("{marker} {}\t{}", workspace.id, workspace.name);
            }
        }
        Command::Use { id } => {
            require_session(store)?;
            store.fetch_workspaces().await?;
            store.set_current_workspace(id.as_str());
            match store.current_workspace() {
                Some(workspace) if workspace.id.as_str() == id => {
                    println!("Now using {}", workspace.name)
                }
                _ => return Err(taskboard_core::PortError::NotFound("Workspace".to_string()).into()),
            }
        }
        Command::Workspace(command) => {
            require_session(store)?;
            store.fetch_workspaces().await?;
            match command {
                WorkspaceCommand::Create { name, description } => {
                    let created = store
                        .create_workspace(WorkspaceDraft {
                            name,
                            description,
                            image_url: None,
                        })
                        .await?;
                    println!("Created workspace {} ({})", created.name, created.id);
                }
                WorkspaceCommand::Delete { id } => {
                    store.remove_workspace(&id.into()).await?;
                    println!("Deleted workspace");
                }
                WorkspaceCommand::Invite { id, email, role } => {
                    store
                        .invite_workspace_member(&id.into(), &email, role)
                        .await?;
                    println!("Invited {email}");
                }
            }
        }
        Command::Projects { all } => {
            require_session(store)?;
            let projects = if all {
                store.list_projects(None).await?
            } else {
                store.fetch_workspaces().await?;
                match store.current_workspace_id() {
                    Some(id) => store.list_projects(Some(&id)).await?,
                    None => Vec::new(),
                }
            };
            for project in projects {
                print_project(&project);
            }
        }
        Command::Project(command) => {
            require_session(store)?;
            store.fetch_workspaces().await?;
            match command {
                ProjectCommand::Create(args) => {
                    let created = store
                        .create_project(ProjectDraft {
                            name: args.name,
                            description: args.description,
                            status: args.status,
                            priority: args.priority,
                            team_members: args.members,
                            ..Default::default()
                        })
                        .await?;
                    println!("Created project {} ({})", created.name, created.id);
                }
                ProjectCommand::Member { project_id, email } => {
                    store.add_project_member(&project_id.into(), &email).await?;
                    println!("Added {email}");
                }
                ProjectCommand::Show { id } => {
                    let project = store.project_details(&id.into()).await?;
                    print_project(&project);
                    for task in &project.tasks {
                        print_task(task);
                    }
                }
            }
        }
        Command::Tasks { project_id } => {
            require_session(store)?;
            let project_id = project_id.map(ProjectId::from);
            for task in store.list_tasks(project_id.as_ref()).await? {
                print_task(&task);
            }
        }
        Command::Task(command) => {
            require_session(store)?;
            store.fetch_workspaces().await?;
            match command {
                TaskCommand::Create(args) => {
                    let created = store
                        .create_task(TaskDraft {
                            project_id: args.project_id.into(),
                            title: args.title,
                            description: args.description,
                            task_type: args.task_type,
                            priority: args.priority,
                            assignee_id: Some(args.assignee.into()),
                            ..Default::default()
                        })
                        .await?;
                    println!("Created task {} ({})", created.title, created.id);
                }
                TaskCommand::Show { id } => {
                    let task = store.task_details(&id.into()).await?;
                    print_task(&task);
                    if let Some(description) = task.description.as_deref() {
                        println!("{description}");
                    }
                }
                TaskCommand::Status { id, status } => {
                    let updated = store.update_task_status(&id.into(), status).await?;
                    println!("{} is now {:?}", updated.title, updated.status);
                }
                TaskCommand::Delete { ids } => match ids.as_slice() {
                    [id] => {
                        store.delete_single_task(&id.as_str().into()).await?;
                        println!("Deleted task");
                    }
                    _ => {
                        let count = ids.len();
                        store
                            .delete_tasks(ids.into_iter().map(Into::into).collect())
                            .await?;
                        println!("Deleted {count} tasks");
                    }
                },
            }
        }
        Command::Comments { task_id } => {
            require_session(store)?;
            for comment in store.list_comments(&task_id.into()).await? {
                let author = comment
                    .user
                    .map(|u| u.name)
                    .unwrap_or_else(|| comment.user_id.to_string());
                println!("{}\t{author}: {}", comment.id, comment.content);
            }
        }
        Command::Comment(command) => {
            require_session(store)?;
            match command {
                CommentCommand::Add { task_id, content } => {
                    let comment = store.add_comment(&task_id.into(), &content).await?;
                    println!("Added comment {}", comment.id);
                }
                CommentCommand::Delete { id } => {
                    store.delete_comment(&id.into()).await?;
                    println!("Deleted comment");
                }
            }
        }
    }
    Ok(())
}
