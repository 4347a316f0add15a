//! `projecthub` command-line front end.
//!
//! Every invocation opens the configured database, runs one command and
//! exits. The login session is persisted in the database, so `login` in one
//! invocation authenticates the following ones.

use clap::{Parser, Subcommand};
use log::{error, info};
use projecthub_core::{
    init_logging, open_db, ChangePasswordRequest, CommentNode, HubConfig, JoinRequest, ProjectDraft,
    ProjectHub, ProjectId, ProjectPatch, ProjectQuery, ProjectStatus, RecordId, RegisterRequest,
    SortOrder, SqliteKvStore,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(name = "projecthub", author, version, about, long_about = None)]
struct Args {
    /// Database file; overrides PROJECTHUB_DB_PATH
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core version and store statistics
    Status,
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        surname: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log in by username or email
    Login { identifier: String, password: String },
    Logout,
    Whoami,
    ChangePassword {
        current: String,
        new: String,
        confirm: String,
    },
    /// Set the profile image from a data URL or remote URL
    SetImage { image: String },
    /// Show a user's profile page
    Profile { username: String },
    CreateProject {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// planning | in-progress | completed
        #[arg(long, value_parser = parse_status)]
        status: Option<ProjectStatus>,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    UpdateProject {
        id: ProjectId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<ProjectStatus>,
        #[arg(long)]
        image_url: Option<String>,
        /// Replaces all tags when given at least once
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    DeleteProject { id: ProjectId },
    /// List projects, newest first
    Projects {
        #[arg(long)]
        search: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Keep storage order instead of newest first
        #[arg(long)]
        unsorted: bool,
    },
    Tags,
    /// Show today's featured project
    Featured,
    /// Show a project with its comment thread
    Show { id: ProjectId },
    Join {
        project: ProjectId,
        #[arg(long)]
        comment: Option<String>,
    },
    Reply {
        project: ProjectId,
        parent: RecordId,
        text: String,
    },
    /// Delete a comment and all its replies
    DeleteComment { id: RecordId },
    ClearComments { project: ProjectId },
    Like { project: ProjectId },
}

fn parse_status(value: &str) -> Result<ProjectStatus, String> {
    ProjectStatus::parse(value).ok_or_else(|| format!("unknown status `{value}`"))
}

fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={}", err);
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = HubConfig::from_env()?;
    if let Some(db) = args.db {
        config.db_path = db;
    }
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let conn = open_db(&config.db_path)?;
    let store = SqliteKvStore::try_new(&conn)?;
    let mut hub = ProjectHub::open(&store, &config)?;
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&args.command)
    );

    match args.command {
        Command::Status => {
            println!("projecthub_core version={}", projecthub_core::core_version());
            println!("database={}", config.db_path.display());
            println!("projects={}", hub.projects(&ProjectQuery::default()).count());
            println!("tags={}", hub.available_tags().len());
            match hub.current_user() {
                Some(user) => println!("session={}", user.username),
                None => println!("session=none"),
            }
        }
        Command::Register {
            name,
            surname,
            username,
            email,
            password,
        } => {
            let profile = hub.register(&RegisterRequest {
                name,
                surname,
                username,
                email,
                password,
            })?;
            println!("registered {} ({})", profile.username, profile.id);
        }
        Command::Login {
            identifier,
            password,
        } => {
            let profile = hub.login(&identifier, &password)?;
            println!("logged in as {}", profile.username);
        }
        Command::Logout => {
            hub.logout()?;
            println!("logged out");
        }
        Command::Whoami => match hub.current_user() {
            Some(user) => println!("{} {} (@{})", user.name, user.surname, user.username),
            None => println!("not logged in"),
        },
        Command::ChangePassword {
            current,
            new,
            confirm,
        } => {
            let user_id = hub.current_user().map(|user| user.id).unwrap_or_default();
            hub.change_password(
                user_id,
                &ChangePasswordRequest {
                    current_password: current,
                    new_password: new,
                    confirm_new_password: confirm,
                },
            )?;
            println!("password changed");
        }
        Command::SetImage { image } => {
            let user_id = hub.current_user().map(|user| user.id).unwrap_or_default();
            hub.update_profile_image(user_id, image)?;
            println!("profile image updated");
        }
        Command::Profile { username } => {
            let view = hub.profile(&username)?;
            println!(
                "{} {} (@{}) <{}>",
                view.profile.name, view.profile.surname, view.profile.username, view.profile.email
            );
            println!("image={}", view.image.as_deref().unwrap_or(&view.avatar_url));
            println!("projects={}", view.project_count);
            for project in &view.projects {
                println!("  {}  [{}] {}", project.id, project.status, project.title);
            }
        }
        Command::CreateProject {
            title,
            description,
            status,
            image_url,
            tags,
        } => {
            let project = hub.create_project(ProjectDraft {
                title,
                description,
                status,
                image_url,
                tags,
            })?;
            println!("created {}", project.id);
        }
        Command::UpdateProject {
            id,
            title,
            description,
            status,
            image_url,
            tags,
        } => {
            let project = hub.update_project(
                id,
                ProjectPatch {
                    title,
                    description,
                    status,
                    image_url,
                    tags: (!tags.is_empty()).then_some(tags),
                },
            )?;
            println!("updated {}", project.id);
        }
        Command::DeleteProject { id } => {
            let project = hub.delete_project(id)?;
            println!("deleted {} ({})", project.id, project.title);
        }
        Command::Projects {
            search,
            tags,
            unsorted,
        } => {
            let query = ProjectQuery {
                search,
                tags,
                sort: if unsorted {
                    SortOrder::Unspecified
                } else {
                    SortOrder::Latest
                },
            };
            for project in &hub.projects(&query) {
                println!(
                    "{}  [{}] {}  likes={} tags={}",
                    project.id,
                    project.status,
                    project.title,
                    hub.like_count(project.id),
                    project.tags.join(",")
                );
            }
        }
        Command::Tags => {
            for tag in hub.available_tags() {
                println!("{tag}");
            }
        }
        Command::Featured => {
            let day = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs() / 86_400)
                .unwrap_or_default();
            match hub.featured_project(day) {
                Some(project) => println!("{}  {}", project.id, project.title),
                None => println!("no projects yet"),
            }
        }
        Command::Show { id } => {
            let detail = hub.project_detail(id)?;
            println!("{} [{}]", detail.project.title, detail.project.status);
            println!("{}", detail.project.description);
            println!(
                "owner={} likes={} liked={} participants={}",
                detail.owner_username.unwrap_or("unknown"),
                detail.like_count,
                detail.liked,
                detail.participant_count
            );
            for root in &detail.thread {
                print_thread(root);
            }
        }
        Command::Join { project, comment } => {
            let request = match comment {
                Some(text) => JoinRequest::comment(text),
                None => JoinRequest::join(),
            };
            let record = hub.join(project, request)?;
            println!("joined {}", record.id);
        }
        Command::Reply {
            project,
            parent,
            text,
        } => {
            let record = hub.reply(project, parent, text)?;
            println!("replied {}", record.id);
        }
        Command::DeleteComment { id } => {
            let removed = hub.delete_participant(id)?;
            println!("removed {} record(s)", removed.len());
        }
        Command::ClearComments { project } => {
            let removed = hub.clear_participants(project)?;
            println!("removed {removed} record(s)");
        }
        Command::Like { project } => {
            let state = hub.toggle_like(project)?;
            println!("liked={} count={}", state.liked, state.count);
        }
    }
    Ok(())
}

fn print_thread(root: &CommentNode) {
    for (depth, record) in root.walk() {
        println!(
            "{}- {} {}: {}  ({})",
            "  ".repeat(depth),
            record.name,
            record.surname,
            record.comment.as_deref().unwrap_or("joined"),
            record.id
        );
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Status => "status",
        Command::Register { .. } => "register",
        Command::Login { .. } => "login",
        Command::Logout => "logout",
        Command::Whoami => "whoami",
        Command::ChangePassword { .. } => "change-password",
        Command::SetImage { .. } => "set-image",
        Command::Profile { .. } => "profile",
        Command::CreateProject { .. } => "create-project",
        Command::UpdateProject { .. } => "update-project",
        Command::DeleteProject { .. } => "delete-project",
        Command::Projects { .. } => "projects",
        Command::Tags => "tags",
        Command::Featured => "featured",
        Command::Show { .. } => "show",
        Command::Join { .. } => "join",
        Command::Reply { .. } => "reply",
        Command::DeleteComment { .. } => "delete-comment",
        Command::ClearComments { .. } => "clear-comments",
        Command::Like { .. } => "like",
    }
}
