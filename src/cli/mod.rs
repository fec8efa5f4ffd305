pub mod auth;
pub mod cases;
pub mod export;
pub mod plans;
pub mod projects;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::app::App;
use crate::error::{Result, TmsError};
use crate::export::EntityType;
use crate::navigation::Route;

/// Top-level CLI parser for the `tms` binary.
#[derive(Debug, Parser)]
#[command(name = "tms", version, about = "Test management client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API root, e.g. http://localhost:8080/api/v1
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Config file (defaults to ~/.config/tms/config.yml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in and store the session token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Test plans.
    Plans {
        #[command(subcommand)]
        action: PlanCommands,
    },
    /// Test cases.
    Cases {
        #[command(subcommand)]
        action: CaseCommands,
    },
    /// Projects.
    Projects {
        #[command(subcommand)]
        action: ProjectCommands,
    },
    /// Export an entity as markdown.
    Export(ExportArgs),
}

#[derive(Debug, Clone, Copy, Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = 20)]
    pub size: u32,
}

#[derive(Debug, Subcommand)]
pub enum PlanCommands {
    List {
        #[arg(long)]
        project: String,
        #[command(flatten)]
        page: PageArgs,
    },
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        project: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// RFC 3339 date-time
        #[arg(long)]
        deadline: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        deadline: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Attach an existing test case to a plan.
    AddCase {
        plan_id: String,
        case_id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum CaseCommands {
    List {
        #[arg(long)]
        project: String,
        #[command(flatten)]
        page: PageArgs,
    },
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        project: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        pre_steps: String,
        #[arg(long, default_value = "")]
        expected_result: String,
        /// Repeat for each step, in order
        #[arg(long = "step")]
        steps: Vec<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        pre_steps: Option<String>,
        #[arg(long)]
        expected_result: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommands {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// test_plan, test_case, checklist, test_strategy or test_run
    pub entity_type: EntityType,
    pub id: String,
    /// Include change history
    #[arg(long)]
    pub history: bool,
    /// Include comments
    #[arg(long)]
    pub comments: bool,
    /// Directory to save into (defaults to the configured download dir)
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Use the per-entity export route instead of POST /export
    #[arg(long)]
    pub per_entity: bool,
}

/// Run a parsed command against a wired app.
pub async fn dispatch(command: Commands, app: &App) -> Result<()> {
    match command {
        Commands::Login { email, password } => auth::run_login(app, email, password).await,
        Commands::Register {
            name,
            email,
            password,
        } => auth::run_register(app, name, email, password).await,
        Commands::Logout => auth::run_logout(app),
        Commands::Whoami => {
            require_session(app).await?;
            auth::run_whoami(app)
        }
        Commands::Plans { action } => {
            require_session(app).await?;
            plans::run(app, action).await
        }
        Commands::Cases { action } => {
            require_session(app).await?;
            cases::run(app, action).await
        }
        Commands::Projects { action } => {
            require_session(app).await?;
            projects::run(app, action).await
        }
        Commands::Export(args) => {
            require_session(app).await?;
            export::run_export(app, args).await
        }
    }
}

/// Restore the stored session; refuse to continue without one.
async fn require_session(app: &App) -> Result<()> {
    if app.start(Route::Dashboard).await == Route::Login {
        return Err(TmsError::Unauthorized {
            body: "not logged in".into(),
        });
    }
    Ok(())
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn export_parses_entity_type() {
        let cli = Cli::parse_from(["tms", "export", "test-plan", "42", "--history"]);
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.entity_type.as_str(), "test_plan");
                assert_eq!(args.id, "42");
                assert!(args.history);
                assert!(!args.comments);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
