//! CLI commands

use anyhow::{Result, bail};
use clap::Subcommand;
use portal_client::{
    CatalogClient, ClientConfig, CourseFilter, FetchOutcome, FileTokenStore, SessionManager,
    TokenStore, UserData,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config;
use crate::state_dir::StateDir;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        username: String,

        /// Password (prefer the environment variable over the flag)
        #[arg(short, long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the session and remove stored tokens
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Ask the server whether the stored access token is valid
    Verify,

    /// List catalog courses
    Courses {
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        min_hours: Option<u32>,

        #[arg(long)]
        max_hours: Option<u32>,

        /// Teacher id
        #[arg(long)]
        teacher: Option<u64>,
    },

    /// List the courses of the logged-in user
    MyCourses {
        #[arg(long)]
        id: Option<u64>,
    },

    /// Show one course
    Course { id: u64 },

    /// List topics
    Topics,

    /// List tasks
    Tasks,

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate a default configuration file
    Init {
        /// Output file path (defaults to <data dir>/config.json)
        output: Option<PathBuf>,
    },
}

/// Inputs shared by every command
pub struct Context {
    pub state: StateDir,
    pub config_path: Option<PathBuf>,
}

impl Context {
    fn client_config(&self) -> Result<ClientConfig> {
        config::load_client_config(self.config_path.as_deref(), &self.state.config_file())
    }

    /// Session bound to the session file with stored tokens loaded, no network
    fn local_session(&self) -> Result<SessionManager> {
        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(self.state.session_file()));
        let session = SessionManager::from_config(&self.client_config()?, store)?;
        session.restore_tokens();
        Ok(session)
    }

    /// Restored session with its profile loaded
    async fn session(&self) -> Result<SessionManager> {
        let session = self.local_session()?;
        if session.is_authenticated() {
            if let FetchOutcome::Failed(e) = session.fetch_user_profile().await {
                debug!(error = %e, "continuing without a user profile");
            }
            debug!("restored stored session");
        }
        Ok(session)
    }

    async fn catalog(&self) -> Result<CatalogClient> {
        Ok(CatalogClient::new(self.session().await?))
    }
}

impl Commands {
    pub async fn execute(self, ctx: Context) -> Result<()> {
        match self {
            Commands::Login { username, password } => login(&ctx, &username, &password).await,
            Commands::Logout => {
                let session = ctx.local_session()?;
                session.logout();
                print_json(&serde_json::json!({"logged_in": false}))
            }
            Commands::Whoami => whoami(&ctx).await,
            Commands::Verify => {
                let session = ctx.session().await?;
                let valid = session.verify_token().await?;
                print_json(&serde_json::json!({"valid": valid}))
            }
            Commands::Courses {
                title,
                description,
                min_hours,
                max_hours,
                teacher,
            } => {
                let filter = CourseFilter {
                    id: None,
                    title,
                    description,
                    min_hours,
                    max_hours,
                    teacher,
                };
                let catalog = ctx.catalog().await?;
                catalog.fetch_courses(&filter).await.into_result()?;
                print_json(&catalog.courses())
            }
            Commands::MyCourses { id } => {
                let catalog = ctx.catalog().await?;
                require_login(catalog.session())?;
                catalog.fetch_my_courses(id).await.into_result()?;
                print_json(&catalog.my_courses())
            }
            Commands::Course { id } => {
                let catalog = ctx.catalog().await?;
                require_login(catalog.session())?;
                catalog.fetch_course(id).await.into_result()?;
                print_json(&catalog.current_course())
            }
            Commands::Topics => {
                let catalog = ctx.catalog().await?;
                require_login(catalog.session())?;
                catalog.fetch_topics().await.into_result()?;
                print_json(&catalog.current_topics())
            }
            Commands::Tasks => {
                let catalog = ctx.catalog().await?;
                require_login(catalog.session())?;
                catalog.fetch_tasks().await.into_result()?;
                print_json(&catalog.current_tasks())
            }
            Commands::Config { command } => command.execute(&ctx),
        }
    }
}

impl ConfigCommands {
    pub fn execute(self, ctx: &Context) -> Result<()> {
        match self {
            ConfigCommands::Init { output } => {
                let config_path = output.unwrap_or_else(|| ctx.state.config_file());

                // Create parent directory if it doesn't exist
                if let Some(parent) = config_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }

                config::generate_default_config(&config_path)?;
                println!("Generated configuration at: {}", config_path.display());
                Ok(())
            }
        }
    }
}

async fn login(ctx: &Context, username: &str, password: &str) -> Result<()> {
    let session = ctx.session().await?;
    session.login(username, password).await?;
    info!(username, "login succeeded");

    let user = session.user();
    print_json(&serde_json::json!({
        "logged_in": true,
        "username": user.as_ref().map_or(username, |u| u.username.as_str()),
        "role": user.as_ref().map(|u| u.role),
        "session_file": ctx.state.session_file(),
    }))
}

async fn whoami(ctx: &Context) -> Result<()> {
    let session = ctx.session().await?;
    require_login(&session)?;

    let user = match session.user() {
        Some(user) => user,
        None => {
            session.fetch_user_profile().await.into_result()?;
            match session.user() {
                Some(user) => user,
                None => bail!("profile unavailable"),
            }
        }
    };
    print_json(&profile_output(&user)?)
}

/// Profile as JSON with its display name alongside
fn profile_output(user: &UserData) -> Result<serde_json::Value> {
    let mut output = serde_json::to_value(user)?;
    output["display_name"] = user.display_name().into();
    Ok(output)
}

fn require_login(session: &SessionManager) -> Result<()> {
    if !session.is_authenticated() {
        bail!("not logged in; run `portal login --username <name>` first");
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
