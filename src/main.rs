use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use login_portal::config::PortalConfig;
use login_portal::error::{ApiError, ConfigError};
use login_portal::net::api::{ApiClient, UserApi};
use login_portal::page::{Page, TerminalPage};
use login_portal::pages::dashboard::{DashboardOutcome, DashboardPage};
use login_portal::pages::login::{LoginOutcome, LoginPage};
use login_portal::session::{FileStore, Session};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("http client error: {0}")]
    Api(#[from] ApiError),
    #[error("missing password; pass --password or set PORTAL_PASSWORD")]
    MissingPassword,
}

#[derive(Parser, Debug)]
#[command(name = "login-portal", about = "Login and dashboard client for the /usuarios API")]
struct Cli {
    #[arg(long, env = "API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "PORTAL_STORAGE_PATH")]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit credentials, then open the dashboard on success.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Load the dashboard for the stored identity.
    Dashboard,
    /// Clear the stored identity and notify the API.
    Logout,
    /// Print the stored identity without contacting the API.
    Whoami,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let mut config = PortalConfig::from_env_with_base_url(cli.base_url.as_deref())?;
    if let Some(storage) = cli.storage {
        config.storage_path = storage;
    }
    debug!(base_url = %config.api_base_url, storage = %config.storage_path.display(), "portal configured");

    let session = Session::new(Arc::new(FileStore::new(&config.storage_path)));
    let page: Arc<dyn Page> = Arc::new(TerminalPage::stdout());
    let api: Arc<dyn UserApi> = Arc::new(ApiClient::new(&config)?);

    match cli.command {
        Command::Login { username, password } => {
            let password = password.ok_or(CliError::MissingPassword)?;
            let login = LoginPage::new(Arc::clone(&api), session.clone(), Arc::clone(&page));
            match login.submit(&username, &password).await {
                LoginOutcome::LoggedIn(_) => Ok(show_dashboard(api, session, page).await),
                _ => Ok(ExitCode::FAILURE),
            }
        }
        Command::Dashboard => Ok(show_dashboard(api, session, page).await),
        Command::Logout => {
            if let Some(notice) = DashboardPage::new(api, session, page).logout() {
                if tokio::time::timeout(config.logout_grace, notice).await.is_err() {
                    debug!("logout notification still pending at exit");
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Whoami => match session.current() {
            Some(username) => {
                println!("{username}");
                Ok(ExitCode::SUCCESS)
            }
            None => {
                println!("not logged in");
                Ok(ExitCode::FAILURE)
            }
        },
    }
}

async fn show_dashboard(api: Arc<dyn UserApi>, session: Session, page: Arc<dyn Page>) -> ExitCode {
    match DashboardPage::new(api, session, page).load().await {
        DashboardOutcome::Welcomed(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
