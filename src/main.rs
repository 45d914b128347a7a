use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use neethub::extractor::{Activation, Extractor};
use neethub::github::{GithubClient, GithubClientBuilder, RepoName, DEFAULT_API_BASE};
use neethub::message::{self, PushResult};
use neethub::page::Page;
use neethub::session::Session;
use neethub::storage::FileStore;
use neethub::sync::Syncer;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "neethub", author, version)]
#[command(about = "Push accepted NeetCode solutions to a GitHub repository")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Credential store (defaults to <config dir>/neethub/storage.json)
    #[arg(long, global = true, env = "NEETHUB_STORE")]
    store: Option<PathBuf>,

    /// GitHub REST API base url
    #[arg(long, global = true, env = "NEETHUB_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a GitHub token and store it with the user's profile
    Login {
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// Forget the stored token, user and repository
    Logout,
    /// Show the logged-in user and selected repository
    Status,
    /// List the user's repositories, most recently updated first
    Repos,
    /// Select the repository solutions are pushed to
    Select {
        /// Repository as <owner>/<name>
        repo: String,
    },
    /// Create a public (or private) repository and select it
    CreateRepo {
        name: String,
        #[arg(long)]
        private: bool,
    },
    /// Push the solution shown on a saved problem page
    Push {
        /// HTML snapshot of the solved-problem page
        #[arg(long, value_name = "FILE")]
        page: PathBuf,
        /// Address the page was captured from
        #[arg(long)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store_path = match cli.store {
        Some(path) => path,
        None => FileStore::default_path()?,
    };
    let session = Session::new(FileStore::new(store_path));
    let client = GithubClientBuilder::default()
        .api_base(cli.api_base)
        .build()?;

    match cli.command {
        Commands::Login { token } => login(&session, &client, &token).await,
        Commands::Logout => {
            session.logout()?;
            println!("Logged out.");
            Ok(())
        }
        Commands::Status => status(&session),
        Commands::Repos => repos(&session, &client).await,
        Commands::Select { repo } => {
            let repo: RepoName = repo.parse()?;
            session.select_repository(&repo)?;
            println!("Using repo: {repo}");
            Ok(())
        }
        Commands::CreateRepo { name, private } => {
            create_repo(&session, &client, &name, private).await
        }
        Commands::Push { page, url } => push(session, client, page, url).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "neethub=debug" } else { "neethub=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn require_token(session: &Session<FileStore>) -> Result<String> {
    session
        .credentials()?
        .access_token
        .ok_or_else(|| neethub::Error::NotLoggedIn.into())
}

async fn login(session: &Session<FileStore>, client: &GithubClient, token: &str) -> Result<()> {
    let user = client
        .current_user(token)
        .await
        .context("Login failed: could not fetch user info")?;
    session.login(token, &user)?;
    println!("Welcome, {}!", user.login);
    Ok(())
}

fn status(session: &Session<FileStore>) -> Result<()> {
    let user = session.user()?;
    let credentials = session.credentials()?;
    match (user, credentials.access_token) {
        (Some(user), Some(_)) => {
            let repo = credentials
                .selected_repository
                .map(|repo| format!("Using repo: {repo}"))
                .unwrap_or_else(|| "Repo not selected".to_string());
            println!("Welcome, {}! ({repo})", user.login);
        }
        _ => println!("Not logged in."),
    }
    Ok(())
}

async fn repos(session: &Session<FileStore>, client: &GithubClient) -> Result<()> {
    let token = require_token(session)?;
    let selected = session.credentials()?.selected_repository;
    let repos = client
        .list_repositories(&token)
        .await
        .context("Failed to fetch repositories")?;
    if repos.is_empty() {
        println!("No repositories found. You can create one with `neethub create-repo`.");
    }
    for repo in repos {
        let marker = if selected.as_deref() == Some(repo.full_name.as_str()) {
            "*"
        } else {
            " "
        };
        let visibility = if repo.private { " (Private)" } else { "" };
        println!("{marker} {}{visibility}", repo.full_name);
    }
    Ok(())
}

async fn create_repo(
    session: &Session<FileStore>,
    client: &GithubClient,
    name: &str,
    private: bool,
) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Please enter a name for the new repository.");
    }
    let token = require_token(session)?;
    let repo = client
        .create_repository(&token, name, private)
        .await
        .context("Failed to create repository")?;
    session.select_repository(&repo.full_name.parse::<RepoName>()?)?;
    println!("Created and selected {}", repo.full_name);
    Ok(())
}

async fn push(
    session: Session<FileStore>,
    client: GithubClient,
    page: PathBuf,
    url: String,
) -> Result<()> {
    let html = fs::read_to_string(&page)
        .with_context(|| format!("Failed to read page snapshot {}", page.display()))?;

    let (handle, inbox) = message::channel(1);
    let syncer = tokio::spawn(Syncer::new(session, client).serve(inbox));

    let mut extractor = Extractor::new(handle);
    if !extractor.observe(Page::parse(&html, url)) {
        bail!("No accepted submission with a place for the push button found on the page");
    }
    let activation = extractor.activate().await;
    let label = extractor
        .control()
        .map(ToString::to_string)
        .unwrap_or_default();
    drop(extractor);
    syncer.await?;

    match activation {
        Activation::Completed(PushResult::Pushed { url }) => {
            println!("{label}");
            if let Some(url) = url {
                println!("{url}");
            }
            Ok(())
        }
        Activation::Completed(PushResult::Failed { error }) => {
            bail!("{label}\n{error}")
        }
        Activation::ExtractionFailed(error) | Activation::TransportFailed(error) => {
            bail!("{label}\n{error}")
        }
        Activation::NoControl | Activation::Ignored | Activation::Open(_) => {
            bail!("{label}")
        }
    }
}
