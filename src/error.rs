use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not logged in to GitHub.")]
    NotLoggedIn,

    #[error("GitHub repository not selected. Please configure in the NeetHub popup.")]
    RepositoryNotSelected,

    #[error("Invalid repository '{0}', expected <owner>/<name>")]
    InvalidRepository(String),

    #[error("GitHub API Error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid API url: {0}")]
    Url(#[from] url::ParseError),

    #[error("Could not establish connection. {0}")]
    Transport(String),

    #[error("Failed to extract submission: {0}")]
    Extraction(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to render commit message: {0}")]
    Template(#[from] askama::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
