//! Typed view over the key-value store: the single GitHub account and the
//! repository pushes go to.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::github::{GithubUser, RepoName};
use crate::storage::KeyValueStore;

pub const TOKEN_KEY: &str = "githubToken";
pub const USER_KEY: &str = "githubUser";
pub const REPO_KEY: &str = "selectedRepo";

/// Raw stored values. `selected_repository` stays a string until
/// [`StoredCredentials::require`] so a missing token is reported before a
/// malformed repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredCredentials {
    pub access_token: Option<String>,
    pub selected_repository: Option<String>,
}

impl StoredCredentials {
    /// Check the push preconditions in order: token first, then repository.
    pub fn require(&self) -> Result<(&str, RepoName)> {
        let token = self.access_token.as_deref().ok_or(Error::NotLoggedIn)?;
        let repo = self
            .selected_repository
            .as_deref()
            .ok_or(Error::RepositoryNotSelected)?
            .parse()?;
        Ok((token, repo))
    }
}

#[derive(Debug, Clone)]
pub struct Session<S> {
    store: S,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn credentials(&self) -> Result<StoredCredentials> {
        Ok(StoredCredentials {
            access_token: self.get_string(TOKEN_KEY)?,
            selected_repository: self.get_string(REPO_KEY)?,
        })
    }

    pub fn user(&self) -> Result<Option<GithubUser>> {
        match self.store.get(USER_KEY)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn is_logged_in(&self) -> Result<bool> {
        Ok(self.get_string(TOKEN_KEY)?.is_some() && self.user()?.is_some())
    }

    pub fn login(&self, token: &str, user: &GithubUser) -> Result<()> {
        self.store.set(vec![
            (TOKEN_KEY, Value::String(token.to_string())),
            (USER_KEY, serde_json::to_value(user)?),
        ])?;
        tracing::info!(login = %user.login, "stored GitHub credentials");
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.store.remove(&[TOKEN_KEY, USER_KEY, REPO_KEY])?;
        tracing::info!("cleared GitHub credentials");
        Ok(())
    }

    pub fn select_repository(&self, repo: &RepoName) -> Result<()> {
        self.store
            .set(vec![(REPO_KEY, Value::String(repo.to_string()))])?;
        tracing::info!(%repo, "selected repository");
        Ok(())
    }

    // Empty strings count as unset.
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .store
            .get(key)?
            .and_then(|value| value.as_str().map(str::to_string))
            .filter(|value| !value.is_empty()))
    }
}
