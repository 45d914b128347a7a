//! Background side of a push: an idempotent upsert of one file through the
//! GitHub Contents API.

use askama::Template;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::Result;
use crate::github::{ContentsApi, PutContents, RemoteFileState};
use crate::message::{Inbox, Message, PushResult, SubmissionPayload};
use crate::session::Session;
use crate::storage::KeyValueStore;

#[derive(Template)]
#[template(path = "commit.txt")]
struct CommitMessage<'a> {
    title: &'a str,
    language: &'a str,
    source_url: &'a str,
}

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize(slug: &str) -> String {
    slug.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Repository path a submission is written to. Same slug, same path.
pub fn file_path(payload: &SubmissionPayload) -> String {
    format!("{}.{}", sanitize(&payload.problem_slug), payload.file_extension)
}

pub fn commit_message(payload: &SubmissionPayload) -> Result<String> {
    let message = CommitMessage {
        title: &payload.problem_title,
        language: &payload.language,
        source_url: &payload.source_url,
    };
    Ok(message.render()?)
}

/// Base64 of the UTF-8 bytes, as the `content` field expects.
pub fn encode_content(code: &str) -> String {
    STANDARD.encode(code.as_bytes())
}

pub struct Syncer<S, A> {
    session: Session<S>,
    api: A,
}

impl<S, A> Syncer<S, A>
where
    S: KeyValueStore,
    A: ContentsApi,
{
    pub fn new(session: Session<S>, api: A) -> Self {
        Self { session, api }
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    /// Serve requests one at a time until every sender is gone.
    pub async fn serve(self, mut inbox: Inbox) {
        while let Some(request) = inbox.recv().await {
            let result = self.handle(&request.message).await;
            request.respond(result);
        }
        tracing::debug!("all senders dropped, syncer stopping");
    }

    pub async fn handle(&self, message: &Message) -> PushResult {
        match message {
            Message::PushCodeToGithub(payload) => self.push(payload).await,
        }
    }

    /// Never fails: every error becomes [`PushResult::Failed`].
    #[tracing::instrument(skip_all, fields(slug = %payload.problem_slug))]
    pub async fn push(&self, payload: &SubmissionPayload) -> PushResult {
        match self.try_push(payload).await {
            Ok(url) => PushResult::Pushed { url },
            Err(e) => {
                tracing::error!(error = %e, "error processing push request");
                PushResult::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn try_push(&self, payload: &SubmissionPayload) -> Result<Option<String>> {
        let credentials = self.session.credentials()?;
        let (token, repo) = credentials.require()?;

        let path = file_path(payload);
        let message = commit_message(payload)?;
        let content = encode_content(&payload.code);

        // Best effort: if the check fails for any reason other than a 404 we
        // still attempt the write, as a create.
        let existing = match self.api.get_contents(token, &repo, &path).await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    %path,
                    "could not check file existence (maybe repo is brand new?), proceeding with creation attempt"
                );
                RemoteFileState::default()
            }
        };
        if let Some(sha) = &existing.sha {
            tracing::info!(%path, %sha, "file exists, updating");
        } else {
            tracing::info!(%path, "file does not exist, creating");
        }

        let body = PutContents {
            message,
            content,
            sha: existing.sha,
        };
        let response = self.api.put_contents(token, &repo, &path, &body).await?;
        let url = response.html_url().map(str::to_string);
        tracing::info!(%repo, %path, "pushed to GitHub");
        Ok(url)
    }
}
