//! Page side of a push: watch snapshots for an accepted submission, offer
//! the trigger control, scrape on activation and relay the reply.

use crate::extract;
use crate::message::{Message, PushResult, SyncerHandle};
use crate::page::Page;
use crate::trigger::{Press, TriggerControl};

/// Result of one activation of the trigger control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// No control has been injected.
    NoControl,
    /// The control was disabled.
    Ignored,
    /// The control links to a committed file; open it in a new tab.
    Open(String),
    /// Scraping failed; nothing was sent.
    ExtractionFailed(String),
    /// The syncer could not be reached or never answered.
    TransportFailed(String),
    Completed(PushResult),
}

pub struct Extractor {
    syncer: SyncerHandle,
    page: Option<Page>,
    control: Option<TriggerControl>,
}

impl Extractor {
    pub fn new(syncer: SyncerHandle) -> Self {
        Self {
            syncer,
            page: None,
            control: None,
        }
    }

    pub fn control(&self) -> Option<&TriggerControl> {
        self.control.as_ref()
    }

    pub fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    /// Handle one DOM mutation, given the page as it now looks. Returns
    /// whether a trigger control is present afterwards.
    pub fn observe(&mut self, mut page: Page) -> bool {
        if page.has_trigger() {
            // Our own button survived the mutation: keep its state.
            let control = self.control.get_or_insert_with(TriggerControl::new);
            page.set_trigger_label(&control.to_string());
        } else if extract::is_submission_accepted(&page.doc) {
            tracing::info!("detected successful submission state");
            let control = TriggerControl::new();
            self.control = page
                .inject_trigger(&control.to_string())
                .then_some(control);
        } else {
            self.control = None;
        }
        self.page = Some(page);
        self.control.is_some()
    }

    /// Press the trigger control. A push scrapes the current page, sends a
    /// single message and waits for its reply without a timeout. The button
    /// in the page always shows the control's current label.
    pub async fn activate(&mut self) -> Activation {
        let (Some(control), Some(page)) = (self.control.as_mut(), self.page.as_mut()) else {
            return Activation::NoControl;
        };

        match control.press() {
            Press::Ignored => return Activation::Ignored,
            Press::Open(url) => return Activation::Open(url),
            Press::Push => {}
        }
        page.set_trigger_label(&control.to_string());

        let payload = match extract::build_payload(&page.doc, &page.url) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "error extracting data");
                control.extraction_failed();
                page.set_trigger_label(&control.to_string());
                return Activation::ExtractionFailed(e.to_string());
            }
        };

        tracing::info!(
            slug = %payload.problem_slug,
            language = %payload.language,
            "sending submission to syncer"
        );
        match self.syncer.send(Message::PushCodeToGithub(payload)).await {
            Ok(result) => {
                match &result {
                    PushResult::Pushed { url } => {
                        tracing::info!(url = url.as_deref().unwrap_or("-"), "push successful")
                    }
                    PushResult::Failed { error } => tracing::error!(%error, "push failed"),
                }
                control.finish(&result);
                page.set_trigger_label(&control.to_string());
                Activation::Completed(result)
            }
            Err(e) => {
                tracing::error!(error = %e, "error sending message");
                control.transport_failed();
                page.set_trigger_label(&control.to_string());
                Activation::TransportFailed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::message::{channel, SubmissionPayload};
    use crate::trigger::ControlState;

    fn solved_page() -> Page {
        let content = fs::read_to_string("fixtures/solved.html").unwrap();
        Page::parse(&content, "https://neetcode.io/problems/two-sum")
    }

    /// Answer every request with `result` and hand back what was received.
    fn reply_with(result: PushResult) -> (SyncerHandle, tokio::task::JoinHandle<Vec<Message>>) {
        let (handle, mut inbox) = channel(4);
        let task = tokio::spawn(async move {
            let mut received = vec![];
            while let Some(request) = inbox.recv().await {
                received.push(request.message.clone());
                request.respond(result.clone());
            }
            received
        });
        (handle, task)
    }

    #[test]
    fn observe_should_inject_control_once() {
        let (handle, _inbox) = channel(1);
        let mut extractor = Extractor::new(handle);

        assert!(extractor.observe(solved_page()));
        assert_eq!(extractor.control(), Some(&TriggerControl::new()));

        // The next mutation hands back the page that already has the button.
        let page = extractor.page().unwrap();
        let again = Page::new(page.doc.clone(), page.url.clone());
        assert!(extractor.observe(again));
        assert_eq!(extractor.control(), Some(&TriggerControl::new()));

        let button = scraper::Selector::parse("#neethub-push-button").unwrap();
        let page = extractor.page().unwrap();
        assert_eq!(page.doc.select(&button).count(), 1);
        assert_eq!(page.trigger_label().as_deref(), Some("Push to GitHub"));
    }

    #[tokio::test]
    async fn observe_should_keep_state_of_existing_control() {
        let (handle, _task) = reply_with(PushResult::Failed {
            error: "Not logged in to GitHub.".into(),
        });
        let mut extractor = Extractor::new(handle);
        extractor.observe(solved_page());
        extractor.activate().await;

        let page = extractor.page().unwrap();
        let again = Page::new(page.doc.clone(), page.url.clone());
        assert!(extractor.observe(again));
        assert_eq!(
            extractor.control().unwrap().state(),
            &ControlState::PushFailed {
                error: "Not logged in to GitHub.".into()
            }
        );
        assert_eq!(
            extractor.page().unwrap().trigger_label().as_deref(),
            Some("Error: Not logged in to GitHub.")
        );
    }

    #[test]
    fn observe_should_skip_pages_without_success_or_container() {
        let (handle, _inbox) = channel(1);
        let mut extractor = Extractor::new(handle);

        for name in ["pending.html", "no-container.html"] {
            let content = fs::read_to_string(format!("fixtures/{name}")).unwrap();
            assert!(!extractor.observe(Page::parse(&content, "https://neetcode.io/problems/two-sum")));
            assert!(extractor.control().is_none());
        }
    }

    #[tokio::test]
    async fn activate_should_send_payload_and_link_result() {
        let url = "https://github.com/me/solutions/blob/main/two-sum.py";
        let (handle, task) = reply_with(PushResult::Pushed {
            url: Some(url.into()),
        });
        let mut extractor = Extractor::new(handle);
        extractor.observe(solved_page());

        let activation = extractor.activate().await;
        assert_eq!(
            activation,
            Activation::Completed(PushResult::Pushed {
                url: Some(url.into())
            })
        );
        assert_eq!(extractor.control().unwrap().to_string(), "Pushed!");
        assert_eq!(
            extractor.page().unwrap().trigger_label().as_deref(),
            Some("Pushed!")
        );
        assert_eq!(extractor.activate().await, Activation::Open(url.into()));

        drop(extractor);
        let received = task.await.unwrap();
        assert_eq!(received.len(), 1);
        let Message::PushCodeToGithub(SubmissionPayload {
            problem_slug,
            file_extension,
            ..
        }) = &received[0];
        assert_eq!(problem_slug, "two-sum");
        assert_eq!(file_extension, "py");
    }

    #[tokio::test]
    async fn failed_push_should_leave_control_disabled() {
        let (handle, _task) = reply_with(PushResult::Failed {
            error: "Not logged in to GitHub.".into(),
        });
        let mut extractor = Extractor::new(handle);
        extractor.observe(solved_page());

        extractor.activate().await;
        assert_eq!(
            extractor.control().unwrap().to_string(),
            "Error: Not logged in to GitHub."
        );
        assert_eq!(extractor.activate().await, Activation::Ignored);
    }

    #[tokio::test]
    async fn missing_syncer_should_be_a_transport_failure() {
        let (handle, inbox) = channel(1);
        drop(inbox);
        let mut extractor = Extractor::new(handle);
        extractor.observe(solved_page());

        let activation = extractor.activate().await;
        assert!(matches!(activation, Activation::TransportFailed(_)));
        assert_eq!(
            extractor.control().unwrap().state(),
            &ControlState::TransportFailed
        );
        assert_eq!(extractor.activate().await, Activation::Ignored);
    }

    #[tokio::test]
    async fn extraction_failure_should_not_send_and_reenable() {
        let (handle, task) = reply_with(PushResult::Pushed { url: None });
        let mut extractor = Extractor::new(handle);
        let content = fs::read_to_string("fixtures/solved.html").unwrap();
        extractor.observe(Page::parse(&content, "not a url"));

        let activation = extractor.activate().await;
        assert!(matches!(activation, Activation::ExtractionFailed(_)));
        let control = extractor.control().unwrap();
        assert_eq!(control.to_string(), "Error Extracting Data");
        assert!(control.is_enabled());
        assert_eq!(
            extractor.page().unwrap().trigger_label().as_deref(),
            Some("Error Extracting Data")
        );

        drop(extractor);
        assert!(task.await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn activate_without_control_should_do_nothing() {
        let (handle, _inbox) = channel(1);
        let mut extractor = Extractor::new(handle);
        assert_eq!(extractor.activate().await, Activation::NoControl);
    }
}
