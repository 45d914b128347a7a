//! The "Push to GitHub" control injected next to an accepted submission.

use std::fmt;

use crate::message::PushResult;

pub const TRIGGER_ID: &str = "neethub-push-button";
const ERROR_DETAIL_LIMIT: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlState {
    Ready,
    Pending,
    Pushed { url: Option<String> },
    ExtractionFailed,
    TransportFailed,
    PushFailed { error: String },
}

/// What pressing the control asks the extractor to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Press {
    /// Disabled; nothing happens.
    Ignored,
    /// Start a push. The control is already pending.
    Push,
    /// The control is a link to the committed file.
    Open(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerControl {
    state: ControlState,
}

impl Default for TriggerControl {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerControl {
    pub fn new() -> Self {
        Self {
            state: ControlState::Ready,
        }
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn is_enabled(&self) -> bool {
        match &self.state {
            ControlState::Ready | ControlState::ExtractionFailed => true,
            ControlState::Pushed { url } => url.is_some(),
            ControlState::Pending
            | ControlState::TransportFailed
            | ControlState::PushFailed { .. } => false,
        }
    }

    /// A ready control goes pending right away so a second press while the
    /// push is in flight is ignored.
    pub fn press(&mut self) -> Press {
        if !self.is_enabled() {
            return Press::Ignored;
        }
        if let ControlState::Pushed { url: Some(url) } = &self.state {
            return Press::Open(url.clone());
        }
        self.state = ControlState::Pending;
        Press::Push
    }

    /// Nothing was sent, so the control can be pressed again.
    pub fn extraction_failed(&mut self) {
        self.state = ControlState::ExtractionFailed;
    }

    pub fn transport_failed(&mut self) {
        self.state = ControlState::TransportFailed;
    }

    pub fn finish(&mut self, result: &PushResult) {
        self.state = match result {
            PushResult::Pushed { url } => ControlState::Pushed { url: url.clone() },
            PushResult::Failed { error } => ControlState::PushFailed {
                error: error.clone(),
            },
        };
    }
}

impl fmt::Display for TriggerControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            ControlState::Ready => f.write_str("Push to GitHub"),
            ControlState::Pending => f.write_str("Pushing..."),
            ControlState::Pushed { .. } => f.write_str("Pushed!"),
            ControlState::ExtractionFailed => f.write_str("Error Extracting Data"),
            ControlState::TransportFailed => f.write_str("Error (See Console)"),
            ControlState::PushFailed { error } if error.is_empty() => f.write_str("Error: Failed"),
            ControlState::PushFailed { error } => {
                let detail: String = error.chars().take(ERROR_DETAIL_LIMIT).collect();
                write!(f, "Error: {detail}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_should_go_pending_and_block_reentry() {
        let mut control = TriggerControl::new();
        assert_eq!(control.to_string(), "Push to GitHub");

        assert_eq!(control.press(), Press::Push);
        assert_eq!(control.to_string(), "Pushing...");
        assert!(!control.is_enabled());
        assert_eq!(control.press(), Press::Ignored);
    }

    #[test]
    fn success_with_url_should_become_a_link() {
        let mut control = TriggerControl::new();
        control.press();
        control.finish(&PushResult::Pushed {
            url: Some("https://github.com/me/solutions/blob/main/two-sum.py".into()),
        });

        assert_eq!(control.to_string(), "Pushed!");
        assert!(control.is_enabled());
        assert_eq!(
            control.press(),
            Press::Open("https://github.com/me/solutions/blob/main/two-sum.py".into())
        );
    }

    #[test]
    fn success_without_url_should_stay_disabled() {
        let mut control = TriggerControl::new();
        control.press();
        control.finish(&PushResult::Pushed { url: None });

        assert_eq!(control.to_string(), "Pushed!");
        assert_eq!(control.press(), Press::Ignored);
    }

    #[test]
    fn failure_should_truncate_error_and_stay_disabled() {
        let mut control = TriggerControl::new();
        control.press();
        control.finish(&PushResult::Failed {
            error: "GitHub API Error (422): Validation failed".into(),
        });

        assert_eq!(control.to_string(), "Error: GitHub API Error (422): Valida");
        assert_eq!(control.press(), Press::Ignored);

        control.finish(&PushResult::Failed { error: String::new() });
        assert_eq!(control.to_string(), "Error: Failed");
    }

    #[test]
    fn extraction_failure_should_allow_another_press() {
        let mut control = TriggerControl::new();
        control.press();
        control.extraction_failed();

        assert_eq!(control.to_string(), "Error Extracting Data");
        assert_eq!(control.press(), Press::Push);
    }

    #[test]
    fn transport_failure_should_stay_disabled() {
        let mut control = TriggerControl::new();
        control.press();
        control.transport_failed();

        assert_eq!(control.to_string(), "Error (See Console)");
        assert_eq!(control.press(), Press::Ignored);
    }
}
