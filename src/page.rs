use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, TreeSink};
use html5ever::{Attribute, LocalName, Namespace, QualName};
use scraper::{Html, Selector};
use std::sync::LazyLock;

use crate::extract::{first_match, TRIGGER_CONTAINER};
use crate::trigger::TRIGGER_ID;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

static TRIGGER: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(&format!("#{TRIGGER_ID}")).expect("static selector is valid")
});

/// A rendered snapshot of the problem page and the address it came from.
#[derive(Debug)]
pub struct Page {
    pub doc: Html,
    pub url: String,
}

impl Page {
    pub fn new(doc: Html, url: impl Into<String>) -> Self {
        Self {
            doc,
            url: url.into(),
        }
    }

    pub fn parse(html: &str, url: impl Into<String>) -> Self {
        Self::new(Html::parse_document(html), url)
    }

    pub fn has_trigger(&self) -> bool {
        self.doc.select(&TRIGGER).next().is_some()
    }

    /// Append the trigger button to the first matching container. Returns
    /// `false` without touching the document when no container exists; an
    /// existing trigger is left alone.
    pub fn inject_trigger(&mut self, label: &str) -> bool {
        if self.has_trigger() {
            return true;
        }
        let Some(container) = first_match(&self.doc, &TRIGGER_CONTAINER).map(|el| el.id()) else {
            tracing::warn!("could not find a container for the push button");
            return false;
        };

        let button = self.doc.create_element(
            html_name("button"),
            vec![
                attribute("id", TRIGGER_ID),
                attribute("type", "button"),
            ],
            ElementFlags::default(),
        );
        self.doc
            .append(&button, NodeOrText::AppendText(StrTendril::from(label)));
        self.doc.append(&container, NodeOrText::AppendNode(button));
        tracing::debug!("push button added");
        true
    }

    /// Replace the trigger button's text with `label`. Returns `false` when
    /// the page has no trigger.
    pub fn set_trigger_label(&mut self, label: &str) -> bool {
        let Some(button) = self.doc.select(&TRIGGER).next() else {
            return false;
        };
        let button_id = button.id();
        let children: Vec<_> = button.children().map(|child| child.id()).collect();
        for child in &children {
            self.doc.remove_from_parent(child);
        }
        self.doc
            .append(&button_id, NodeOrText::AppendText(StrTendril::from(label)));
        true
    }

    pub fn trigger_label(&self) -> Option<String> {
        self.doc
            .select(&TRIGGER)
            .next()
            .map(|button| button.text().collect())
    }
}

fn html_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(local))
}

fn attribute(name: &str, value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
        value: StrTendril::from(value),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn page(name: &str) -> Page {
        let content = fs::read_to_string(format!("fixtures/{name}")).unwrap();
        Page::parse(&content, "https://neetcode.io/problems/two-sum")
    }

    #[test]
    fn inject_trigger_should_append_into_container() {
        let mut page = page("solved.html");
        assert!(!page.has_trigger());

        assert!(page.inject_trigger("Push to GitHub"));
        assert!(page.has_trigger());

        let selector =
            Selector::parse(".flex.items-center.justify-between.gap-4 > button#neethub-push-button")
                .unwrap();
        let button = page.doc.select(&selector).next().unwrap();
        assert_eq!(button.text().collect::<String>(), "Push to GitHub");
    }

    #[test]
    fn inject_trigger_should_be_idempotent() {
        let mut page = page("solved.html");
        assert!(page.inject_trigger("Push to GitHub"));
        assert!(page.inject_trigger("Push to GitHub"));

        let selector = Selector::parse("#neethub-push-button").unwrap();
        assert_eq!(page.doc.select(&selector).count(), 1);
    }

    #[test]
    fn set_trigger_label_should_replace_button_text() {
        let mut page = page("solved.html");
        assert!(!page.set_trigger_label("Pushing..."));

        page.inject_trigger("Push to GitHub");
        assert!(page.set_trigger_label("Pushing..."));
        assert!(page.set_trigger_label("Pushed!"));
        assert_eq!(page.trigger_label().as_deref(), Some("Pushed!"));
    }

    #[test]
    fn inject_trigger_should_give_up_without_container() {
        let mut page = page("no-container.html");
        assert!(!page.inject_trigger("Push to GitHub"));
        assert!(!page.has_trigger());
    }
}
