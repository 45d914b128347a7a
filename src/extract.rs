//! Scraping a solved-problem page into a [`SubmissionPayload`].
//!
//! Every lookup is an ordered list of selectors or named strategies where the
//! first hit wins, so the site can move markup around without breaking the
//! whole pipeline. All functions here are pure over a parsed [`Html`]
//! document.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::error::{Error, Result};
use crate::language::extension_for;
use crate::message::SubmissionPayload;

pub const UNKNOWN_TITLE: &str = "Unknown Problem";
pub const UNKNOWN_LANGUAGE: &str = "unknown";
pub const CODE_PLACEHOLDER: &str = "// NeetHub: Could not automatically extract code.";

static NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("static regex is valid"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex is valid"));

static SUCCESS_INDICATOR: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&["span.text-green-500", r#"div[class*="success"]"#]));
static CODE_EDITOR: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&[".monaco-editor", r#"div[class*="language-"]"#]));
pub(crate) static TRIGGER_CONTAINER: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    selectors(&[
        ".flex.items-center.justify-between.gap-4",
        r#"div[class*="result-"] > div > div"#,
    ])
});
static TITLE: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&[r#"h3 a[href*="/problems/"]"#, "h4.break-words"]));
static LANGUAGE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    selectors(&[
        r#"button[id^="headlessui-listbox-button"] > span"#,
        ".relative > button > span",
    ])
});
static EDITOR_LINES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".view-lines .view-line").expect("static selector is valid")
});
static SOLUTION_TEXTAREA: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&[r#"textarea[aria-label*="solution"]"#]));
static CODE_BLOCK: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&[r#"code[class*="language-"]"#]));

fn selectors(patterns: &[&str]) -> Vec<Selector> {
    patterns
        .iter()
        .map(|pattern| Selector::parse(pattern).expect("static selector is valid"))
        .collect()
}

pub(crate) fn first_match<'a>(doc: &'a Html, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .find_map(|selector| doc.select(selector).next())
}

// Monaco renders indentation as non-breaking spaces.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().replace('\u{a0}', " ")
}

/// A page shows an accepted submission when a success marker and the code
/// editor are both present.
pub fn is_submission_accepted(doc: &Html) -> bool {
    first_match(doc, &SUCCESS_INDICATOR).is_some() && first_match(doc, &CODE_EDITOR).is_some()
}

/// Problem title with any leading `"<number>. "` removed.
pub fn extract_title(doc: &Html) -> String {
    first_match(doc, &TITLE)
        .map(|element| strip_number_prefix(element_text(element).trim()))
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

pub fn strip_number_prefix(title: &str) -> String {
    NUMBER_PREFIX.replace(title, "").into_owned()
}

/// Last path segment of `url`, or the hyphenated lower-cased title when the
/// path ends in `/`.
pub fn extract_slug(url: &Url, title: &str) -> String {
    match url.path().rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => slug_from_title(title),
    }
}

pub fn slug_from_title(title: &str) -> String {
    WHITESPACE
        .replace_all(&title.to_lowercase(), "-")
        .into_owned()
}

/// Lower-cased label of the language dropdown.
pub fn extract_language(doc: &Html) -> String {
    first_match(doc, &LANGUAGE)
        .map(|element| element_text(element).trim().to_lowercase())
        .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string())
}

/// One way of pulling source code out of the page.
pub struct CodeStrategy {
    pub name: &'static str,
    pub extract: fn(&Html) -> Option<String>,
}

/// Tried in order; the first strategy returning code wins.
pub const CODE_STRATEGIES: &[CodeStrategy] = &[
    CodeStrategy {
        name: "monaco-lines",
        extract: editor_lines,
    },
    CodeStrategy {
        name: "solution-textarea",
        extract: solution_textarea,
    },
    CodeStrategy {
        name: "code-block",
        extract: code_block,
    },
    CodeStrategy {
        name: "editor-container",
        extract: editor_container,
    },
];

fn non_empty(code: String) -> Option<String> {
    if code.trim().is_empty() {
        None
    } else {
        Some(code)
    }
}

fn editor_lines(doc: &Html) -> Option<String> {
    let lines = doc
        .select(&EDITOR_LINES)
        .map(element_text)
        .collect::<Vec<_>>();
    if lines.is_empty() {
        return None;
    }
    non_empty(lines.join("\n"))
}

fn solution_textarea(doc: &Html) -> Option<String> {
    first_match(doc, &SOLUTION_TEXTAREA)
        .map(element_text)
        .and_then(non_empty)
}

fn code_block(doc: &Html) -> Option<String> {
    first_match(doc, &CODE_BLOCK)
        .map(element_text)
        .and_then(non_empty)
}

fn editor_container(doc: &Html) -> Option<String> {
    first_match(doc, &CODE_EDITOR)
        .map(element_text)
        .and_then(non_empty)
}

/// Source code via [`CODE_STRATEGIES`], or [`CODE_PLACEHOLDER`] when none
/// of them finds anything.
pub fn extract_code(doc: &Html) -> String {
    for strategy in CODE_STRATEGIES {
        if let Some(code) = (strategy.extract)(doc) {
            tracing::debug!(strategy = strategy.name, "extracted code");
            return code;
        }
    }
    tracing::warn!("no code-bearing element found, using placeholder");
    CODE_PLACEHOLDER.to_string()
}

/// Scrape everything a push needs from `doc`, which was rendered at
/// `page_url`.
pub fn build_payload(doc: &Html, page_url: &str) -> Result<SubmissionPayload> {
    let url = Url::parse(page_url)
        .map_err(|e| Error::Extraction(format!("invalid page url '{page_url}': {e}")))?;

    let problem_title = extract_title(doc);
    let problem_slug = extract_slug(&url, &problem_title);
    if problem_slug.is_empty() {
        return Err(Error::Extraction(
            "could not derive a problem slug from the url or the title".into(),
        ));
    }
    let language = extract_language(doc);
    let file_extension = extension_for(&language).to_string();
    let code = extract_code(doc);

    Ok(SubmissionPayload {
        problem_title,
        problem_slug,
        language,
        file_extension,
        code,
        source_url: url.to_string(),
    })
}
