use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// File extension a solution is committed with, derived from the editor's
/// language label.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
pub enum FileExtension {
    #[strum(serialize = "py")]
    #[serde(rename = "py")]
    Python,
    #[strum(serialize = "js")]
    #[serde(rename = "js")]
    JavaScript,
    #[strum(serialize = "ts")]
    #[serde(rename = "ts")]
    TypeScript,
    #[strum(serialize = "java")]
    #[serde(rename = "java")]
    Java,
    #[strum(serialize = "cpp")]
    #[serde(rename = "cpp")]
    Cpp,
    #[strum(serialize = "cs")]
    #[serde(rename = "cs")]
    CSharp,
    #[strum(serialize = "go")]
    #[serde(rename = "go")]
    Go,
    #[strum(serialize = "rb")]
    #[serde(rename = "rb")]
    Ruby,
    #[strum(serialize = "swift")]
    #[serde(rename = "swift")]
    Swift,
    #[strum(serialize = "kt")]
    #[serde(rename = "kt")]
    Kotlin,
    #[strum(serialize = "rs")]
    #[serde(rename = "rs")]
    Rust,
    #[strum(serialize = "php")]
    #[serde(rename = "php")]
    Php,
    #[strum(serialize = "scala")]
    #[serde(rename = "scala")]
    Scala,
    #[default]
    #[strum(serialize = "txt")]
    #[serde(rename = "txt")]
    Text,
}

// Checked in order: "javascript" has to win over "java".
const LANGUAGE_TABLE: &[(&[&str], FileExtension)] = &[
    (&["python"], FileExtension::Python),
    (&["javascript"], FileExtension::JavaScript),
    (&["typescript"], FileExtension::TypeScript),
    (&["java"], FileExtension::Java),
    (&["c++", "cpp"], FileExtension::Cpp),
    (&["c#", "csharp"], FileExtension::CSharp),
    (&["go"], FileExtension::Go),
    (&["ruby"], FileExtension::Ruby),
    (&["swift"], FileExtension::Swift),
    (&["kotlin"], FileExtension::Kotlin),
    (&["rust"], FileExtension::Rust),
    (&["php"], FileExtension::Php),
    (&["scala"], FileExtension::Scala),
];

impl FileExtension {
    /// Map a language label such as `"Python 3"` to its extension by
    /// case-insensitive substring match. Unknown labels map to `txt`.
    pub fn for_language(language: &str) -> Self {
        let language = language.to_lowercase();
        LANGUAGE_TABLE
            .iter()
            .find(|(needles, _)| needles.iter().any(|needle| language.contains(needle)))
            .map(|(_, ext)| *ext)
            .unwrap_or_default()
    }
}

pub fn extension_for(language: &str) -> FileExtension {
    FileExtension::for_language(language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_languages_should_map_by_substring() {
        assert_eq!(extension_for("Python 3").to_string(), "py");
        assert_eq!(extension_for("python3").to_string(), "py");
        assert_eq!(extension_for("JavaScript").to_string(), "js");
        assert_eq!(extension_for("typescript").to_string(), "ts");
        assert_eq!(extension_for("Java 17").to_string(), "java");
        assert_eq!(extension_for("C++").to_string(), "cpp");
        assert_eq!(extension_for("cpp17").to_string(), "cpp");
        assert_eq!(extension_for("C#").to_string(), "cs");
        assert_eq!(extension_for("csharp").to_string(), "cs");
        assert_eq!(extension_for("golang").to_string(), "go");
        assert_eq!(extension_for("ruby").to_string(), "rb");
        assert_eq!(extension_for("swift").to_string(), "swift");
        assert_eq!(extension_for("kotlin").to_string(), "kt");
        assert_eq!(extension_for("rust").to_string(), "rs");
        assert_eq!(extension_for("php").to_string(), "php");
        assert_eq!(extension_for("scala").to_string(), "scala");
    }

    #[test]
    fn javascript_should_not_be_mistaken_for_java() {
        assert_eq!(extension_for("javascript"), FileExtension::JavaScript);
    }

    #[test]
    fn unknown_language_should_fall_back_to_txt() {
        assert_eq!(extension_for("unknown"), FileExtension::Text);
        assert_eq!(extension_for("").to_string(), "txt");
        assert_eq!(extension_for("brainfuck").to_string(), "txt");
    }

    #[test]
    fn extension_should_parse_from_its_display_form() {
        let ext: FileExtension = "kt".parse().unwrap();
        assert_eq!(ext, FileExtension::Kotlin);
    }
}
