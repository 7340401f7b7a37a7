// src/models/localized.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Display language selected by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

/// Text that is either a plain string or an English/Arabic pair.
///
/// Exam files produced by hand use plain strings, CSV uploads always
/// produce the bilingual form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    Bilingual { en: String, ar: String },
}

impl LocalizedText {
    /// Builds a bilingual value; a missing Arabic text is marked with a prefix.
    pub fn bilingual(en: impl Into<String>, ar: Option<&str>) -> Self {
        let en = en.into();
        let ar = match ar {
            Some(ar) if !ar.trim().is_empty() => ar.to_string(),
            _ => format!("[AR] {}", en),
        };
        LocalizedText::Bilingual { en, ar }
    }

    pub fn resolve(&self, locale: Locale) -> &str {
        match (self, locale) {
            (LocalizedText::Plain(text), _) => text,
            (LocalizedText::Bilingual { en, .. }, Locale::En) => en,
            (LocalizedText::Bilingual { ar, .. }, Locale::Ar) => ar,
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            LocalizedText::Plain(text) => text.trim().is_empty(),
            LocalizedText::Bilingual { en, .. } => en.trim().is_empty(),
        }
    }

    /// Applies `f` to every language variant.
    pub fn map(&self, f: impl Fn(&str) -> String) -> Self {
        match self {
            LocalizedText::Plain(text) => LocalizedText::Plain(f(text)),
            LocalizedText::Bilingual { en, ar } => LocalizedText::Bilingual {
                en: f(en),
                ar: f(ar),
            },
        }
    }
}

impl From<&str> for LocalizedText {
    fn from(value: &str) -> Self {
        LocalizedText::Plain(value.to_string())
    }
}

impl From<String> for LocalizedText {
    fn from(value: String) -> Self {
        LocalizedText::Plain(value)
    }
}

impl fmt::Display for LocalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resolve(Locale::En))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_ignores_locale() {
        let text = LocalizedText::from("People");
        assert_eq!(text.resolve(Locale::En), "People");
        assert_eq!(text.resolve(Locale::Ar), "People");
    }

    #[test]
    fn bilingual_defaults_arabic_marker() {
        let text = LocalizedText::bilingual("Process", None);
        assert_eq!(text.resolve(Locale::Ar), "[AR] Process");
        assert_eq!(text.resolve(Locale::En), "Process");
    }

    #[test]
    fn deserializes_both_shapes() {
        let plain: LocalizedText = serde_json::from_str(r#""Hello""#).unwrap();
        assert_eq!(plain, LocalizedText::Plain("Hello".into()));

        let pair: LocalizedText = serde_json::from_str(r#"{"en":"Hi","ar":"مرحبا"}"#).unwrap();
        assert_eq!(pair.resolve(Locale::Ar), "مرحبا");
    }
}
