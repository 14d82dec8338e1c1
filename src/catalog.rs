//! Static language catalog shared by the source and target selectors.
//!
//! Codes are passed to the backend verbatim, so they must stay exactly as
//! listed here.

/// One selectable language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

pub const LANGUAGES: &[Language] = &[
    Language {
        code: "en",
        name: "English",
    },
    Language {
        code: "zh-TW",
        name: "Traditional Chinese",
    },
    Language {
        code: "zh-CN",
        name: "Simplified Chinese",
    },
    Language {
        code: "ja",
        name: "Japanese",
    },
    Language {
        code: "ko",
        name: "Korean",
    },
    Language {
        code: "de",
        name: "German",
    },
    Language {
        code: "fr",
        name: "French",
    },
    Language {
        code: "es",
        name: "Spanish",
    },
];

pub const DEFAULT_SOURCE_LANG: &str = "en";
pub const DEFAULT_TARGET_LANG: &str = "zh-TW";

pub fn find(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code == code)
}

/// Display name for a code; unknown codes are shown as-is.
pub fn display_name(code: &str) -> &str {
    find(code).map(|l| l.name).unwrap_or(code)
}
