use std::sync::LazyLock;

use regex::Regex;

/// Shapes of ref names accepted as versions, in match order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagGrammar {
    /// `1.2.3`, `v1.2.3`
    MajorMinorPatch,
    /// `1.2`, `v1.2`
    MajorMinor,
    /// `lib-1_2_3`, `curl-8_5_0`
    WordUnderscored,
    /// `release-1.2.3`
    WordMajorMinorPatch,
    /// `release-1.2`
    WordMajorMinor,
    /// `master`, `latest`, `stable`, `main`
    Branch,
}

impl TagGrammar {
    pub const ALL: [TagGrammar; 6] = [
        Self::MajorMinorPatch,
        Self::MajorMinor,
        Self::WordUnderscored,
        Self::WordMajorMinorPatch,
        Self::WordMajorMinor,
        Self::Branch,
    ];

    fn pattern(&self) -> &'static str {
        match self {
            Self::MajorMinorPatch => r"^v?[0-9]+\.[0-9]+\.[0-9]+$",
            Self::MajorMinor => r"^v?[0-9]+\.[0-9]+$",
            Self::WordUnderscored => r"^[A-Za-z]+[-_]?[0-9]+_[0-9]+_[0-9]+$",
            Self::WordMajorMinorPatch => r"^[A-Za-z]+[-_]?[0-9]+\.[0-9]+\.[0-9]+$",
            Self::WordMajorMinor => r"^[A-Za-z]+[-_]?[0-9]+\.[0-9]+$",
            Self::Branch => r"^(master|latest|stable|main)$",
        }
    }
}

static GRAMMARS: LazyLock<Vec<(TagGrammar, Regex)>> = LazyLock::new(|| {
    TagGrammar::ALL
        .iter()
        .map(|grammar| {
            let regex = Regex::new(grammar.pattern()).expect("tag grammar pattern is valid");
            (*grammar, regex)
        })
        .collect()
});

/// First grammar that matches `tag` exactly.
pub fn classify(tag: &str) -> Option<TagGrammar> {
    GRAMMARS
        .iter()
        .find(|(_, regex)| regex.is_match(tag))
        .map(|(grammar, _)| *grammar)
}

pub fn is_version_tag(tag: &str) -> bool {
    classify(tag).is_some()
}
