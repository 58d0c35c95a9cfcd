use serde::{Deserialize, Serialize};
use std::fmt;

/// A hierarchy level in a provision tree.
///
/// The root of every tree is conceptually level 4 (`Section`); its numbered
/// descendants run 5 through 9. There is no level past `Subclause` — the
/// classifier clamps there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionLevel {
    Section,
    Subsection,
    Paragraph,
    Subparagraph,
    Clause,
    Subclause,
}

impl ProvisionLevel {
    /// Numeric level as used throughout the design notes (4..=9).
    pub fn as_u8(self) -> u8 {
        match self {
            ProvisionLevel::Section => 4,
            ProvisionLevel::Subsection => 5,
            ProvisionLevel::Paragraph => 6,
            ProvisionLevel::Subparagraph => 7,
            ProvisionLevel::Clause => 8,
            ProvisionLevel::Subclause => 9,
        }
    }

    /// Build a level from its numeric form, clamping anything past 9 to
    /// `Subclause` (the terminal level — see invariant 14).
    pub fn from_u8(n: u8) -> Option<ProvisionLevel> {
        match n {
            4 => Some(ProvisionLevel::Section),
            5 => Some(ProvisionLevel::Subsection),
            6 => Some(ProvisionLevel::Paragraph),
            7 => Some(ProvisionLevel::Subparagraph),
            8 => Some(ProvisionLevel::Clause),
            9..=u8::MAX => Some(ProvisionLevel::Subclause),
            _ => None,
        }
    }

    /// The level one step deeper, clamped at `Subclause`.
    pub fn deeper(self) -> ProvisionLevel {
        ProvisionLevel::from_u8(self.as_u8() + 1).unwrap_or(ProvisionLevel::Subclause)
    }

    /// The name of the child bucket this level's node would be appended to
    /// on its parent (`subsections`, `paragraphs`, ...).
    pub fn bucket_name(self) -> &'static str {
        match self {
            ProvisionLevel::Section => "sections",
            ProvisionLevel::Subsection => "subsections",
            ProvisionLevel::Paragraph => "paragraphs",
            ProvisionLevel::Subparagraph => "subparagraphs",
            ProvisionLevel::Clause => "clauses",
            ProvisionLevel::Subclause => "subclauses",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProvisionLevel::Section => "section",
            ProvisionLevel::Subsection => "subsection",
            ProvisionLevel::Paragraph => "paragraph",
            ProvisionLevel::Subparagraph => "subparagraph",
            ProvisionLevel::Clause => "clause",
            ProvisionLevel::Subclause => "subclause",
        }
    }
}

impl fmt::Display for ProvisionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for ProvisionLevel {
    /// Falls back to `Subsection` for anything unrecognized, mirroring the
    /// indentation-hint default used when a CSS class is unmapped.
    fn from(s: &str) -> Self {
        match s {
            "section" => ProvisionLevel::Section,
            "paragraph" => ProvisionLevel::Paragraph,
            "subparagraph" => ProvisionLevel::Subparagraph,
            "clause" => ProvisionLevel::Clause,
            "subclause" => ProvisionLevel::Subclause,
            _ => ProvisionLevel::Subsection,
        }
    }
}

/// Which of the two heterogeneous source serializations a year's snapshot
/// was encoded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// The native-markup (USLM-style XML) format, "Format A".
    NativeMarkup,
    /// The legacy presentational (CSS-class XHTML) format, "Format B".
    Presentational,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceFormat::NativeMarkup => "native_markup",
            SourceFormat::Presentational => "presentational",
        };
        write!(f, "{s}")
    }
}

/// Classification of an outgoing cross-reference's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefType {
    Internal,
    CrossTitle,
    External,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_round_trips_through_u8() {
        for n in 4u8..=9 {
            let level = ProvisionLevel::from_u8(n).unwrap();
            assert_eq!(level.as_u8(), n);
        }
    }

    #[test]
    fn level_past_nine_clamps_to_subclause() {
        assert_eq!(ProvisionLevel::from_u8(20), Some(ProvisionLevel::Subclause));
    }

    #[test]
    fn deeper_clamps_at_subclause() {
        assert_eq!(ProvisionLevel::Subclause.deeper(), ProvisionLevel::Subclause);
        assert_eq!(ProvisionLevel::Clause.deeper(), ProvisionLevel::Subclause);
    }

    #[test]
    fn level_serializes_to_snake_case() {
        let json = serde_json::to_string(&ProvisionLevel::Subparagraph).unwrap();
        assert_eq!(json, "\"subparagraph\"");
    }

    #[test]
    fn bucket_names_match_design_doc() {
        assert_eq!(ProvisionLevel::Subsection.bucket_name(), "subsections");
        assert_eq!(ProvisionLevel::Subclause.bucket_name(), "subclauses");
    }
}
