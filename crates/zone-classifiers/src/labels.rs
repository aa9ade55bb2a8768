//! Zone label taxonomies.
//!
//! `Label` is the fine-grained role of a zone; `GeneralLabel` is the coarse
//! role it collapses to. The collapse is a lookup table indexed by the
//! label ordinal. Both types implement `ClassLabel`, which is all the
//! training pipeline needs to know about a taxonomy.
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A closed set of class labels with a canonical ordering.
///
/// The ordinal is the class index handed to the solver and stored in
/// persisted models, so it must stay stable for a given taxonomy.
pub trait ClassLabel:
    Copy + Ord + Eq + Hash + fmt::Debug + Send + Sync + 'static
{
    /// Name of the taxonomy, recorded in models to reject loading with the wrong type.
    const TAXONOMY: &'static str;

    fn ordinal(&self) -> usize;

    fn from_ordinal(ordinal: usize) -> Option<Self>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeneralLabel {
    Metadata,
    Body,
    References,
    Other,
}

impl GeneralLabel {
    pub const ALL: [GeneralLabel; 4] = [
        GeneralLabel::Metadata,
        GeneralLabel::Body,
        GeneralLabel::References,
        GeneralLabel::Other,
    ];
}

impl ClassLabel for GeneralLabel {
    const TAXONOMY: &'static str = "general";

    fn ordinal(&self) -> usize {
        *self as usize
    }

    fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal).copied()
    }

    fn name(&self) -> &'static str {
        match self {
            GeneralLabel::Metadata => "METADATA",
            GeneralLabel::Body => "BODY",
            GeneralLabel::References => "REFERENCES",
            GeneralLabel::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    Title,
    Author,
    Affiliation,
    Abstract,
    Keywords,
    BibInfo,
    Correspondence,
    Dates,
    Editor,
    Copyright,
    Type,
    Body,
    BodyHeading,
    BodyTable,
    BodyFigure,
    BodyEquation,
    BodyAcknowledgment,
    Reference,
    Header,
    Footer,
    PageNumber,
    Unknown,
}

impl Label {
    pub const COUNT: usize = 22;

    pub const ALL: [Label; Label::COUNT] = [
        Label::Title,
        Label::Author,
        Label::Affiliation,
        Label::Abstract,
        Label::Keywords,
        Label::BibInfo,
        Label::Correspondence,
        Label::Dates,
        Label::Editor,
        Label::Copyright,
        Label::Type,
        Label::Body,
        Label::BodyHeading,
        Label::BodyTable,
        Label::BodyFigure,
        Label::BodyEquation,
        Label::BodyAcknowledgment,
        Label::Reference,
        Label::Header,
        Label::Footer,
        Label::PageNumber,
        Label::Unknown,
    ];

    const NAMES: [&'static str; Label::COUNT] = [
        "TITLE",
        "AUTHOR",
        "AFFILIATION",
        "ABSTRACT",
        "KEYWORDS",
        "BIB_INFO",
        "CORRESPONDENCE",
        "DATES",
        "EDITOR",
        "COPYRIGHT",
        "TYPE",
        "BODY",
        "BODY_HEADING",
        "BODY_TABLE",
        "BODY_FIGURE",
        "BODY_EQUATION",
        "BODY_ACKNOWLEDGMENT",
        "REFERENCE",
        "HEADER",
        "FOOTER",
        "PAGE_NUMBER",
        "UNKNOWN",
    ];

    /// Coarse label of every fine label, indexed by ordinal.
    const GENERAL: [GeneralLabel; Label::COUNT] = [
        GeneralLabel::Metadata, // TITLE
        GeneralLabel::Metadata, // AUTHOR
        GeneralLabel::Metadata, // AFFILIATION
        GeneralLabel::Metadata, // ABSTRACT
        GeneralLabel::Metadata, // KEYWORDS
        GeneralLabel::Metadata, // BIB_INFO
        GeneralLabel::Metadata, // CORRESPONDENCE
        GeneralLabel::Metadata, // DATES
        GeneralLabel::Metadata, // EDITOR
        GeneralLabel::Metadata, // COPYRIGHT
        GeneralLabel::Metadata, // TYPE
        GeneralLabel::Body,     // BODY
        GeneralLabel::Body,     // BODY_HEADING
        GeneralLabel::Body,     // BODY_TABLE
        GeneralLabel::Body,     // BODY_FIGURE
        GeneralLabel::Body,     // BODY_EQUATION
        GeneralLabel::Body,     // BODY_ACKNOWLEDGMENT
        GeneralLabel::References,
        GeneralLabel::Other, // HEADER
        GeneralLabel::Other, // FOOTER
        GeneralLabel::Other, // PAGE_NUMBER
        GeneralLabel::Other, // UNKNOWN
    ];

    pub fn general(self) -> GeneralLabel {
        Self::GENERAL[self as usize]
    }
}

impl ClassLabel for Label {
    const TAXONOMY: &'static str = "zone";

    fn ordinal(&self) -> usize {
        *self as usize
    }

    fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal).copied()
    }

    fn name(&self) -> &'static str {
        Self::NAMES[*self as usize]
    }
}

impl From<Label> for GeneralLabel {
    fn from(label: Label) -> Self {
        label.general()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for GeneralLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Label::ALL
            .iter()
            .copied()
            .find(|label| label.name() == upper)
            .ok_or_else(|| format!("Unknown zone label: {}", s))
    }
}

impl FromStr for GeneralLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        GeneralLabel::ALL
            .iter()
            .copied()
            .find(|label| label.name() == upper)
            .ok_or_else(|| format!("Unknown general label: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_round_trip() {
        for label in Label::ALL {
            assert_eq!(Label::from_ordinal(label.ordinal()), Some(label));
        }
        for label in GeneralLabel::ALL {
            assert_eq!(GeneralLabel::from_ordinal(label.ordinal()), Some(label));
        }
        assert_eq!(Label::from_ordinal(Label::COUNT), None);
    }

    #[test]
    fn general_mapping_is_total() {
        assert_eq!(Label::Title.general(), GeneralLabel::Metadata);
        assert_eq!(Label::Abstract.general(), GeneralLabel::Metadata);
        assert_eq!(Label::BodyHeading.general(), GeneralLabel::Body);
        assert_eq!(Label::Reference.general(), GeneralLabel::References);
        assert_eq!(Label::Footer.general(), GeneralLabel::Other);
        for label in Label::ALL {
            let _ = label.general();
        }
    }

    #[test]
    fn names_match_serde_representation() {
        for label in Label::ALL {
            let json = serde_json::to_string(&label).unwrap();
            assert_eq!(json, format!("\"{}\"", label.name()));
            assert_eq!(label.name().parse::<Label>().unwrap(), label);
        }
    }

    #[test]
    fn declaration_order_is_ordinal_order() {
        assert!(Label::Title < Label::Body);
        assert!(Label::Body < Label::Reference);
        assert!(GeneralLabel::Metadata < GeneralLabel::Other);
    }
}
