//! Named-entity recognition interface and a lexical organization finder.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::extract::rules::patterns::{ORGANIZATION_CJK, ORGANIZATION_LATIN};

/// Category of a recognized entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Organization,
    Person,
    Location,
    Other,
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "organization" | "org" => Ok(Self::Organization),
            "person" | "per" => Ok(Self::Person),
            "location" | "loc" | "gpe" => Ok(Self::Location),
            _ => Ok(Self::Other),
        }
    }
}

/// A span of text tagged with an entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub text: String,
    pub kind: EntityKind,
}

impl NamedEntity {
    pub fn new(text: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn organization(text: impl Into<String>) -> Self {
        Self::new(text, EntityKind::Organization)
    }
}

/// Named-entity recognizer collaborator.
pub trait EntityRecognizer {
    /// Recognize entities in document order.
    fn recognize(&self, text: &str) -> Vec<NamedEntity>;
}

/// Recognizer that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecognizer;

impl EntityRecognizer for NoopRecognizer {
    fn recognize(&self, _text: &str) -> Vec<NamedEntity> {
        Vec::new()
    }
}

/// Finds organization names by their legal-form suffix
/// (`有限公司`, `企業`, `Co., Ltd.`, `Inc.` ...).
#[derive(Debug, Clone)]
pub struct LexicalOrganizationRecognizer {
    patterns: Vec<Regex>,
}

impl LexicalOrganizationRecognizer {
    pub fn new() -> Self {
        Self {
            patterns: vec![ORGANIZATION_CJK.clone(), ORGANIZATION_LATIN.clone()],
        }
    }
}

impl Default for LexicalOrganizationRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRecognizer for LexicalOrganizationRecognizer {
    fn recognize(&self, text: &str) -> Vec<NamedEntity> {
        let mut found: Vec<(usize, String)> = self
            .patterns
            .iter()
            .flat_map(|p| p.find_iter(text))
            .map(|m| (m.start(), m.as_str().trim().to_string()))
            .collect();

        found.sort_by_key(|(start, _)| *start);
        found
            .into_iter()
            .map(|(_, name)| NamedEntity::organization(name))
            .collect()
    }
}
