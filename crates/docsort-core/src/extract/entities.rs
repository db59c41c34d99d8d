//! Merging labeled party names with NER organizations and assigning roles.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ner::{EntityKind, NamedEntity};

/// Role of a party on an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Seller,
    Buyer,
    Unassigned,
}

/// A party name with its assigned role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub role: Role,
}

/// Strategy for turning an ordered, deduplicated name list into roles.
pub trait RoleAssigner {
    fn assign(&self, names: Vec<String>) -> Vec<Entity>;
}

/// Position-based roles: first name is the seller, second the buyer, the
/// rest unassigned. A heuristic only; it does not read the labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalRoles;

impl RoleAssigner for PositionalRoles {
    fn assign(&self, names: Vec<String>) -> Vec<Entity> {
        names
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let role = match i {
                    0 => Role::Seller,
                    1 => Role::Buyer,
                    _ => Role::Unassigned,
                };
                Entity { text, role }
            })
            .collect()
    }
}

/// Combines label matches and NER organizations into role-tagged parties.
#[derive(Debug, Clone, Default)]
pub struct EntityMerger<R = PositionalRoles> {
    roles: R,
}

impl EntityMerger<PositionalRoles> {
    pub fn new() -> Self {
        Self {
            roles: PositionalRoles,
        }
    }
}

impl<R: RoleAssigner> EntityMerger<R> {
    pub fn with_roles(roles: R) -> Self {
        Self { roles }
    }

    /// Label matches first, then organization entities, deduplicated by
    /// exact text keeping the first occurrence.
    pub fn merge(&self, label_matches: &[String], ner_entities: &[NamedEntity]) -> Vec<Entity> {
        let organizations = ner_entities
            .iter()
            .filter(|e| e.kind == EntityKind::Organization)
            .map(|e| &e.text);

        let mut seen: HashSet<&str> = HashSet::new();
        let mut names = Vec::new();
        for name in label_matches.iter().chain(organizations) {
            if seen.insert(name.as_str()) {
                names.push(name.clone());
            }
        }

        self.roles.assign(names)
    }
}

/// Seller and buyer from a merged entity list.
pub fn seller_and_buyer(entities: &[Entity]) -> (Option<&str>, Option<&str>) {
    let find = |role: Role| {
        entities
            .iter()
            .find(|e| e.role == role)
            .map(|e| e.text.as_str())
    };
    (find(Role::Seller), find(Role::Buyer))
}
