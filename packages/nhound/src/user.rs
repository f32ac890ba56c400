//! User and page models.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

/// Sentinel title used when a page URL is missing.
pub const UNSET_TITLE: &str = "UNSET";

/// A page (or database row) discovered during the walk.
///
/// Equality and hashing are structural so a user's page set deduplicates
/// repeated attribution of the same page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Page {
    /// Id of the owning container (page or database). Not globally unique:
    /// every row of one database shares its database's id.
    pub id: String,
    pub title: String,
    pub url: String,
    pub created_time: DateTime<Utc>,
    pub last_edited_time: DateTime<Utc>,
    /// Staleness cutoff for this page: the cohort default, or a callout
    /// annotation override.
    pub threshold_time: DateTime<Utc>,
}

impl Page {
    pub fn is_stale(&self) -> bool {
        self.last_edited_time < self.threshold_time
    }
}

/// A workspace user and the pages attributed to them. Identity is fixed at
/// construction; only the page set grows during a walk.
#[derive(Debug, Clone)]
pub struct User {
    id: String,
    name: String,
    email: String,
    pub pages: HashSet<Page>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            pages: HashSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}
