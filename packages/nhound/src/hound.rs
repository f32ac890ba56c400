//! The hound: walks workspace page trees and builds the cohort.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use notion_client::types::{Block, NotionUser, PageObject, RichText};
use notion_client::{NotionClient, NotionError};
use regex::Regex;
use thiserror::Error;

use crate::cohort::{Cohort, CohortError};
use crate::dehumanize::dehumanize;
use crate::user::{Page, User, UNSET_TITLE};

lazy_static! {
    /// Threshold override marker carried in callout text.
    static ref ANNOTATION: Regex = Regex::new(r"nhound\{([^}]*)\}").expect("pattern is valid");
}

/// Failures that abort the whole run. Everything below a root is logged
/// and skipped instead.
#[derive(Debug, Error)]
pub enum HoundError {
    #[error("failed to list users from the workspace")]
    ListUsers(#[source] NotionError),
    #[error(transparent)]
    Cohort(#[from] CohortError),
}

/// The capability set consumed from the workspace API. A trait so tests
/// can script the workspace.
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    async fn list_users(&self) -> notion_client::Result<Vec<NotionUser>>;
    async fn get_page(&self, id: &str) -> notion_client::Result<PageObject>;
    async fn list_child_blocks(&self, id: &str) -> notion_client::Result<Vec<Block>>;
    async fn query_database(&self, id: &str) -> notion_client::Result<Vec<PageObject>>;
}

#[async_trait]
impl WorkspaceApi for NotionClient {
    async fn list_users(&self) -> notion_client::Result<Vec<NotionUser>> {
        NotionClient::list_users(self).await
    }

    async fn get_page(&self, id: &str) -> notion_client::Result<PageObject> {
        NotionClient::get_page(self, id).await
    }

    async fn list_child_blocks(&self, id: &str) -> notion_client::Result<Vec<Block>> {
        NotionClient::list_child_blocks(self, id).await
    }

    async fn query_database(&self, id: &str) -> notion_client::Result<Vec<PageObject>> {
        NotionClient::query_database(self, id).await
    }
}

/// Build a cohort by listing the workspace users, then walking the page
/// tree under every root id.
pub async fn build_cohort(
    api: &impl WorkspaceApi,
    roots: &[String],
    now: DateTime<Utc>,
    weeks: Option<u32>,
) -> Result<Cohort, HoundError> {
    let mut cohort = Cohort::new(now, weeks);
    load_users(api, &mut cohort).await?;

    let mut visited: HashSet<String> = HashSet::new();
    for root in roots {
        walk_tree(api, &mut cohort, root, &mut visited, now).await;
    }
    Ok(cohort)
}

async fn load_users(api: &impl WorkspaceApi, cohort: &mut Cohort) -> Result<(), HoundError> {
    let users = api.list_users().await.map_err(HoundError::ListUsers)?;
    for user in users {
        if !user.is_person() {
            continue;
        }
        let Some(email) = user.email() else {
            tracing::warn!(id = %user.id, "Skipping person user without an email");
            continue;
        };
        let name = user.name.clone().unwrap_or_default();
        cohort.add_user(User::new(user.id.clone(), name, email))?;
    }
    tracing::info!(count = cohort.size(), "Got users from Notion");
    Ok(())
}

/// Breadth-first walk over one root's page tree. The visited set is shared
/// across roots so a cycle or diamond in the hierarchy is a skip, not a
/// loop.
async fn walk_tree(
    api: &impl WorkspaceApi,
    cohort: &mut Cohort,
    root: &str,
    visited: &mut HashSet<String>,
    now: DateTime<Utc>,
) {
    let mut queue: VecDeque<String> = VecDeque::from([root.to_string()]);

    while let Some(id) = queue.pop_front() {
        if !visited.insert(id.clone()) {
            tracing::debug!(id = %id, "Already visited, skipping");
            continue;
        }

        let page = match api.get_page(&id).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Failed to get page from Notion, skipping");
                continue;
            }
        };
        let blocks = match api.list_child_blocks(&id).await {
            Ok(blocks) => blocks,
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Failed to list child blocks, skipping");
                continue;
            }
        };

        record_page(cohort, &id, &page, &blocks, now);

        for block in blocks {
            match block {
                Block::ChildPage { id: child_id } => queue.push_back(child_id),
                Block::ChildDatabase { id: db_id, child_database } => {
                    if child_database.title.to_lowercase().contains("meeting") {
                        tracing::debug!(id = %db_id, title = %child_database.title, "Skipping meeting database");
                        continue;
                    }
                    if !visited.insert(db_id.clone()) {
                        tracing::debug!(id = %db_id, "Already visited, skipping");
                        continue;
                    }
                    walk_database(api, cohort, &db_id).await;
                }
                _ => {}
            }
        }
    }
}

/// Record one page into the cohort: derive its title and threshold, then
/// attribute it per the callout scan.
fn record_page(
    cohort: &mut Cohort,
    id: &str,
    page: &PageObject,
    blocks: &[Block],
    now: DateTime<Utc>,
) {
    let (Some(created), Some(edited)) = (page.created_time, page.last_edited_time) else {
        tracing::warn!(id = %id, "Page object is missing timestamps, skipping");
        return;
    };

    let scan = scan_callouts(blocks, cohort, now);
    let threshold = scan.threshold.unwrap_or_else(|| cohort.default_threshold());

    let record = Page {
        id: id.to_string(),
        title: title_from_url(page.url.as_deref()),
        url: page.url.clone().unwrap_or_default(),
        created_time: created,
        last_edited_time: edited,
        threshold_time: threshold,
    };
    tracing::info!(id = %id, title = %record.title, "Found a page");

    // Explicit mentions own the page; the author fallback only applies
    // when no mention resolved.
    if scan.mentions.is_empty() {
        attribute_to_authors(cohort, page, record);
    } else {
        for user_id in &scan.mentions {
            cohort.attribute_to(user_id, record.clone());
        }
    }
}

fn attribute_to_authors(cohort: &mut Cohort, page: &PageObject, record: Page) {
    if let Some(creator) = &page.created_by {
        cohort.attribute_to(&creator.id, record.clone());
    }
    if let Some(editor) = &page.last_edited_by {
        cohort.attribute_to(&editor.id, record);
    }
}

struct CalloutScan {
    /// User ids mentioned in callouts that resolve in the cohort.
    mentions: Vec<String>,
    /// Threshold from the last annotation seen, if any.
    threshold: Option<DateTime<Utc>>,
}

/// Scan callout blocks for user mentions and `nhound{...}` annotations.
/// When several annotations are present, the last one wins.
fn scan_callouts(blocks: &[Block], cohort: &Cohort, now: DateTime<Utc>) -> CalloutScan {
    let mut scan = CalloutScan {
        mentions: Vec::new(),
        threshold: None,
    };
    for block in blocks {
        let Block::Callout { callout, .. } = block else {
            continue;
        };
        for fragment in &callout.rich_text {
            match fragment {
                RichText::Mention { mention, .. } => {
                    let Some(user) = &mention.user else { continue };
                    if cohort.get_by_id(&user.id).is_some() && !scan.mentions.contains(&user.id) {
                        scan.mentions.push(user.id.clone());
                    }
                }
                RichText::Text { plain_text } => {
                    for capture in ANNOTATION.captures_iter(plain_text) {
                        scan.threshold = Some(dehumanize(&capture[1], now));
                    }
                }
                RichText::Other => {}
            }
        }
    }
    scan
}

/// Derive a title from the slug of a page URL: the text after the last
/// `/`, with the trailing `-<slug-id>` stripped.
fn title_from_url(url: Option<&str>) -> String {
    let Some(url) = url else {
        return UNSET_TITLE.to_string();
    };
    let slug = url.rsplit('/').next().unwrap_or(url);
    match slug.rsplit_once('-') {
        Some((title, _)) => title.to_string(),
        None => slug.to_string(),
    }
}

/// Attribute every full row of a database to its authors, under the
/// cohort's default threshold. Rows never get callout overrides.
async fn walk_database(api: &impl WorkspaceApi, cohort: &mut Cohort, db_id: &str) {
    let rows = match api.query_database(db_id).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(id = %db_id, error = %e, "Failed to query database, skipping");
            return;
        }
    };
    for row in rows {
        if !row.is_full() {
            tracing::debug!(id = %db_id, "Skipping partial database row");
            continue;
        }
        let (Some(created), Some(edited)) = (row.created_time, row.last_edited_time) else {
            continue;
        };
        let record = Page {
            id: db_id.to_string(),
            title: title_from_url(row.url.as_deref()),
            url: row.url.clone().unwrap_or_default(),
            created_time: created,
            last_edited_time: edited,
            threshold_time: cohort.default_threshold(),
        };
        tracing::info!(id = %db_id, title = %record.title, "Found a database entry");
        attribute_to_authors(cohort, &row, record);
    }
}
