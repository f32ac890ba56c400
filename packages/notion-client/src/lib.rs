//! Pure Notion REST API client.
//!
//! A minimal client for the Notion API. Supports listing workspace users,
//! retrieving pages, listing child blocks, and querying databases, with
//! cursor-based pagination handled internally.
//!
//! # Example
//!
//! ```rust,ignore
//! use notion_client::NotionClient;
//!
//! let client = NotionClient::new("secret-token".into());
//!
//! for user in client.list_users().await? {
//!     println!("{}", user.name.as_deref().unwrap_or("(unnamed)"));
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{NotionError, Result};
pub use types::{Block, ListResponse, NotionUser, PageObject, UserRef};

use serde::de::DeserializeOwned;
use serde_json::json;

const BASE_URL: &str = "https://api.notion.com/v1";

/// Version header the API requires on every request.
const NOTION_VERSION: &str = "2022-06-28";

pub struct NotionClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl NotionClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Set a custom base URL (for proxies and tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// List all workspace users.
    pub async fn list_users(&self) -> Result<Vec<NotionUser>> {
        let base = format!("{}/users?page_size=100", self.base_url);
        let users = self
            .collect_paginated(|cursor| {
                let url = match cursor {
                    Some(c) => format!("{base}&start_cursor={c}"),
                    None => base.clone(),
                };
                self.request(self.client.get(url))
            })
            .await?;
        tracing::debug!(count = users.len(), "Listed users");
        Ok(users)
    }

    /// Retrieve a single page object.
    pub async fn get_page(&self, id: &str) -> Result<PageObject> {
        let url = format!("{}/pages/{}", self.base_url, id);
        let resp = self.request(self.client.get(&url)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(NotionError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json().await?)
    }

    /// List the direct children of a page or block. Elements that fail to
    /// decode are logged and dropped rather than failing the whole listing.
    pub async fn list_child_blocks(&self, id: &str) -> Result<Vec<Block>> {
        let base = format!("{}/blocks/{}/children?page_size=100", self.base_url, id);
        self.collect_paginated(|cursor| {
            let url = match cursor {
                Some(c) => format!("{base}&start_cursor={c}"),
                None => base.clone(),
            };
            self.request(self.client.get(url))
        })
        .await
    }

    /// Query every row of a database. Rows may be partial; callers decide
    /// completeness via [`PageObject::is_full`].
    pub async fn query_database(&self, id: &str) -> Result<Vec<PageObject>> {
        let url = format!("{}/databases/{}/query", self.base_url, id);
        self.collect_paginated(|cursor| {
            let body = match cursor {
                Some(c) => json!({ "page_size": 100, "start_cursor": c }),
                None => json!({ "page_size": 100 }),
            };
            self.request(self.client.post(&url)).json(&body)
        })
        .await
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    /// Drain a cursor-paginated endpoint, decoding each result element
    /// individually so one malformed entry never poisons the batch.
    async fn collect_paginated<T, F>(&self, mut request: F) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        F: FnMut(Option<&str>) -> reqwest::RequestBuilder,
    {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let resp = request(cursor.as_deref()).send().await?;
            let status = resp.status();
            if !status.is_success() {
                let message = resp.text().await.unwrap_or_default();
                return Err(NotionError::Api {
                    status: status.as_u16(),
                    message,
                });
            }
            let page: ListResponse = resp.json().await?;
            for value in page.results {
                match serde_json::from_value::<T>(value) {
                    Ok(item) => items.push(item),
                    Err(e) => tracing::warn!(error = %e, "Skipping undecodable result element"),
                }
            }
            // has_more without a cursor would spin forever.
            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }
        Ok(items)
    }
}
