//! A cohort of workspace users.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use colored::Colorize;
use indexmap::IndexMap;
use thiserror::Error;

use crate::user::{Page, User};

/// Default staleness window in weeks. Roughly three months.
const DEFAULT_STALE_WEEKS: u32 = 13;

#[derive(Debug, Error)]
pub enum CohortError {
    #[error("user with id {0} already exists")]
    DuplicateUser(String),
}

/// Registry of users keyed by id, in insertion order, plus the run's
/// staleness defaults.
#[derive(Debug)]
pub struct Cohort {
    users: IndexMap<String, User>,
    /// Run timestamp truncated to day granularity so staleness comparisons
    /// are stable within a calendar day.
    today: DateTime<Utc>,
    default_threshold: DateTime<Utc>,
}

impl Cohort {
    /// `weeks` of `None` (unset or unparseable configuration) falls back
    /// to the default window.
    pub fn new(now: DateTime<Utc>, weeks: Option<u32>) -> Self {
        let today = now.with_time(NaiveTime::MIN).single().unwrap_or(now);
        let weeks = weeks.unwrap_or(DEFAULT_STALE_WEEKS);
        Self {
            users: IndexMap::new(),
            today,
            default_threshold: today - Duration::weeks(i64::from(weeks)),
        }
    }

    pub fn size(&self) -> usize {
        self.users.len()
    }

    pub fn today(&self) -> DateTime<Utc> {
        self.today
    }

    pub fn default_threshold(&self) -> DateTime<Utc> {
        self.default_threshold
    }

    pub fn add_user(&mut self, user: User) -> Result<(), CohortError> {
        if self.users.contains_key(user.id()) {
            tracing::warn!(id = user.id(), "User already exists");
            return Err(CohortError::DuplicateUser(user.id().to_string()));
        }
        self.users.insert(user.id().to_string(), user);
        Ok(())
    }

    /// Id is the only unique key.
    pub fn get_by_id(&self, id: &str) -> Option<&User> {
        let user = self.users.get(id);
        if user.is_none() {
            tracing::warn!(id, "User not found");
        }
        user
    }

    /// Names are not unique; returns every match.
    pub fn get_by_name(&self, name: &str) -> Vec<&User> {
        self.users.values().filter(|u| u.name() == name).collect()
    }

    /// Emails are not unique; returns every match.
    pub fn get_by_email(&self, email: &str) -> Vec<&User> {
        self.users.values().filter(|u| u.email() == email).collect()
    }

    /// Add `page` to a user's set. Returns false when the id is unknown,
    /// which callers treat as a skipped attribution.
    pub fn attribute_to(&mut self, id: &str, page: Page) -> bool {
        match self.users.get_mut(id) {
            Some(user) => {
                user.pages.insert(page);
                true
            }
            None => {
                tracing::debug!(id, "Attribution skipped, user not in cohort");
                false
            }
        }
    }

    /// Every user holding at least one stale page, paired with exactly
    /// those stale pages, in user insertion order.
    pub fn stale_pages_by_user(&self) -> Vec<(&User, Vec<&Page>)> {
        self.users
            .values()
            .filter_map(|user| {
                let pages: Vec<&Page> = user.pages.iter().filter(|p| p.is_stale()).collect();
                if pages.is_empty() {
                    None
                } else {
                    Some((user, pages))
                }
            })
            .collect()
    }

    /// Console dump of every attributed page's freshness.
    pub fn print_report(&self) {
        for (id, user) in &self.users {
            if user.pages.is_empty() {
                continue;
            }
            println!("{id} {}:", user.name());
            for page in &user.pages {
                if page.is_stale() {
                    println!(
                        "  {} <{}>",
                        format!("{} is stale", page.title).yellow(),
                        page.url
                    );
                } else {
                    println!("  {}", format!("{} is fresh", page.title).green());
                }
            }
        }
    }
}
