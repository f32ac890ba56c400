//! Notion stale-page hound.
//!
//! Walks a Notion workspace's page trees, groups pages that have not been
//! edited recently by their responsible users, and emails each user a
//! digest. Staleness defaults to a configurable window but can be
//! overridden per page with a `nhound{...}` annotation in a callout block.

pub mod cohort;
pub mod config;
pub mod dehumanize;
pub mod email;
pub mod hound;
pub mod user;
pub mod utils;
