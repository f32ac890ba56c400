//! Small helpers: version telemetry and console prose.

use serde::Deserialize;

/// Latest-release endpoint for this project.
pub const GITHUB_URL: &str = "https://api.github.com/repos/worldr/nhound/releases/latest";

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Outcome of the advisory update check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCheck {
    Latest,
    Lagging,
    Unknown,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

/// Compare the running version against the latest GitHub release. Purely
/// advisory; every failure mode collapses to `Unknown`.
pub async fn check_if_latest_version() -> VersionCheck {
    check_against(GITHUB_URL).await
}

pub(crate) async fn check_against(url: &str) -> VersionCheck {
    let client = reqwest::Client::new();
    let response = match client
        .get(url)
        .header(reqwest::header::USER_AGENT, format!("nhound/{VERSION}"))
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Version check request failed");
            return VersionCheck::Unknown;
        }
    };
    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), "Version check got an error response");
        return VersionCheck::Unknown;
    }
    match response.json::<Release>().await {
        Ok(release) => compare_tag(&release.tag_name),
        Err(e) => {
            tracing::warn!(error = %e, "Version check response did not parse");
            VersionCheck::Unknown
        }
    }
}

fn compare_tag(tag: &str) -> VersionCheck {
    if tag.trim_start_matches('v') == VERSION {
        VersionCheck::Latest
    } else {
        VersionCheck::Lagging
    }
}

/// Join items with commas and a final "and", as prose would.
pub fn join_with_oxford_commas<I, T>(items: I) -> String
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let mut items: Vec<String> = items.into_iter().map(|i| i.to_string()).collect();
    match items.len() {
        0 | 1 => items.pop().unwrap_or_default(),
        _ => {
            let last = items.pop().unwrap_or_default();
            format!("{}, and {}", items.join(", "), last)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oxford_commas() {
        let cases: &[(&[&str], &str)] = &[
            (&[], ""),
            (&[""], ""),
            (&["apples"], "apples"),
            (&["apples", "oranges"], "apples, and oranges"),
            (&["apples", "oranges", "pears"], "apples, oranges, and pears"),
            (&["1", "2", "3"], "1, 2, and 3"),
        ];
        for (items, expected) in cases {
            assert_eq!(join_with_oxford_commas(items.iter()), *expected);
        }
    }

    #[test]
    fn matching_tags_are_latest() {
        assert_eq!(compare_tag(&format!("v{VERSION}")), VersionCheck::Latest);
        assert_eq!(compare_tag(VERSION), VersionCheck::Latest);
    }

    #[test]
    fn other_tags_are_lagging() {
        assert_eq!(compare_tag("v999.0.0"), VersionCheck::Lagging);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unknown() {
        // Nothing listens on the discard port.
        assert_eq!(
            check_against("http://127.0.0.1:9/releases/latest").await,
            VersionCheck::Unknown
        );
    }
}
