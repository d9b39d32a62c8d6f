pub mod push;
pub mod signature;
pub mod status;
pub mod webhook;

use std::sync::OnceLock;

use buildhook_core::models::{PushEvent, UNKNOWN};
use regex::Regex;

/// Extract `(owner, repo)` from a clone URL, for any host.
/// Accepts `scheme://host/owner/repo(.git)` and `git@host:owner/repo(.git)`.
pub fn extract_repo_slug(url: &str) -> Option<(&str, &str)> {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    let caps = REGEX
        .get_or_init(|| {
            Regex::new(
                r"^(?:[a-z][a-z0-9+.-]*://[^/]+/|[^@/]+@[^:/]+:)(?:[^/]+/)*?(?P<owner>[^/]+)/(?P<repo>[^/]+?)(?:\.git)?/?$",
            )
            .unwrap()
        })
        .captures(url)?;
    let owner = caps.name("owner").map(|m| m.as_str()).unwrap_or_default();
    let repo = caps.name("repo").map(|m| m.as_str()).unwrap_or_default();
    Some((owner, repo))
}

/// Owner and repository name used to address the source host's API,
/// preferring the payload's fields over the clone URL.
pub fn repo_identifier(event: &PushEvent) -> Option<(String, String)> {
    if event.owner != UNKNOWN && event.repository_name != UNKNOWN {
        return Some((event.owner.clone(), event.repository_name.clone()));
    }
    extract_repo_slug(&event.repository_url)
        .map(|(owner, repo)| (owner.to_string(), repo.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_repo_slug() {
        let cases: &[(&str, Option<(&str, &str)>)] = &[
            ("https://github.com/foo/bar", Some(("foo", "bar"))),
            ("http://github.com/foo/bar/", Some(("foo", "bar"))),
            ("https://github.com/foo/bar.git", Some(("foo", "bar"))),
            ("https://example.com/org/repo.git", Some(("org", "repo"))),
            ("https://git.example.com/group/sub/repo.git", Some(("sub", "repo"))),
            ("git@github.com:foo/bar.git", Some(("foo", "bar"))),
            ("https://github.com/foo", None),
            ("/srv/git/repo.git", None),
        ];
        for &(url, expected) in cases {
            assert_eq!(extract_repo_slug(url), expected, "{url}");
        }
    }

    #[test]
    fn test_repo_identifier() {
        let mut event = PushEvent {
            author: "octocat".to_string(),
            repository_url: "https://github.com/from-url/repo-from-url.git".to_string(),
            commit_sha: "abc123".to_string(),
            branch: "main".to_string(),
            commit_message: "msg".to_string(),
            owner: "org".to_string(),
            repository_name: "repo".to_string(),
        };
        assert_eq!(repo_identifier(&event), Some(("org".to_string(), "repo".to_string())));
        event.owner = UNKNOWN.to_string();
        assert_eq!(
            repo_identifier(&event),
            Some(("from-url".to_string(), "repo-from-url".to_string()))
        );
        event.repository_url = "/srv/git/repo".to_string();
        assert_eq!(repo_identifier(&event), None);
    }
}
