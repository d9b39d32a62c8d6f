use buildhook_core::{
    Error, Result,
    models::{NO_COMMIT_MESSAGE, PushEvent, UNKNOWN},
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct PushPayload {
    repository: PayloadRepository,
    after: String,
    #[serde(rename = "ref")]
    reference: String,
    pusher: Option<PayloadUser>,
    commits: Option<Vec<PayloadCommit>>,
}

#[derive(Debug, Deserialize)]
struct PayloadRepository {
    clone_url: String,
    name: Option<String>,
    owner: Option<PayloadOwner>,
}

#[derive(Debug, Deserialize)]
struct PayloadOwner {
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PayloadUser {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PayloadCommit {
    message: Option<String>,
    author: Option<PayloadUser>,
}

impl From<PushPayload> for PushEvent {
    fn from(payload: PushPayload) -> Self {
        let PushPayload { repository, after, reference, pusher, commits } = payload;
        let latest = commits.unwrap_or_default().into_iter().next();
        let author = pusher
            .and_then(|p| p.name)
            .or_else(|| {
                latest.as_ref().and_then(|c| c.author.as_ref()).and_then(|a| a.name.clone())
            })
            .unwrap_or_else(|| UNKNOWN.to_string());
        let commit_message = latest
            .and_then(|c| c.message)
            .unwrap_or_else(|| NO_COMMIT_MESSAGE.to_string());
        let branch = reference.strip_prefix("refs/heads/").unwrap_or(&reference).to_string();
        Self {
            author,
            repository_url: repository.clone_url,
            commit_sha: after,
            branch,
            commit_message,
            owner: repository.owner.and_then(|o| o.login).unwrap_or_else(|| UNKNOWN.to_string()),
            repository_name: repository.name.unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

/// Extract a [`PushEvent`] from a decoded push payload.
pub fn parse_push_event(value: Value) -> Result<PushEvent> {
    serde_json::from_value::<PushPayload>(value).map(PushEvent::from).map_err(Error::Validation)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn full_payload() -> Value {
        json!({
            "ref": "refs/heads/main",
            "before": "0000000000000000000000000000000000000000",
            "after": "abc123",
            "repository": {
                "name": "repo",
                "full_name": "org/repo",
                "clone_url": "https://example.com/org/repo.git",
                "owner": { "login": "org", "id": 1 }
            },
            "pusher": { "name": "octocat", "email": "octocat@example.com" },
            "commits": [
                {
                    "id": "abc123",
                    "message": "Fix the flux capacitor",
                    "author": { "name": "Marty", "email": "marty@example.com" }
                },
                {
                    "id": "def456",
                    "message": "Second commit",
                    "author": { "name": "Doc" }
                }
            ]
        })
    }

    #[test]
    fn test_full_payload() {
        let event = parse_push_event(full_payload()).unwrap();
        assert_eq!(event, PushEvent {
            author: "octocat".to_string(),
            repository_url: "https://example.com/org/repo.git".to_string(),
            commit_sha: "abc123".to_string(),
            branch: "main".to_string(),
            commit_message: "Fix the flux capacitor".to_string(),
            owner: "org".to_string(),
            repository_name: "repo".to_string(),
        });
    }

    #[test]
    fn test_defaults() {
        let event = parse_push_event(json!({
            "ref": "refs/heads/feature/x",
            "after": "abc123",
            "repository": { "clone_url": "https://example.com/org/repo.git" }
        }))
        .unwrap();
        assert_eq!(event.branch, "feature/x");
        assert_eq!(event.owner, "Unknown");
        assert_eq!(event.repository_name, "Unknown");
        assert_eq!(event.author, "Unknown");
        assert_eq!(event.commit_message, "No commit message");
    }

    #[test]
    fn test_owner_without_login() {
        let mut payload = full_payload();
        payload["repository"]["owner"] = json!({ "id": 1 });
        assert_eq!(parse_push_event(payload).unwrap().owner, "Unknown");
    }

    #[test]
    fn test_empty_commits() {
        let mut payload = full_payload();
        payload["commits"] = json!([]);
        let event = parse_push_event(payload).unwrap();
        assert_eq!(event.commit_message, "No commit message");
        assert_eq!(event.author, "octocat");
    }

    #[test]
    fn test_null_commits() {
        let mut payload = full_payload();
        payload["commits"] = Value::Null;
        assert_eq!(parse_push_event(payload).unwrap().commit_message, "No commit message");
    }

    #[test]
    fn test_author_falls_back_to_commit() {
        let mut payload = full_payload();
        payload.as_object_mut().unwrap().remove("pusher");
        assert_eq!(parse_push_event(payload).unwrap().author, "Marty");
    }

    #[test]
    fn test_tag_ref_is_kept() {
        let mut payload = full_payload();
        payload["ref"] = json!("refs/tags/v1.0");
        assert_eq!(parse_push_event(payload).unwrap().branch, "refs/tags/v1.0");
    }

    #[test]
    fn test_missing_required_fields() {
        for field in ["after", "ref", "repository"] {
            let mut payload = full_payload();
            payload.as_object_mut().unwrap().remove(field);
            let err = parse_push_event(payload).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{field}: {err}");
        }
        let mut payload = full_payload();
        payload["repository"].as_object_mut().unwrap().remove("clone_url");
        assert!(matches!(parse_push_event(payload), Err(Error::Validation(_))));
    }

    #[test]
    fn test_malformed_field() {
        let mut payload = full_payload();
        payload["after"] = json!(42);
        assert!(matches!(parse_push_event(payload), Err(Error::Validation(_))));
    }
}
