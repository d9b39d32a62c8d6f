use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub github: GitHubConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Externally reachable base URL, used for commit status links.
    pub public_url: Option<Url>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubConfig {
    pub webhook_secret: String,
    /// Token used to post commit statuses. Reporting is disabled without it.
    pub token: Option<String>,
    #[serde(default = "default_status_context")]
    pub status_context: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BuildConfig {
    pub command: Vec<String>,
    pub git: String,
    pub log_root: PathBuf,
    pub temp_root: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub success_markers: Vec<String>,
    pub failure_markers: Vec<String>,
}

impl BuildConfig {
    pub fn timeout(&self) -> Option<Duration> { self.timeout_secs.map(Duration::from_secs) }

    pub fn temp_root(&self) -> PathBuf { self.temp_root.clone().unwrap_or_else(std::env::temp_dir) }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: vec!["mvn".to_string(), "-B".to_string(), "test".to_string()],
            git: "git".to_string(),
            log_root: PathBuf::from("logs"),
            temp_root: None,
            timeout_secs: None,
            success_markers: vec!["BUILD SUCCESS".to_string()],
            failure_markers: vec!["BUILD FAILURE".to_string()],
        }
    }
}

fn default_status_context() -> String { "ci/buildhook".to_string() }
