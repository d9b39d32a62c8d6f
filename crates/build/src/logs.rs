use std::{
    io,
    path::{Path, PathBuf},
};

use buildhook_core::{
    Error, Result,
    models::BuildSummary,
    util::{is_strict_descendant, normalize_lexically},
};
use maud::{Markup, PreEscaped, html};
use time::{Date, OffsetDateTime};
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};

pub const LOG_EXTENSION: &str = "log";
const COMMIT_ID_PREFIX: &str = "Commit ID: ";
const BUILD_DATE_PREFIX: &str = "Build date: ";
/// Rendered for header fields a log does not carry.
pub const MISSING_FIELD: &str = "N/A";

const TABLE_STYLE: &str = r#"
table { border-collapse: collapse; font-family: sans-serif; }
th, td { border: 1px solid #ccc; padding: 4px 12px; text-align: left; }
th { background-color: #f2f2f2; }
tr:nth-child(even) { background-color: #fafafa; }
"#;

/// Numbered build logs stored as `<id>.log` files in a single directory.
#[derive(Debug)]
pub struct BuildLogStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl BuildLogStore {
    /// Open the store at `root`, creating the directory if needed.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        match fs::metadata(root).await {
            Ok(metadata) if !metadata.is_dir() => {
                return Err(Error::io(
                    format!("Log root {} is not a directory", root.display()),
                    io::Error::from(io::ErrorKind::AlreadyExists),
                ));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("Creating log root {}", root.display());
                fs::create_dir_all(root)
                    .await
                    .map_err(|e| Error::io(format!("Failed to create {}", root.display()), e))?;
            }
            Err(e) => return Err(Error::io(format!("Failed to access {}", root.display()), e)),
        }
        let root = fs::canonicalize(root)
            .await
            .map_err(|e| Error::io(format!("Failed to resolve {}", root.display()), e))?;
        Ok(Self { root, write_lock: Mutex::new(()) })
    }

    pub fn root(&self) -> &Path { &self.root }

    fn path_for(&self, id: u64) -> PathBuf { self.root.join(format!("{id}.{LOG_EXTENSION}")) }

    /// Ids of all persisted logs, ascending.
    pub async fn ids(&self) -> Result<Vec<u64>> {
        let context = || format!("Failed to list {}", self.root.display());
        let mut entries = fs::read_dir(&self.root).await.map_err(|e| Error::io(context(), e))?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Error::io(context(), e))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LOG_EXTENSION) {
                continue;
            }
            if let Some(id) = path.file_stem().and_then(|s| s.to_str()).and_then(|s| s.parse().ok())
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// The id the next stored log is expected to receive: the number of
    /// existing logs plus one.
    pub async fn next_id(&self) -> Result<u64> { Ok(self.ids().await?.len() as u64 + 1) }

    /// Persist a build log and return its id.
    ///
    /// Starts at [`Self::next_id`] and claims the file with an exclusive create,
    /// moving on to the following id if another writer got there first. An
    /// existing log is never overwritten.
    pub async fn store(&self, raw_output: &str, commit_id: &str) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        let contents =
            format!("{COMMIT_ID_PREFIX}{commit_id}\n{BUILD_DATE_PREFIX}{}\n{raw_output}", today());
        let mut id = self.next_id().await?;
        loop {
            let path = self.path_for(id);
            match fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    let context = || format!("Failed to write {}", path.display());
                    file.write_all(contents.as_bytes()).await.map_err(|e| Error::io(context(), e))?;
                    file.flush().await.map_err(|e| Error::io(context(), e))?;
                    tracing::info!("Stored build log {} for commit {}", id, commit_id);
                    return Ok(id);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::warn!("Build log {} already exists, trying {}", id, id + 1);
                    id += 1;
                }
                Err(e) => {
                    return Err(Error::io(format!("Failed to create {}", path.display()), e));
                }
            }
        }
    }

    /// Read the full text of log `id`. `id` comes straight from the request,
    /// so the resolved path must stay below the log root.
    pub async fn retrieve(&self, id: &str) -> Result<String> {
        let candidate = normalize_lexically(self.root.join(format!("{id}.{LOG_EXTENSION}")));
        if !is_strict_descendant(&candidate, &self.root) {
            return Err(Error::SandboxViolation { path: candidate, root: self.root.clone() });
        }
        let resolved = match fs::canonicalize(&candidate).await {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound(id.to_string()));
            }
            Err(e) => {
                return Err(Error::io(format!("Failed to resolve {}", candidate.display()), e));
            }
        };
        // Symlinks inside the root may still point elsewhere
        if !is_strict_descendant(&resolved, &self.root) {
            return Err(Error::SandboxViolation { path: resolved, root: self.root.clone() });
        }
        fs::read_to_string(&resolved).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound(id.to_string()),
            _ => Error::io(format!("Failed to read {}", resolved.display()), e),
        })
    }

    /// Render the listing row for log `id`.
    pub async fn summarize(&self, id: u64) -> Result<Markup> {
        let text = self.retrieve(&id.to_string()).await?;
        Ok(summary_row(&parse_summary(id, &text)))
    }

    /// Render every log as an HTML table, ascending by id. Logs that cannot be
    /// read are left out.
    pub async fn list_all(&self) -> Result<Markup> {
        let mut rows = Vec::new();
        for id in self.ids().await? {
            match self.summarize(id).await {
                Ok(row) => rows.push(row),
                Err(e) => tracing::warn!("Skipping build log {id}: {e}"),
            }
        }
        Ok(html! {
            table {
                tr {
                    th { "Build ID" }
                    th { "Date" }
                    th { "Commit ID" }
                }
                @for row in &rows {
                    (row)
                }
            }
            style { (PreEscaped(TABLE_STYLE)) }
        })
    }
}

fn today() -> Date {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()).date()
}

fn header_field(text: &str, prefix: &str) -> Option<String> {
    let start = text.find(prefix)? + prefix.len();
    let rest = &text[start..];
    let end = rest.find('\n').unwrap_or(rest.len());
    Some(rest[..end].to_string())
}

/// Extract the header fields written by [`BuildLogStore::store`].
pub fn parse_summary(id: u64, text: &str) -> BuildSummary {
    BuildSummary {
        id,
        commit_id: header_field(text, COMMIT_ID_PREFIX),
        build_date: header_field(text, BUILD_DATE_PREFIX),
    }
}

fn summary_row(summary: &BuildSummary) -> Markup {
    html! {
        tr {
            td { a href=(format!("/logs/{}", summary.id)) { (summary.id) } }
            td { (summary.build_date.as_deref().unwrap_or(MISSING_FIELD)) }
            td { (summary.commit_id.as_deref().unwrap_or(MISSING_FIELD)) }
        }
    }
}
