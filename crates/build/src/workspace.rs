use std::{
    io::{self, Read},
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    time::Duration,
};

use buildhook_core::{Error, Result, config::BuildConfig, util::is_strict_descendant};
use tempfile::TempDir;
use tokio::process::Command;

/// A temporary git checkout, owned by the build that created it.
/// Dropping it without [`RepositoryWorkspace::destroy`] still removes the directory.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn path(&self) -> &Path { self.dir.path() }
}

/// Provisions build workspaces below a temp root and runs processes in them.
#[derive(Debug, Clone)]
pub struct RepositoryWorkspace {
    git: String,
    temp_root: PathBuf,
    timeout: Option<Duration>,
}

impl RepositoryWorkspace {
    pub fn new(git: impl Into<String>, temp_root: impl Into<PathBuf>) -> Self {
        Self { git: git.into(), temp_root: temp_root.into(), timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &BuildConfig) -> Self {
        Self::new(config.git.clone(), config.temp_root()).with_timeout(config.timeout())
    }

    /// Clone `url` into a fresh workspace, checking out `commit` if given.
    /// The workspace is removed again if any git step fails.
    pub async fn clone_repo(&self, url: &str, commit: Option<&str>) -> Result<Workspace> {
        let dir = tempfile::Builder::new()
            .prefix("repository")
            .tempdir_in(&self.temp_root)
            .map_err(|e| Error::io("Failed to create workspace", e))?;
        let workspace = Workspace { dir };
        tracing::info!("Cloning {} into {}", url, workspace.path().display());
        let result = self.checkout(url, commit, workspace.path()).await;
        match result {
            Ok(()) => Ok(workspace),
            Err(e) => {
                if let Err(cleanup) = self.destroy(workspace).await {
                    tracing::warn!("Failed to remove workspace after failed clone: {cleanup}");
                }
                Err(e)
            }
        }
    }

    async fn checkout(&self, url: &str, commit: Option<&str>, dir: &Path) -> Result<()> {
        self.git(&["clone", "--quiet", "--", url, "."], dir).await?;
        if let Some(commit) = commit {
            self.git(&["checkout", "--quiet", "--detach", commit], dir).await?;
        }
        Ok(())
    }

    async fn git(&self, args: &[&str], dir: &Path) -> Result<()> {
        let command = std::iter::once(self.git.as_str())
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect::<Vec<_>>();
        let (status, output) = self.execute(&command, dir).await?;
        if !status.success() {
            return Err(Error::ExitStatus { command: command.join(" "), status, output });
        }
        Ok(())
    }

    /// Run `command` inside the workspace and return its combined stdout and
    /// stderr. The exit status is not interpreted.
    pub async fn run(&self, command: &[String], workspace: &Workspace) -> Result<String> {
        let (status, output) = self.execute(command, workspace.path()).await?;
        tracing::info!("`{}` exited with {}", command.join(" "), status);
        Ok(output)
    }

    async fn execute(&self, command: &[String], dir: &Path) -> Result<(ExitStatus, String)> {
        let display = command.join(" ");
        let Some((program, args)) = command.split_first() else {
            return Err(Error::Spawn {
                command: display,
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty command"),
            });
        };
        // Both streams share one pipe so their output stays interleaved in order.
        let (mut reader, writer) =
            io::pipe().map_err(|e| Error::io("Failed to create output pipe", e))?;
        let mut child = {
            let stderr =
                writer.try_clone().map_err(|e| Error::io("Failed to create output pipe", e))?;
            let mut cmd = Command::new(program);
            cmd.args(args)
                .current_dir(dir)
                .stdin(Stdio::null())
                .stdout(writer)
                .stderr(stderr)
                .kill_on_drop(true);
            // Own process group, so a timeout can take down everything the build forked
            #[cfg(unix)]
            cmd.process_group(0);
            cmd.spawn().map_err(|source| Error::Spawn { command: display.clone(), source })?
        };
        let pid = child.id();
        let read = tokio::task::spawn_blocking(move || {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf).map(|_| buf)
        });
        // Output ends once every process holding the pipe exits, not just the child.
        let finished = async {
            let status = child.wait().await;
            let output = read.await.map_err(io::Error::other).and_then(|result| result);
            (status, output)
        };
        let (status, output) = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, finished).await {
                Ok(finished) => finished,
                Err(_) => {
                    kill_process_group(pid, &display);
                    if let Err(e) = child.kill().await {
                        let command = &display;
                        tracing::warn!("Failed to kill `{command}`: {e}");
                    }
                    return Err(Error::Timeout { command: display, timeout });
                }
            },
            None => finished.await,
        };
        let status =
            status.map_err(|e| Error::io(format!("Failed to wait for `{display}`"), e))?;
        let output =
            output.map_err(|e| Error::io(format!("Failed to read output of `{display}`"), e))?;
        Ok((status, normalize_output(&output)))
    }

    /// Remove a workspace created by [`Self::clone_repo`].
    pub async fn destroy(&self, workspace: Workspace) -> Result<()> {
        // Take over removal from the guard so a sandbox violation leaves the directory as-is.
        let path = workspace.dir.keep();
        self.remove_sandboxed(&path).await
    }

    /// Recursively remove `dir`, refusing unless its resolved path lies strictly
    /// below the resolved temp root.
    pub async fn remove_sandboxed(&self, dir: &Path) -> Result<()> {
        let root = tokio::fs::canonicalize(&self.temp_root)
            .await
            .map_err(|e| Error::io(format!("Failed to resolve {}", self.temp_root.display()), e))?;
        let resolved = tokio::fs::canonicalize(dir)
            .await
            .map_err(|e| Error::io(format!("Failed to resolve {}", dir.display()), e))?;
        if !is_strict_descendant(&resolved, &root) {
            return Err(Error::SandboxViolation { path: resolved, root });
        }
        tokio::fs::remove_dir_all(&resolved)
            .await
            .map_err(|e| Error::io(format!("Failed to remove {}", resolved.display()), e))?;
        tracing::debug!("Removed workspace {}", resolved.display());
        Ok(())
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>, display: &str) {
    use nix::{
        errno::Errno,
        sys::signal::{Signal, killpg},
        unistd::Pid,
    };

    let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => {
            let command = display;
            tracing::warn!("Failed to kill process group of `{command}`: {e}")
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>, _display: &str) {}

/// Lossy UTF-8 decode, dropping the final line terminator.
fn normalize_output(output: &[u8]) -> String {
    let text = String::from_utf8_lossy(output);
    let text = text.strip_suffix('\n').map(|t| t.strip_suffix('\r').unwrap_or(t)).unwrap_or(&*text);
    text.to_string()
}
