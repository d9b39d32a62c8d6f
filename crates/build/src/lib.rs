pub mod classify;
pub mod logs;
pub mod pipeline;
pub mod workspace;

pub use classify::OutcomeClassifier;
pub use logs::BuildLogStore;
pub use pipeline::{BuildPipeline, BuildReport};
pub use workspace::{RepositoryWorkspace, Workspace};

#[cfg(test)]
pub(crate) mod test_util {
    use std::{os::unix::fs::PermissionsExt, path::PathBuf};

    use tempfile::TempDir;

    /// Stand-in for the git binary that records its arguments.
    pub struct FakeGit {
        dir: TempDir,
    }

    impl FakeGit {
        pub const BAD_COMMIT: &str = "badc0ffee";

        pub fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let log = dir.path().join("calls.log");
            let script = format!(
                r##"#!/bin/sh
echo "$@" >> '{log}'
case "$1" in
  clone)
    echo "Cloning into '.'..." >&2
    echo "# repo" > README.md
    ;;
  checkout)
    if [ "$4" = "{bad}" ]; then
      echo "error: pathspec '$4' did not match any file(s) known to git" >&2
      exit 1
    fi
    ;;
esac
"##,
                log = log.display(),
                bad = Self::BAD_COMMIT,
            );
            let path = dir.path().join("git");
            std::fs::write(&path, script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            Self { dir }
        }

        pub fn program(&self) -> String { self.path().display().to_string() }

        fn path(&self) -> PathBuf { self.dir.path().join("git") }

        pub fn calls(&self) -> Vec<String> {
            std::fs::read_to_string(self.dir.path().join("calls.log"))
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    pub fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }
}
