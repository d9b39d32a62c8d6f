use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without touching the filesystem.
/// `..` never climbs above the root of an absolute path.
pub fn normalize_lexically(path: impl AsRef<Path>) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

/// Whether `path` lies strictly below `root`. Both must already be resolved.
pub fn is_strict_descendant(path: &Path, root: &Path) -> bool {
    path != root && path.starts_with(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lexically() {
        let cases: &[(&str, &str)] = &[
            ("/var/logs/1.log", "/var/logs/1.log"),
            ("/var/logs/../secret.log", "/var/secret.log"),
            ("/var/logs/./2.log", "/var/logs/2.log"),
            ("/var/logs/a/../../../../etc", "/etc"),
            ("logs/../../x", "../x"),
            ("../../x", "../../x"),
        ];
        for &(input, expected) in cases {
            assert_eq!(normalize_lexically(input), PathBuf::from(expected), "{input}");
        }
    }

    #[test]
    fn test_is_strict_descendant() {
        let root = Path::new("/tmp");
        assert!(is_strict_descendant(Path::new("/tmp/repository123"), root));
        assert!(is_strict_descendant(Path::new("/tmp/a/b"), root));
        assert!(!is_strict_descendant(Path::new("/tmp"), root));
        assert!(!is_strict_descendant(Path::new("/tmpfoo"), root));
        assert!(!is_strict_descendant(Path::new("/home/user/project"), root));
    }
}
