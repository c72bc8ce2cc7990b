//! Project type detection from marker files at the scan root.

use std::path::Path;

use foldscope_core::ProjectType;

/// Marker files per project type, checked in order.
pub const PROJECT_SIGNATURES: &[(ProjectType, &[&str])] = &[
    (
        ProjectType::Python,
        &["requirements.txt", "setup.py", "pyproject.toml"],
    ),
    (ProjectType::Node, &["package.json", "node_modules"]),
    (ProjectType::Web, &["index.html", "style.css"]),
    (ProjectType::Java, &["pom.xml", "build.gradle"]),
    (ProjectType::Docker, &["Dockerfile", "docker-compose.yml"]),
];

/// Detect the project type of `root`.
///
/// Only direct children of the root are checked, and only for presence.
/// The first signature with any marker present wins.
pub fn detect_project_type(root: &Path) -> ProjectType {
    PROJECT_SIGNATURES
        .iter()
        .find(|(_, markers)| {
            markers
                .iter()
                .any(|marker| root.join(marker).symlink_metadata().is_ok())
        })
        .map(|(project_type, _)| *project_type)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_when_empty() {
        let temp = TempDir::new().unwrap();
        assert_eq!(detect_project_type(temp.path()), ProjectType::Unknown);
    }

    #[test]
    fn test_directory_marker() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("node_modules")).unwrap();
        assert_eq!(detect_project_type(temp.path()), ProjectType::Node);
    }

    #[test]
    fn test_first_signature_wins() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Dockerfile"), "FROM scratch\n").unwrap();
        fs::write(temp.path().join("package.json"), "{}").unwrap();
        fs::write(temp.path().join("setup.py"), "").unwrap();

        assert_eq!(detect_project_type(temp.path()), ProjectType::Python);
    }

    #[test]
    fn test_nested_markers_ignored() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub/pom.xml"), "<project/>").unwrap();

        assert_eq!(detect_project_type(temp.path()), ProjectType::Unknown);
    }
}
