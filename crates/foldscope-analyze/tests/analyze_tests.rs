use foldscope_analyze::{
    ConfigPurpose, ContentAnalysis, ContentClassifier, DependencyExtractors, PythonImports,
    RelationGrouper, media,
};
use foldscope_analyze::DependencyExtractor;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write(root: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = root.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn classify(path: &PathBuf) -> (String, ContentAnalysis) {
    let media_type = media::detect(path);
    let analysis = ContentClassifier::new().classify(path, &media_type);
    (media_type.to_string(), analysis)
}

#[test]
fn test_detect_and_classify_python() {
    let temp = TempDir::new().unwrap();
    let path = write(
        &temp,
        "pkg/main.py",
        "import os\nfrom collections import defaultdict\n\nprint(os.getcwd())\n",
    );

    let (media_type, analysis) = classify(&path);
    assert!(media::is_textual(&media_type));

    let expected: Vec<String> = vec!["collections".into(), "os".into()];
    assert_eq!(analysis.dependencies(), expected.as_slice());
    assert_eq!(analysis.text().map(|t| t.lines), Some(4));
}

#[test]
fn test_detect_and_classify_typescript() {
    let temp = TempDir::new().unwrap();
    let path = write(
        &temp,
        "src/index.ts",
        "import { x } from \"./x\";\nconst y = require('y');\n",
    );

    let (_, analysis) = classify(&path);
    let expected: Vec<String> = vec!["./x".into(), "y".into()];
    assert_eq!(analysis.dependencies(), expected.as_slice());
}

#[test]
fn test_invalid_python_has_no_dependencies() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "broken.py", "import os\nclass (:\n");

    let (_, analysis) = classify(&path);
    assert_eq!(analysis.label(), "code");
    assert!(analysis.dependencies().is_empty());
}

#[test]
fn test_manifest_and_docs() {
    let temp = TempDir::new().unwrap();
    let manifest = write(&temp, "pyproject.toml", "[project]\nname = \"demo\"\n");
    let readme = write(&temp, "README.MD", "# Demo\n\nShort readme.\n");

    let (_, manifest_analysis) = classify(&manifest);
    assert_eq!(
        manifest_analysis.purpose(),
        Some(ConfigPurpose::DependencyManagement)
    );

    let (_, readme_analysis) = classify(&readme);
    assert_eq!(readme_analysis.preview(), Some("# Demo\n\nShort readme.\n"));
}

#[test]
fn test_manifest_names() {
    let temp = TempDir::new().unwrap();
    for name in ["package.json", "Cargo.toml", "composer.json"] {
        let path = write(&temp, name, "{}\n");
        let (_, analysis) = classify(&path);
        assert_eq!(analysis.purpose(), Some(ConfigPurpose::DependencyManagement), "{name}");
    }

    let tsconfig = write(&temp, "tsconfig.json", "{}\n");
    assert_eq!(classify(&tsconfig).1.purpose(), None);

    // A .txt file is documentation, never configuration.
    let requirements = write(&temp, "requirements.txt", "requests\n");
    let (_, analysis) = classify(&requirements);
    assert_eq!(analysis.purpose(), None);
    assert_eq!(analysis.preview(), Some("requests\n"));
}

#[test]
fn test_binary_file_is_binary() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.zip");
    fs::write(&path, [b'P', b'K', 0x03, 0x04, 0, 0, 0, 0, 0, 0]).unwrap();

    let (media_type, analysis) = classify(&path);
    assert_eq!(media_type, "application/zip");
    assert_eq!(analysis, ContentAnalysis::Binary);
}

#[test]
fn test_repeated_classification_is_stable() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "notes.txt", &"line\n".repeat(100));

    let first = classify(&path);
    let second = classify(&path);
    assert_eq!(first, second);
    assert!(first.1.preview().unwrap().ends_with("..."));
}

#[test]
fn test_custom_extractor_table() {
    let mut table = DependencyExtractors::empty();
    table.register(&["pyi"], std::sync::Arc::new(PythonImports));

    let deps = table.extract("PYI", "import typing\n");
    assert_eq!(deps, BTreeSet::from(["typing".to_string()]));
    assert!(table.extract("py", "import typing\n").is_empty());
    assert_eq!(PythonImports.language(), "python");
}

#[test]
fn test_grouping_scenario() {
    let grouper = RelationGrouper::new();
    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
    for path in ["report.txt", "report_final.txt", "a.txt", "ab.txt", "summary.md"] {
        grouper.group(&mut groups, path);
    }

    assert_eq!(groups["report.txt"], vec!["report_final.txt".to_string()]);
    assert!(groups["a.txt"].is_empty());
    assert!(groups["ab.txt"].is_empty());
    assert_eq!(
        groups.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["report.txt", "a.txt", "ab.txt", "summary.md"]
    );
}
