use foldscope_scan::{
    ProjectType, ScanError, ScanHandle, ScanLimits, ScanRegistry, Stage, TraversalEngine,
    WarningKind, is_cloud_storage,
};
use foldscope_analyze::{ContentClassifier, DependencyExtractor, DependencyExtractors};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const MIB: usize = 1024 * 1024;

fn write(root: &Path, name: &str, content: impl AsRef<[u8]>) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn create_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write(root, "requirements.txt", "requests\n");
    write(
        root,
        "app/main.py",
        "import os\nfrom collections import defaultdict\n",
    );
    write(root, "app/main_test.py", "import unittest\n");
    write(root, "web/index.js", "const x = require('express');\n");
    write(root, "docs/report.txt", "Quarterly report\n");
    write(root, "docs/report_final.txt", "Final quarterly report\n");
    write(root, "docs/a.txt", "a\n");
    write(root, "docs/ab.txt", "ab\n");
    write(root, "assets/blob.bin", [0u8, 1, 2, 3, 0, 5]);

    temp
}

#[test]
fn test_totals_match_processed_files() {
    let temp = create_project();
    let report = TraversalEngine::new(temp.path(), ScanLimits::default())
        .unwrap()
        .run();
    let aggregate = &report.aggregate;

    assert_eq!(report.stage, Stage::Complete);
    assert_eq!(aggregate.total_files, aggregate.records().len() as u64);
    assert_eq!(aggregate.total_files, 9);
    assert_eq!(
        aggregate.total_bytes,
        aggregate.records().iter().map(|r| r.size).sum::<u64>()
    );
    assert_eq!(
        aggregate.file_types.values().sum::<u64>(),
        aggregate.total_files
    );
}

#[test]
fn test_project_type_and_dependencies() {
    let temp = create_project();
    let report = TraversalEngine::new(temp.path(), ScanLimits::default())
        .unwrap()
        .run();
    let aggregate = &report.aggregate;

    assert_eq!(aggregate.project_type, ProjectType::Python);
    for dep in ["os", "collections", "unittest", "express"] {
        assert!(aggregate.dependencies.contains(dep), "missing {dep}");
    }

    let main = aggregate
        .records()
        .iter()
        .find(|r| r.path.ends_with("main.py"))
        .unwrap();
    assert_eq!(
        main.analysis.dependencies(),
        ["collections".to_string(), "os".to_string()]
    );
}

#[test]
fn test_rankings_sorted_and_bounded() {
    let temp = TempDir::new().unwrap();
    for i in 0..15 {
        write(temp.path(), &format!("file{i:02}.dat"), vec![b'x'; (i * 37 + 11) % 200 + 1]);
    }

    let report = TraversalEngine::new(temp.path(), ScanLimits::default())
        .unwrap()
        .run();
    let aggregate = &report.aggregate;

    let largest: Vec<u64> = aggregate.largest_files().map(|r| r.size).collect();
    assert_eq!(largest.len(), 10);
    assert!(largest.windows(2).all(|w| w[0] >= w[1]));
    let min = *largest.last().unwrap();
    let ranked: Vec<&str> = aggregate.largest_files().map(|r| r.path.as_str()).collect();
    for record in aggregate.records() {
        if !ranked.contains(&record.path.as_str()) {
            assert!(record.size <= min);
        }
    }

    let newest: Vec<_> = aggregate.newest_files().map(|r| r.modified()).collect();
    assert!(newest.len() <= 10);
    assert!(newest.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_related_files_grouped_through_engine() {
    let temp = create_project();
    let report = TraversalEngine::new(temp.path(), ScanLimits::default())
        .unwrap()
        .run();

    let groups: Vec<(&str, &[String])> = report.aggregate.related_groups().collect();
    assert!(groups.iter().any(|(key, related)| {
        key.ends_with("report.txt") && related.iter().any(|r| r.ends_with("report_final.txt"))
    }));
    assert!(groups.iter().any(|(key, related)| {
        key.ends_with("main.py") && related.iter().any(|r| r.ends_with("main_test.py"))
    }));
    assert!(!groups
        .iter()
        .any(|(key, _)| key.ends_with("/a.txt") || key.ends_with("/ab.txt")));
}

#[test]
fn test_cloud_storage_detection() {
    assert!(is_cloud_storage(Path::new("/Users/x/OneDrive/Projects")));
    assert!(is_cloud_storage(Path::new("/Users/x/ONEDRIVE")));
    assert!(!is_cloud_storage(Path::new("C:/Users/x/Documents")));
}

#[test]
fn test_cloud_per_file_ceiling() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("OneDrive");
    write(&root, "big.bin", vec![0u8; 11 * MIB]);
    write(&root, "small.bin", vec![0u8; 9 * MIB]);

    let limits = ScanLimits::builder()
        .cloud_max_file_bytes((10 * MIB) as u64)
        .build()
        .unwrap();
    let engine = TraversalEngine::new(&root, limits).unwrap();
    assert!(engine.is_cloud_storage());
    let report = engine.run();

    assert_eq!(report.stage, Stage::CompletedWithWarnings);
    assert_eq!(report.aggregate.total_files, 1);
    assert_eq!(report.aggregate.records()[0].path, "small.bin");
    assert!(report.warnings.iter().any(|w| w.kind == WarningKind::CloudStorage));
    assert!(report.warnings.iter().any(|w| {
        w.kind == WarningKind::CloudFileTooLarge && w.message.contains("big.bin")
    }));
}

#[test]
fn test_time_ceiling() {
    let temp = TempDir::new().unwrap();
    for i in 0..100 {
        write(temp.path(), &format!("chunk{i:03}.bin"), vec![0u8; MIB]);
    }

    let limits = ScanLimits::builder()
        .max_duration(Duration::from_nanos(1))
        .build()
        .unwrap();
    let report = TraversalEngine::new(temp.path(), limits).unwrap().run();

    assert!(report.aggregate.total_files < 100);
    let timeouts: Vec<_> = report
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::Timeout)
        .collect();
    assert_eq!(timeouts.len(), 1);
    assert!(timeouts[0].message.starts_with("Analysis timeout after"));
    assert_eq!(report.stage, Stage::CompletedWithWarnings);
}

#[test]
fn test_size_ceiling_partial_results() {
    let temp = TempDir::new().unwrap();
    for name in ["a.bin", "b.bin", "c.bin"] {
        write(temp.path(), name, vec![1u8; 400]);
    }

    let limits = ScanLimits::builder().max_total_bytes(1000u64).build().unwrap();
    let report = TraversalEngine::new(temp.path(), limits).unwrap().run();

    assert_eq!(report.aggregate.total_files, 2);
    assert_eq!(report.aggregate.total_bytes, 800);
    assert_eq!(
        report
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::SizeLimit)
            .count(),
        1
    );
}

#[test]
fn test_cancel_before_run() {
    let temp = create_project();
    let engine = TraversalEngine::new(temp.path(), ScanLimits::default()).unwrap();
    let progress = engine.progress();
    engine.cancel_token().cancel();

    let report = engine.run();
    assert!(report.is_cancelled());
    assert_eq!(report.aggregate.total_files, 0);

    let snapshot = progress.snapshot();
    assert_eq!(snapshot.stage, Stage::Cancelled);
    assert!(snapshot.current <= snapshot.total);
}

/// Cancels the scan the first time a Python file is analyzed.
struct CancelOnExtract(CancellationToken);

impl DependencyExtractor for CancelOnExtract {
    fn language(&self) -> &'static str {
        "python"
    }

    fn extract(&self, _source: &str) -> BTreeSet<String> {
        self.0.cancel();
        BTreeSet::new()
    }
}

#[test]
fn test_cancel_mid_scan_keeps_partial_aggregate() {
    let temp = TempDir::new().unwrap();
    for i in 0..200 {
        write(temp.path(), &format!("note{i:03}.py"), format!("x = {i}\n"));
    }

    let engine = TraversalEngine::new(temp.path(), ScanLimits::default()).unwrap();
    let mut extractors = DependencyExtractors::empty();
    extractors.register(&["py"], Arc::new(CancelOnExtract(engine.cancel_token())));
    let engine = engine.with_classifier(ContentClassifier::with_extractors(extractors));
    let progress = engine.progress();

    let report = engine.run();
    assert!(report.is_cancelled());

    let aggregate = &report.aggregate;
    assert!(aggregate.total_files >= 1 && aggregate.total_files < 200);
    assert_eq!(aggregate.total_files, aggregate.records().len() as u64);

    let expected: Vec<String> = (0..aggregate.total_files)
        .map(|i| format!("note{i:03}.py"))
        .collect();
    let paths: Vec<String> = aggregate.records().iter().map(|r| r.path.clone()).collect();
    assert_eq!(paths, expected);

    let snapshot = progress.snapshot();
    assert_eq!(snapshot.stage, Stage::Cancelled);
    assert_eq!(snapshot.current, aggregate.total_files);
    assert!(snapshot.current <= snapshot.total);
    assert_eq!(snapshot.total, 200);
}

#[cfg(unix)]
#[test]
fn test_symlinks_skipped_with_warning() {
    let temp = create_project();
    std::os::unix::fs::symlink(temp.path().join("docs"), temp.path().join("docs_link")).unwrap();
    std::os::unix::fs::symlink(temp.path().join("docs/a.txt"), temp.path().join("a_link.txt"))
        .unwrap();

    let report = TraversalEngine::new(temp.path(), ScanLimits::default())
        .unwrap()
        .run();
    assert_eq!(report.aggregate.total_files, 9);
    assert_eq!(
        report
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::Symlink)
            .count(),
        2
    );
}

#[test]
fn test_registry_lifecycle() {
    let temp = create_project();
    let registry = ScanRegistry::new();

    let handle = registry.start_scan(temp.path(), ScanLimits::default()).unwrap();
    assert!(registry.poll(handle).is_ok());

    let report = registry.wait(handle).unwrap();
    assert_eq!(report.aggregate.total_files, 9);
    assert_eq!(report.root_path, temp.path().canonicalize().unwrap());
    assert!(report.completed_at >= report.started_at);

    let snapshot = registry.poll(handle).unwrap();
    assert!(snapshot.is_finished());
    assert_eq!(snapshot.current, snapshot.total);

    // Cancelling a finished scan changes nothing.
    registry.cancel(handle).unwrap();
    assert_eq!(registry.result(handle).unwrap().stage, Stage::Complete);
}

#[test]
fn test_registry_errors() {
    let temp = TempDir::new().unwrap();
    let registry = ScanRegistry::new();

    let missing = registry.start_scan(temp.path().join("missing"), ScanLimits::default());
    assert!(matches!(missing, Err(ScanError::InvalidRoot { .. })));
    assert_eq!(registry.active(), None);

    let unknown = ScanHandle::new(42);
    assert!(matches!(registry.poll(unknown), Err(ScanError::NoActiveScan { .. })));
    assert!(matches!(registry.cancel(unknown), Err(ScanError::NoActiveScan { .. })));
    assert!(matches!(registry.result(unknown), Err(ScanError::NoActiveScan { .. })));
}

#[test]
fn test_progress_broadcast() {
    let temp = create_project();
    let engine = TraversalEngine::new(temp.path(), ScanLimits::default()).unwrap();
    let mut rx = engine.subscribe();
    engine.run();

    let mut stages = Vec::new();
    while let Ok(snapshot) = rx.try_recv() {
        if stages.last() != Some(&snapshot.stage) {
            stages.push(snapshot.stage);
        }
    }
    assert_eq!(
        stages,
        vec![
            Stage::DetectingProjectType,
            Stage::CountingFiles,
            Stage::AnalyzingFiles,
            Stage::Complete
        ]
    );
}
