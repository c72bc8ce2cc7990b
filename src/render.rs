//! Console and JSON presenters for scan reports.

use std::io::{self, Write};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;

use foldscope_core::{FileRecord, ScanReport, format_size};
use foldscope_scan::ProgressSnapshot;

/// Files listed per content group in the JSON payload.
const GROUP_SAMPLE: usize = 5;

/// Dependencies listed per file in the JSON payload.
const DEPENDENCY_SAMPLE: usize = 5;

const RULE_WIDTH: usize = 60;

/// Format a timestamp in local time.
pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Structured summary of a finished scan.
#[derive(Debug, Serialize)]
pub struct Payload<'a> {
    pub project_overview: ProjectOverview<'a>,
    pub content_analysis: IndexMap<&'a str, ContentGroup<'a>>,
    pub related_files: IndexMap<&'a str, &'a [String]>,
    pub file_types: Vec<FileTypeCount<'a>>,
    pub largest_files: Vec<SizedPath<'a>>,
    pub newest_files: Vec<DatedPath<'a>>,
    pub progress: ProgressPayload,
}

#[derive(Debug, Serialize)]
pub struct ProjectOverview<'a> {
    pub path: String,
    pub project_type: String,
    pub total_files: u64,
    pub total_size: String,
    pub cloud_storage: bool,
    pub dependencies: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct ContentGroup<'a> {
    pub count: usize,
    pub files: Vec<ContentSample<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ContentSample<'a> {
    pub path: &'a str,
    pub dependencies: &'a [String],
    pub purpose: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FileTypeCount<'a> {
    #[serde(rename = "type")]
    pub media_type: &'a str,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct SizedPath<'a> {
    pub size: &'a str,
    pub path: &'a str,
}

#[derive(Debug, Serialize)]
pub struct DatedPath<'a> {
    pub modified: String,
    pub path: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ProgressPayload {
    pub status: String,
    pub current: u64,
    pub total: u64,
    pub current_file: String,
    pub elapsed_secs: f64,
    pub percentage: f64,
    pub warnings: Vec<String>,
}

impl From<&ProgressSnapshot> for ProgressPayload {
    fn from(snapshot: &ProgressSnapshot) -> Self {
        Self {
            status: snapshot.stage.to_string(),
            current: snapshot.current,
            total: snapshot.total,
            current_file: snapshot.current_file.clone(),
            elapsed_secs: snapshot.elapsed.as_secs_f64(),
            percentage: snapshot.percentage(),
            warnings: snapshot.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

impl<'a> Payload<'a> {
    /// Build the payload from a report and the scan's final progress.
    pub fn new(report: &'a ScanReport, progress: &ProgressSnapshot) -> Self {
        let aggregate = &report.aggregate;

        let content_analysis = aggregate
            .content_groups()
            .map(|(media_type, records)| {
                let group = ContentGroup {
                    count: records.len(),
                    files: records
                        .into_iter()
                        .take(GROUP_SAMPLE)
                        .map(content_sample)
                        .collect(),
                };
                (media_type, group)
            })
            .collect();

        Self {
            project_overview: ProjectOverview {
                path: report.root_path.display().to_string(),
                project_type: aggregate.project_type.to_string(),
                total_files: aggregate.total_files,
                total_size: format_size(aggregate.total_bytes),
                cloud_storage: report.cloud_storage,
                dependencies: aggregate.dependencies.iter().map(String::as_str).collect(),
            },
            content_analysis,
            related_files: aggregate.related_groups().collect(),
            file_types: sorted_file_types(report)
                .map(|(media_type, count)| FileTypeCount { media_type, count })
                .collect(),
            largest_files: aggregate
                .largest_files()
                .map(|r| SizedPath {
                    size: &r.size_human,
                    path: &r.path,
                })
                .collect(),
            newest_files: aggregate
                .newest_files()
                .map(|r| DatedPath {
                    modified: format_timestamp(r.modified()),
                    path: &r.path,
                })
                .collect(),
            progress: ProgressPayload::from(progress),
        }
    }
}

fn content_sample(record: &FileRecord) -> ContentSample<'_> {
    let dependencies = record.analysis.dependencies();
    ContentSample {
        path: &record.path,
        dependencies: &dependencies[..dependencies.len().min(DEPENDENCY_SAMPLE)],
        purpose: record.analysis.purpose().map(|p| p.as_str()).unwrap_or(""),
    }
}

/// Media types by descending count; ties keep discovery order.
fn sorted_file_types(report: &ScanReport) -> impl Iterator<Item = (&str, u64)> {
    report
        .aggregate
        .file_types
        .iter()
        .map(|(media_type, count)| (media_type.as_str(), *count))
        .sorted_by(|a, b| b.1.cmp(&a.1))
}

/// Write a human-readable summary.
pub fn write_text(out: &mut impl Write, report: &ScanReport) -> io::Result<()> {
    let aggregate = &report.aggregate;
    let rule = "─".repeat(RULE_WIDTH);

    writeln!(out)?;
    writeln!(out, "{rule}")?;
    writeln!(out, " {} - {}", report.root_path.display(), report.stage)?;
    writeln!(out, " Scanned in {:.2}s", report.duration.as_secs_f64())?;
    writeln!(out, "{rule}")?;

    writeln!(out)?;
    writeln!(out, "Project Overview")?;
    writeln!(out, "Project Type: {}", aggregate.project_type)?;
    writeln!(out, "Total Files: {}", aggregate.total_files)?;
    writeln!(out, "Total Size: {}", format_size(aggregate.total_bytes))?;

    writeln!(out)?;
    writeln!(out, "File Types Distribution:")?;
    for (media_type, count) in sorted_file_types(report) {
        writeln!(out, "{media_type}: {count}")?;
    }

    writeln!(out)?;
    writeln!(out, "Largest Files:")?;
    for record in aggregate.largest_files() {
        writeln!(out, "{}: {}", record.size_human, record.path)?;
    }

    writeln!(out)?;
    writeln!(out, "Most Recent Files:")?;
    for record in aggregate.newest_files() {
        writeln!(out, "{}: {}", format_timestamp(record.modified()), record.path)?;
    }

    let mut related = aggregate.related_groups().peekable();
    if related.peek().is_some() {
        writeln!(out)?;
        writeln!(out, "Related Files:")?;
        for (key, files) in related {
            writeln!(out, "{key}")?;
            for file in files {
                writeln!(out, "  {file}")?;
            }
        }
    }

    if !aggregate.dependencies.is_empty() {
        writeln!(out)?;
        writeln!(
            out,
            "Dependencies: {}",
            aggregate.dependencies.iter().join(", ")
        )?;
    }

    if report.has_warnings() {
        writeln!(out)?;
        writeln!(out, "{} warning(s) during scan:", report.warnings.len())?;
        for warning in &report.warnings {
            writeln!(out, "  {warning}")?;
        }
    }

    Ok(())
}
