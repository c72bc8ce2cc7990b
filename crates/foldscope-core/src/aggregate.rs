//! Scan aggregate and final report.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::config::ScanLimits;
use crate::error::ScanWarning;
use crate::record::FileRecord;
use crate::stage::Stage;

/// Number of entries kept in the largest/newest rankings.
pub const TOP_N: usize = 10;

/// Kind of project detected from marker files under the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProjectType {
    Python,
    Node,
    Web,
    Java,
    Docker,
    #[default]
    Unknown,
}

/// Running scan result.
///
/// Owns every [`FileRecord`]; groupings and rankings refer to records by
/// their position in discovery order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Aggregate {
    /// Number of files folded in.
    pub total_files: u64,
    /// Sum of folded file sizes.
    pub total_bytes: u64,
    /// Detected project type.
    pub project_type: ProjectType,
    /// Media type -> number of files, in first-seen order.
    pub file_types: IndexMap<CompactString, u64>,
    /// Union of dependencies extracted from all source files.
    pub dependencies: BTreeSet<String>,
    /// Representative path -> related paths, in discovery order.
    pub related_files: IndexMap<String, Vec<String>>,
    records: Vec<FileRecord>,
    content_groups: IndexMap<CompactString, Vec<usize>>,
    largest: Vec<usize>,
    newest: Vec<usize>,
}

impl Aggregate {
    /// Create an empty aggregate.
    pub fn new(project_type: ProjectType) -> Self {
        Self {
            project_type,
            ..Self::default()
        }
    }

    /// Fold a finished record into the totals, groups and rankings.
    pub fn record(&mut self, record: FileRecord) {
        let index = self.records.len();

        self.total_files += 1;
        self.total_bytes += record.size;
        *self.file_types.entry(record.media_type.clone()).or_insert(0) += 1;
        self.content_groups
            .entry(record.media_type.clone())
            .or_default()
            .push(index);
        self.dependencies
            .extend(record.analysis.dependencies().iter().cloned());
        self.records.push(record);

        let records = &self.records;
        rank(&mut self.largest, index, |i| records[i].size);
        rank(&mut self.newest, index, |i| records[i].modified());
    }

    /// All records in discovery order.
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Up to [`TOP_N`] records, largest first.
    pub fn largest_files(&self) -> impl Iterator<Item = &FileRecord> + '_ {
        self.largest.iter().map(|&i| &self.records[i])
    }

    /// Up to [`TOP_N`] records, most recently modified first.
    pub fn newest_files(&self) -> impl Iterator<Item = &FileRecord> + '_ {
        self.newest.iter().map(|&i| &self.records[i])
    }

    /// Records grouped by media type, in first-seen order.
    pub fn content_groups(&self) -> impl Iterator<Item = (&str, Vec<&FileRecord>)> + '_ {
        self.content_groups.iter().map(|(media_type, indices)| {
            (
                media_type.as_str(),
                indices.iter().map(|&i| &self.records[i]).collect(),
            )
        })
    }

    /// Records of one media type, in discovery order.
    pub fn content_group(&self, media_type: &str) -> Vec<&FileRecord> {
        self.content_groups
            .get(media_type)
            .map(|indices| indices.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    /// Related-file groups that actually have members.
    pub fn related_groups(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.related_files
            .iter()
            .filter(|(_, related)| !related.is_empty())
            .map(|(key, related)| (key.as_str(), related.as_slice()))
    }
}

/// Insert `index` into a descending ranking and keep the top [`TOP_N`].
///
/// The sort is stable, so equal keys keep discovery order.
fn rank<K: Ord>(ranking: &mut Vec<usize>, index: usize, key: impl Fn(usize) -> K) {
    ranking.push(index);
    ranking.sort_by(|&a, &b| key(b).cmp(&key(a)));
    ranking.truncate(TOP_N);
}

/// Complete scan result handed to presenters and history collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Root path that was scanned.
    pub root_path: PathBuf,
    /// When the scan started.
    pub started_at: SystemTime,
    /// When the scan reached its terminal stage.
    pub completed_at: SystemTime,
    /// Wall-clock duration of the scan.
    pub duration: Duration,
    /// Terminal stage.
    pub stage: Stage,
    /// Limits the scan ran under.
    pub limits: ScanLimits,
    /// Whether the root was detected as synced cloud storage.
    pub cloud_storage: bool,
    /// Warnings in the order they were raised.
    pub warnings: Vec<ScanWarning>,
    /// Aggregated results.
    pub aggregate: Aggregate,
}

impl ScanReport {
    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if the scan was cancelled before finishing.
    pub fn is_cancelled(&self) -> bool {
        self.stage == Stage::Cancelled
    }
}
