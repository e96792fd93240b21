//! Scan → filter → duplicate reduction → sort.
//!
//! The record collection is passed by value from one stage to the next.
//! The name filter runs against the raw entry path while scanning, before
//! the display name is derived, so truncation can never hide a match.

use regex::Regex;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Instant;

use crate::bytecode::VersionFieldResolver;
use crate::catalog::open_class_entries;
use crate::duplicates::reduce_to_duplicates;
use crate::error::Result;
use crate::record::{ClassRecord, RecordFormatter};
use crate::scan::{ArchiveFile, resolve_archives};

#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub paths: Vec<PathBuf>,
    /// Consulted only when present; `None` leaves the search path out.
    pub search_path: Option<OsString>,
    pub filter: Option<Regex>,
    pub duplicates_only: bool,
    pub sort: bool,
    pub absolute_paths: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    NoInput,
    NoMatches,
    NoDuplicates,
}

impl EmptyReason {
    pub fn notice(self) -> &'static str {
        match self {
            Self::NoInput => "No JAR file found to be processed",
            Self::NoMatches => "No matching Java classes found",
            Self::NoDuplicates => "No duplicate Java class names found",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Records(Vec<ClassRecord>),
    Empty(EmptyReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub outcome: Outcome,
    pub archives: usize,
    pub scanned: usize,
    pub filtered: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Default)]
pub struct ScanOutput {
    pub records: Vec<ClassRecord>,
    pub filtered: usize,
}

pub fn run(request: &ListRequest, resolver: Option<&dyn VersionFieldResolver>) -> Result<Report> {
    let start = Instant::now();
    let archives = resolve_archives(&request.paths, request.search_path.as_deref())?;

    let finish = |outcome: Outcome, scanned: usize, filtered: usize| Report {
        outcome,
        archives: archives.len(),
        scanned,
        filtered,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    if archives.is_empty() {
        return Ok(finish(Outcome::Empty(EmptyReason::NoInput), 0, 0));
    }

    let formatter = RecordFormatter::new(request.absolute_paths, resolver);
    let ScanOutput { records, filtered } = scan(&archives, request.filter.as_ref(), &formatter)?;
    let scanned = records.len();
    tracing::debug!("Found {scanned} Java classes - Filtered {filtered} classes");

    if records.is_empty() {
        return Ok(finish(Outcome::Empty(EmptyReason::NoMatches), scanned, filtered));
    }

    let records = if request.duplicates_only {
        let reduced = reduce_to_duplicates(records);
        if reduced.is_empty() {
            return Ok(finish(Outcome::Empty(EmptyReason::NoDuplicates), scanned, filtered));
        }
        tracing::debug!("{} duplicate Java class names found", reduced.len());
        reduced
    } else {
        records
    };

    let records = if request.sort {
        tracing::debug!("Sorting Java class names");
        sort_by_line(records)
    } else {
        records
    };

    Ok(finish(Outcome::Records(records), scanned, filtered))
}

/// Reads every archive in turn. The first archive that cannot be read ends
/// the scan.
pub fn scan(
    archives: &[ArchiveFile],
    filter: Option<&Regex>,
    formatter: &RecordFormatter<'_>,
) -> Result<ScanOutput> {
    let mut out = ScanOutput::default();

    for archive in archives {
        tracing::debug!("Reading Java classes from {}", archive.path().display());
        let mut count = 0usize;

        for entry in open_class_entries(archive.path())? {
            let entry = entry?;
            if filter.is_some_and(|re| !re.is_match(&entry.name)) {
                out.filtered += 1;
                continue;
            }
            out.records.push(formatter.format(&entry, archive)?);
            count += 1;
        }

        tracing::debug!(
            "{count} Java classes read from file {}",
            archive.path().display()
        );
    }

    Ok(out)
}

/// Whole-line ordering; the name column leads, so this groups by class.
pub fn sort_by_line(records: Vec<ClassRecord>) -> Vec<ClassRecord> {
    let mut keyed: Vec<(String, ClassRecord)> =
        records.into_iter().map(|r| (r.line(), r)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, r)| r).collect()
}
