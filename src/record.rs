//! Display-ready class records.
//!
//! A [`ClassRecord`] carries structured fields through the pipeline and is
//! rendered to its fixed-width line only when compared or emitted:
//!
//! ```text
//! <name padded to 70> <size right-aligned to 8> <timestamp> [<version right-aligned to 20>] <archive>
//! ```

use chrono::{Local, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::bytecode::{VersionField, VersionFieldResolver};
use crate::catalog::{CLASS_SUFFIX, ClassEntry};
use crate::error::Result;
use crate::scan::ArchiveFile;

pub const MAX_CLASS_NAME_WIDTH: usize = 70;
pub const SIZE_WIDTH: usize = 8;
pub const VERSION_WIDTH: usize = 20;
pub const TRUNCATION_MARKER: &str = "...";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassRecord {
    /// Full dotted class name; the duplicate key.
    pub name: String,
    pub display_name: String,
    pub size: u64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub modified: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionField>,
    pub archive: String,
}

impl ClassRecord {
    pub fn line(&self) -> String {
        let mut line = format!(
            "{:<name_w$} {:>size_w$} {}",
            self.display_name,
            self.size,
            self.timestamp(),
            name_w = MAX_CLASS_NAME_WIDTH,
            size_w = SIZE_WIDTH,
        );
        if let Some(version) = &self.version {
            line.push_str(&format!(" {:>width$}", version.to_string(), width = VERSION_WIDTH));
        }
        line.push(' ');
        line.push_str(&self.archive);
        line
    }

    pub fn timestamp(&self) -> String {
        self.modified.format(TIMESTAMP_FORMAT).to_string()
    }
}

fn serialize_timestamp<S: Serializer>(
    value: &NaiveDateTime,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.collect_str(&value.format(TIMESTAMP_FORMAT))
}

/// `com/x/Foo.class` becomes `com.x.Foo`.
pub fn class_name_from_entry(entry_name: &str) -> String {
    let stem = if crate::catalog::is_class_entry_name(entry_name) {
        &entry_name[..entry_name.len() - CLASS_SUFFIX.len()]
    } else {
        entry_name
    };
    stem.replace('/', ".")
}

/// Shortens `name` to exactly `max` characters by replacing its middle with
/// [`TRUNCATION_MARKER`]. Names that already fit are returned unchanged.
pub fn truncate_middle(name: &str, max: usize) -> String {
    let len = name.chars().count();
    if len <= max {
        return name.to_string();
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    if max <= marker_len {
        return name.chars().take(max).collect();
    }

    let keep = max - marker_len;
    let prefix = keep / 2;
    let suffix = keep - prefix;

    let mut out: String = name.chars().take(prefix).collect();
    out.push_str(TRUNCATION_MARKER);
    out.extend(name.chars().skip(len - suffix));
    out
}

pub struct RecordFormatter<'a> {
    absolute_paths: bool,
    resolver: Option<&'a dyn VersionFieldResolver>,
}

impl<'a> RecordFormatter<'a> {
    pub fn new(absolute_paths: bool, resolver: Option<&'a dyn VersionFieldResolver>) -> Self {
        Self {
            absolute_paths,
            resolver,
        }
    }

    pub fn format(&self, entry: &ClassEntry, source: &ArchiveFile) -> Result<ClassRecord> {
        let name = class_name_from_entry(&entry.name);
        let display_name = truncate_middle(&name, MAX_CLASS_NAME_WIDTH);
        let modified = entry
            .modified
            .unwrap_or_else(|| Local::now().naive_local());

        let version = match self.resolver {
            Some(resolver) => Some(resolver.resolve(source.real_path()?, &entry.name)),
            None => None,
        };

        let archive = if self.absolute_paths {
            source.real_path()?.display().to_string()
        } else {
            source.path().display().to_string()
        };

        Ok(ClassRecord {
            name,
            display_name,
            size: entry.size,
            modified,
            version,
            archive,
        })
    }
}
