use chrono::{NaiveDate, NaiveDateTime};
use memmap2::Mmap;
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use crate::error::{ListError, Result};

pub const CLASS_SUFFIX: &str = ".class";

/// One compiled class inside a JAR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntry {
    /// Archive-internal path, `/`-separated.
    pub name: String,
    pub size: u64,
    /// `None` when the archive stores no usable timestamp.
    pub modified: Option<NaiveDateTime>,
}

pub fn is_class_entry_name(name: &str) -> bool {
    name.len() >= CLASS_SUFFIX.len()
        && name.is_char_boundary(name.len() - CLASS_SUFFIX.len())
        && name[name.len() - CLASS_SUFFIX.len()..].eq_ignore_ascii_case(CLASS_SUFFIX)
}

pub(crate) fn open_archive(jar_path: &Path) -> Result<ZipArchive<Cursor<Mmap>>> {
    let file = File::open(jar_path).map_err(|e| ListError::unreadable(jar_path, e))?;
    // SAFETY: The file is opened read-only and the mapping is only read through the
    // archive, which owns it and is dropped at the end of the scan.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| ListError::unreadable(jar_path, e))?;
    ZipArchive::new(Cursor::new(mmap)).map_err(|e| ListError::unreadable(jar_path, e))
}

/// Class entries of one archive in directory order. The archive handle is
/// owned by the iterator and released when it is dropped.
pub struct ClassEntries {
    path: PathBuf,
    archive: ZipArchive<Cursor<Mmap>>,
    next: usize,
}

pub fn open_class_entries(jar_path: &Path) -> Result<ClassEntries> {
    let archive = open_archive(jar_path)?;
    Ok(ClassEntries {
        path: jar_path.to_path_buf(),
        archive,
        next: 0,
    })
}

impl ClassEntries {
    /// Number of entries in the archive, class files or not.
    pub fn archive_len(&self) -> usize {
        self.archive.len()
    }
}

impl Iterator for ClassEntries {
    type Item = Result<ClassEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.archive.len();
        while self.next < total {
            let index = self.next;
            self.next += 1;

            let entry = match self.archive.by_index_raw(index) {
                Ok(entry) => entry,
                Err(e) => {
                    self.next = total;
                    return Some(Err(ListError::unreadable(&self.path, e)));
                }
            };

            if entry.is_dir() || !is_class_entry_name(entry.name()) {
                tracing::debug!("Skipping JAR entry {}", entry.name());
                continue;
            }

            return Some(Ok(ClassEntry {
                name: entry.name().to_string(),
                size: entry.size(),
                modified: dos_to_naive(entry.last_modified()),
            }));
        }
        None
    }
}

/// Fields out of range (a zeroed DOS date, for instance) yield `None`.
fn dos_to_naive(dt: zip::DateTime) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(i32::from(dt.year()), u32::from(dt.month()), u32::from(dt.day()))?
        .and_hms_opt(
            u32::from(dt.hour()),
            u32::from(dt.minute()),
            u32::from(dt.second()),
        )
}
