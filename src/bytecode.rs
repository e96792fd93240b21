//! `serialVersionUID` extraction by reading class files directly.
//!
//! Only the constant pool and the field table are decoded; methods and class
//! attributes are never touched.

use memmap2::Mmap;
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::ZipArchive;

use crate::catalog::open_archive;

pub const SERIAL_VERSION_UID: &str = "serialVersionUID";

const MAGIC: u32 = 0xCAFE_BABE;
const ACC_STATIC: u16 = 0x0008;
const ACC_FINAL: u16 = 0x0010;
const LONG_DESCRIPTOR: &str = "J";
const CONSTANT_VALUE_ATTRIBUTE: &str = "ConstantValue";

/// Value shown in the version column. Everything but `Value` names the
/// reason no value could be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum VersionField {
    Value(i64),
    NotSet,
    NotStatic,
    NotFinal,
    NotLong,
    IllegalAccess,
    NotStdClass,
    Exception,
}

impl fmt::Display for VersionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::NotSet => f.write_str("Not-Set"),
            Self::NotStatic => f.write_str("Not-Static-Modifier"),
            Self::NotFinal => f.write_str("Not-Final-Modifier"),
            Self::NotLong => f.write_str("Not-Long-Type"),
            Self::IllegalAccess => f.write_str("Illegal-Access"),
            Self::NotStdClass => f.write_str("Not-Std-Class"),
            Self::Exception => f.write_str("Exception"),
        }
    }
}

impl From<VersionField> for String {
    fn from(value: VersionField) -> Self {
        value.to_string()
    }
}

pub trait VersionFieldResolver {
    /// `archive` is the resolved path of the JAR, `entry_name` the
    /// archive-internal path of the class file.
    fn resolve(&self, archive: &Path, entry_name: &str) -> VersionField;
}

/// Reads the field from the class bytes stored in the JAR.
///
/// Archives are scanned one after another, so only the most recently opened
/// one is kept mapped.
#[derive(Default)]
pub struct BytecodeResolver {
    open: RefCell<Option<(PathBuf, ZipArchive<Cursor<Mmap>>)>>,
}

impl BytecodeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_entry(&self, archive: &Path, entry_name: &str) -> anyhow::Result<Vec<u8>> {
        let mut open = self.open.borrow_mut();
        if open.as_ref().is_some_and(|(path, _)| path != archive) {
            *open = None;
        }
        let zip = match &mut *open {
            Some((_, zip)) => zip,
            slot => &mut slot.insert((archive.to_path_buf(), open_archive(archive)?)).1,
        };

        let mut entry = zip.by_name(entry_name)?;
        let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl VersionFieldResolver for BytecodeResolver {
    fn resolve(&self, archive: &Path, entry_name: &str) -> VersionField {
        let bytes = match self.read_entry(archive, entry_name) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    "Unable to get SerialVersionUID of class {entry_name} in {}: {e:#}",
                    archive.display()
                );
                return VersionField::Exception;
            }
        };

        match read_serial_version_uid(&bytes) {
            Ok(field) => field,
            Err(ClassParseError::InvalidMagic) => VersionField::NotStdClass,
            Err(e) => {
                tracing::warn!("Unable to get SerialVersionUID of class {entry_name}: {e}");
                VersionField::Exception
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassParseError {
    #[error("unexpected end of class file")]
    UnexpectedEof,
    #[error("invalid class file magic header")]
    InvalidMagic,
    #[error("unsupported constant pool tag {tag}")]
    UnsupportedConstant { tag: u8 },
    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },
    #[error("{SERIAL_VERSION_UID} has no constant initializer")]
    MissingConstantValue,
}

/// Checks run in the order a reflective lookup would report them: type,
/// then `static`, then `final`.
pub fn read_serial_version_uid(bytes: &[u8]) -> Result<VersionField, ClassParseError> {
    let mut reader = ClassReader::new(bytes);
    reader.expect_magic()?;
    let _minor_version = reader.read_u2()?;
    let _major_version = reader.read_u2()?;
    let pool = ConstantPool::parse(&mut reader)?;

    let _access_flags = reader.read_u2()?;
    let _this_class = reader.read_u2()?;
    let _super_class = reader.read_u2()?;
    let interfaces_count = reader.read_u2()?;
    reader.skip(usize::from(interfaces_count) * 2)?;

    let fields_count = reader.read_u2()?;
    for _ in 0..fields_count {
        let access_flags = reader.read_u2()?;
        let name_index = reader.read_u2()?;
        let descriptor_index = reader.read_u2()?;
        let attributes_count = reader.read_u2()?;

        if pool.utf8(name_index)? != SERIAL_VERSION_UID {
            skip_attributes(&mut reader, attributes_count)?;
            continue;
        }

        if pool.utf8(descriptor_index)? != LONG_DESCRIPTOR {
            return Ok(VersionField::NotLong);
        }
        if access_flags & ACC_STATIC == 0 {
            return Ok(VersionField::NotStatic);
        }
        if access_flags & ACC_FINAL == 0 {
            return Ok(VersionField::NotFinal);
        }

        for _ in 0..attributes_count {
            let attribute_name_index = reader.read_u2()?;
            let length = reader.read_u4()? as usize;
            if pool.utf8(attribute_name_index)? == CONSTANT_VALUE_ATTRIBUTE {
                let value_index = reader.read_u2()?;
                return Ok(VersionField::Value(pool.long(value_index)?));
            }
            reader.skip(length)?;
        }
        return Err(ClassParseError::MissingConstantValue);
    }

    Ok(VersionField::NotSet)
}

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Long(i64),
    Other,
    Unusable,
}

struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    fn parse(reader: &mut ClassReader<'_>) -> Result<Self, ClassParseError> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable);

        while entries.len() < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let length = reader.read_u2()? as usize;
                    // Modified UTF-8; names compared here are plain ASCII.
                    Constant::Utf8(String::from_utf8_lossy(reader.read_slice(length)?).into_owned())
                }
                3 | 4 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                5 => {
                    let high = u64::from(reader.read_u4()?);
                    let low = u64::from(reader.read_u4()?);
                    entries.push(Constant::Long(((high << 32) | low) as i64));
                    Constant::Unusable
                }
                6 => {
                    reader.skip(8)?;
                    entries.push(Constant::Other);
                    Constant::Unusable
                }
                7 | 8 | 16 | 19 | 20 => {
                    reader.skip(2)?;
                    Constant::Other
                }
                9 | 10 | 11 | 12 | 17 | 18 => {
                    reader.skip(4)?;
                    Constant::Other
                }
                15 => {
                    reader.skip(3)?;
                    Constant::Other
                }
                other => return Err(ClassParseError::UnsupportedConstant { tag: other }),
            };
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&Constant, ClassParseError> {
        self.entries
            .get(index as usize)
            .ok_or(ClassParseError::InvalidConstantIndex { index })
    }

    fn utf8(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value.as_str()),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }

    fn long(&self, index: u16) -> Result<i64, ClassParseError> {
        match self.get(index)? {
            Constant::Long(value) => Ok(*value),
            _ => Err(ClassParseError::InvalidConstantIndex { index }),
        }
    }
}

struct ClassReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ClassReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn expect_magic(&mut self) -> Result<(), ClassParseError> {
        match self.read_u4() {
            Ok(MAGIC) => Ok(()),
            _ => Err(ClassParseError::InvalidMagic),
        }
    }

    fn read_u1(&mut self) -> Result<u8, ClassParseError> {
        Ok(self.read_slice(1)?[0])
    }

    fn read_u2(&mut self) -> Result<u16, ClassParseError> {
        let b = self.read_slice(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn read_u4(&mut self) -> Result<u32, ClassParseError> {
        let b = self.read_slice(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ClassParseError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(ClassParseError::UnexpectedEof)?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), ClassParseError> {
        self.read_slice(len).map(|_| ())
    }
}

fn skip_attributes(reader: &mut ClassReader<'_>, count: u16) -> Result<(), ClassParseError> {
    for _ in 0..count {
        reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        reader.skip(length)?;
    }
    Ok(())
}

/// Hand-assembled class files for tests across the crate.
#[cfg(test)]
pub(crate) mod fixtures {
    /// A class `Demo` with one field named `field_name`, typed by
    /// `descriptor`, and optionally initialised from a `CONSTANT_Long`.
    pub fn class_with_field(
        field_name: &str,
        descriptor: &str,
        access_flags: u16,
        constant: Option<i64>,
    ) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&52u16.to_be_bytes());

        // #1 Utf8 Demo, #2 Class #1, #3 Utf8 java/lang/Object, #4 Class #3,
        // #5 Utf8 name, #6 Utf8 descriptor, #7 Utf8 ConstantValue, #8/#9 Long.
        out.extend_from_slice(&10u16.to_be_bytes());
        push_utf8(&mut out, "Demo");
        out.push(7);
        out.extend_from_slice(&1u16.to_be_bytes());
        push_utf8(&mut out, "java/lang/Object");
        out.push(7);
        out.extend_from_slice(&3u16.to_be_bytes());
        push_utf8(&mut out, field_name);
        push_utf8(&mut out, descriptor);
        push_utf8(&mut out, "ConstantValue");
        out.push(5);
        out.extend_from_slice(&constant.unwrap_or(0).to_be_bytes());

        out.extend_from_slice(&0x0021u16.to_be_bytes());
        out.extend_from_slice(&2u16.to_be_bytes());
        out.extend_from_slice(&4u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());

        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&access_flags.to_be_bytes());
        out.extend_from_slice(&5u16.to_be_bytes());
        out.extend_from_slice(&6u16.to_be_bytes());
        if constant.is_some() {
            out.extend_from_slice(&1u16.to_be_bytes());
            out.extend_from_slice(&7u16.to_be_bytes());
            out.extend_from_slice(&2u32.to_be_bytes());
            out.extend_from_slice(&8u16.to_be_bytes());
        } else {
            out.extend_from_slice(&0u16.to_be_bytes());
        }

        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out
    }

    fn push_utf8(out: &mut Vec<u8>, s: &str) {
        out.push(1);
        out.extend_from_slice(&(s.len() as u16).to_be_bytes());
        out.extend_from_slice(s.as_bytes());
    }
}
