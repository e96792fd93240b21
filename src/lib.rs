//! # class-lister
//!
//! Lists the Java classes packed in JAR files and finds duplicate class names.
//!
//! ## Architecture
//!
//! - **scan**: JAR discovery from files, directories and the class path
//! - **catalog**: Class entry enumeration inside one JAR
//! - **record**: Fixed-width class records and middle truncation
//! - **duplicates**: Duplicate class name reduction
//! - **bytecode**: `serialVersionUID` extraction from class files
//! - **pipeline**: Scan, filter, reduce and sort in a fixed order
//! - **config**: Run configuration from CLI flags and environment
//! - **error**: Error types shared by the library

pub mod bytecode;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod scan;
