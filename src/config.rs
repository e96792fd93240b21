use regex::Regex;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::cli::{Cli, OutputFormat};
use crate::error::{ListError, Result};
use crate::pipeline::ListRequest;

pub const CLASSPATH_ENV: &str = "CLASSPATH";
pub const LOG_ENV: &str = "CLASS_LISTER_LOG";

/// Everything a run needs, resolved once from the command line and the
/// environment.
#[derive(Debug, Clone)]
pub struct ListConfig {
    pub request: ListRequest,
    pub serial_version_uid: bool,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub verbose: bool,
}

impl ListConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        let search_path = if cli.classpath_jars {
            Some(resolve_search_path(cli))
        } else {
            None
        };

        Self {
            request: ListRequest {
                paths: cli.paths.clone(),
                search_path,
                filter: cli.filter.clone(),
                duplicates_only: cli.duplicates,
                sort: cli.sort,
                absolute_paths: cli.absolute,
            },
            serial_version_uid: cli.serial_version_uid,
            format: cli.format,
            output: cli.output.clone(),
            verbose: cli.verbose,
        }
    }

    /// Default log directive when `CLASS_LISTER_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }
}

pub fn resolve_search_path(cli: &Cli) -> OsString {
    if let Some(p) = cli.classpath.clone() {
        return OsString::from(p);
    }
    env::var_os(CLASSPATH_ENV).unwrap_or_default()
}

/// Value parser for `-f`, so a bad pattern is rejected as a usage error.
pub fn compile_filter(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|reason| ListError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    })
}
