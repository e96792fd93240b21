use clap::{Parser, ValueEnum};
use regex::Regex;
use std::path::PathBuf;

use crate::config::compile_filter;

#[derive(Debug, Clone, Parser)]
#[command(name = "class-lister", version)]
#[command(about = "List Java class names or find duplicates in JAR files")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// One or more JAR files or directories
    #[arg(value_name = "FILE")]
    pub paths: Vec<PathBuf>,

    /// Include JAR files found in the class path
    #[arg(short = 'c', long)]
    pub classpath_jars: bool,

    /// Class path to search instead of $CLASSPATH
    #[arg(long, value_name = "PATHS", requires = "classpath_jars")]
    pub classpath: Option<String>,

    /// List only duplicate class names
    #[arg(short = 'd', long)]
    pub duplicates: bool,

    /// Sort output by the Java class name
    #[arg(short = 's', long)]
    pub sort: bool,

    /// Show absolute path of JAR files
    #[arg(short = 'a', long)]
    pub absolute: bool,

    /// RegEx class name filter, e.g. -f"ch/k43/util"
    #[arg(short = 'f', long, value_name = "REGEX", value_parser = compile_filter)]
    pub filter: Option<Regex>,

    /// Show serialVersionUID for each class
    #[arg(short = 'u', long)]
    pub serial_version_uid: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the report to FILE instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Log scanning details to stderr
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
