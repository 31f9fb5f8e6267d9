//! rosids - snapshot-style incremental backups using hardlinks.
//!
//! Usage:
//!   rosids [OPTIONS] SOURCE LINK_SOURCE DESTINATION
//!
//! Files that are unchanged since LINK_SOURCE (same size and modification
//! time) are hardlinked into DESTINATION; everything else is copied from
//! SOURCE.

mod settings;

use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use rosids_core::{
    ADDABLE_FILE_ATTRIBUTES, AttributeMask, BackupConfig, ConfigError, EXCLUDABLE_FILE_ATTRIBUTES,
    Encoding, RunSummary,
};
use rosids_walk::Walker;
use tracing::{info, warn};

use settings::FileSettings;

/// Exit code for configuration errors, the same one clap uses for usage errors.
const CONFIG_ERROR_EXIT: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "rosids",
    version,
    about = "Snapshot-style incremental backups using hardlinks",
    long_about = "rosids copies SOURCE to DESTINATION, hardlinking every file that is \
                  unchanged since the previous backup LINK_SOURCE instead of copying it.\n\n\
                  The log stream (stdout) lists linked and copied files; failures are \
                  listed on the error stream (stderr) and do not stop the backup."
)]
struct Cli {
    /// Directory to back up
    source: PathBuf,

    /// Previous backup to link unchanged files against
    link_source: PathBuf,

    /// Where to write the new backup (must be missing or empty)
    destination: PathBuf,

    /// Only list what would be done, change nothing
    #[arg(short = 'l', long)]
    list_only: bool,

    /// Add attributes to every copied file (letters from RASHNT)
    #[arg(long, visible_alias = "afa", value_name = "ATTRS")]
    add_file_attr: Option<String>,

    /// Exclude files having any of these attributes (letters from RASHCNETO)
    #[arg(long, visible_alias = "xfa", value_name = "ATTRS")]
    exclude_file_by_attr: Option<String>,

    /// Exclude paths matching this regular expression (repeatable)
    #[arg(long, visible_alias = "xr", value_name = "PATTERN")]
    exclude_by_regexp: Vec<String>,

    /// Exclude directory and file junctions
    #[arg(long, visible_alias = "xj")]
    exclude_junctions: bool,

    /// Exclude directory junctions
    #[arg(long, visible_alias = "xjd")]
    exclude_dir_junctions: bool,

    /// Exclude file junctions
    #[arg(long, visible_alias = "xjf")]
    exclude_file_junctions: bool,

    /// Also log directories, skipped entries and errors
    #[arg(long)]
    verbose: bool,

    /// Write the log stream as UTF-8
    #[arg(long)]
    utf8_log: bool,

    /// Write the error stream as UTF-8
    #[arg(long)]
    utf8_error: bool,

    /// Read defaults from this TOML file instead of the user config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging();

    let config = match FileSettings::load(cli.config.as_deref())
        .and_then(|file| configure(&cli, file))
    {
        Ok(config) => config,
        Err(err) => return Ok(config_error(&err)),
    };

    let stdout = io::stdout();
    let mut walker = match Walker::from_config(&config, BufWriter::new(stdout.lock()), io::stderr())
    {
        Ok(walker) => walker,
        Err(err) => return Ok(config_error(&err)),
    };

    let summary = walker
        .run(&config.source, &config.link_source, &config.destination)
        .wrap_err("Backup failed")?;
    drop(walker);

    report(&summary);
    Ok(ExitCode::SUCCESS)
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn config_error(err: &ConfigError) -> ExitCode {
    eprintln!("rosids: {err}");
    ExitCode::from(CONFIG_ERROR_EXIT)
}

/// Merge the command line over the file settings and check the result.
///
/// Switches are on if either source turns them on. Attribute strings from the
/// command line replace the file's; patterns are appended to the file's.
fn configure(cli: &Cli, file: FileSettings) -> Result<BackupConfig, ConfigError> {
    let add_file_attr = parse_attrs(
        "--add-file-attr",
        cli.add_file_attr.as_deref().or(file.add_file_attr.as_deref()),
        ADDABLE_FILE_ATTRIBUTES,
    )?;
    let exclude_file_by_attr = parse_attrs(
        "--exclude-file-by-attr",
        cli.exclude_file_by_attr
            .as_deref()
            .or(file.exclude_file_by_attr.as_deref()),
        EXCLUDABLE_FILE_ATTRIBUTES,
    )?;

    let exclude_junctions = cli.exclude_junctions || file.exclude_junctions;
    let mut exclude_patterns = file.exclude_by_regexp;
    exclude_patterns.extend(cli.exclude_by_regexp.iter().cloned());

    let config = BackupConfig::builder()
        .source(absolute(&cli.source)?)
        .link_source(absolute(&cli.link_source)?)
        .destination(absolute(&cli.destination)?)
        .list_only(cli.list_only || file.list_only)
        .add_file_attr(add_file_attr)
        .exclude_file_by_attr(exclude_file_by_attr)
        .exclude_dir_junctions(
            exclude_junctions || cli.exclude_dir_junctions || file.exclude_dir_junctions,
        )
        .exclude_file_junctions(
            exclude_junctions || cli.exclude_file_junctions || file.exclude_file_junctions,
        )
        .exclude_patterns(exclude_patterns)
        .verbose(cli.verbose || file.verbose)
        .log_encoding(encoding(cli.utf8_log || file.utf8_log))
        .error_encoding(encoding(cli.utf8_error || file.utf8_error))
        .build()
        .map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })?;

    config.check_paths()?;
    Ok(config)
}

fn parse_attrs(
    option: &str,
    value: Option<&str>,
    allowed: &str,
) -> Result<AttributeMask, ConfigError> {
    let Some(value) = value else {
        return Ok(AttributeMask::EMPTY);
    };
    AttributeMask::parse(value, allowed).map_err(|e| ConfigError::Invalid {
        message: format!("{option}: {e}"),
    })
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    rosids_core::path::absolute(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn encoding(utf8: bool) -> Encoding {
    if utf8 { Encoding::Utf8 } else { Encoding::Native }
}

/// Report run totals as diagnostics.
fn report(summary: &RunSummary) {
    info!(
        dirs = summary.dirs,
        files = summary.files(),
        skipped = summary.skipped,
        "linked {} files ({}), copied {} files ({})",
        summary.linked,
        format_size(summary.bytes_linked),
        summary.copied,
        format_size(summary.bytes_copied),
    );
    if !summary.is_clean() {
        warn!(errors = summary.errors, "backup finished with errors");
    }
}

fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
