//! Depth-first snapshot walker.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use rosids_core::{BackupConfig, BackupError, ConfigError, OpError, Operation, Outcome, RunSummary};
use rosids_ops::{Commander, commander_for};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::comparator::Comparator;
use crate::filter::Filter;
use crate::logger::{LogOptions, Logger};

/// Walks a source tree in step with the previous snapshot and builds the new
/// snapshot through a [`Commander`].
///
/// Failures on a single entry are reported and the walk moves on to the next
/// sibling. Only problems with the roots or the output streams end a run.
pub struct Walker<W: Write, E: Write> {
    filter: Filter,
    comparator: Comparator,
    commander: Box<dyn Commander>,
    logger: Logger<W, E>,
    summary: RunSummary,
}

impl<W: Write, E: Write> Walker<W, E> {
    /// Create a walker from fully built collaborators.
    pub fn new(
        filter: Filter,
        comparator: Comparator,
        commander: Box<dyn Commander>,
        logger: Logger<W, E>,
    ) -> Self {
        Self {
            filter,
            comparator,
            commander,
            logger,
            summary: RunSummary::new(),
        }
    }

    /// Create the walker a configuration describes, writing its report to
    /// `out` and `err`.
    pub fn from_config(config: &BackupConfig, out: W, err: E) -> Result<Self, ConfigError> {
        Ok(Self::new(
            Filter::new(config)?,
            Comparator::new(),
            commander_for(config),
            Logger::new(out, err, LogOptions::from(config)),
        ))
    }

    /// Back up `source` into `destination`, linking files that are unchanged
    /// since `link_source`.
    ///
    /// An excluded `source` is reported as skipped and then returned as
    /// [`BackupError::SourceExcluded`] without creating `destination`.
    pub fn run(
        &mut self,
        source: &Path,
        link_source: &Path,
        destination: &Path,
    ) -> Result<RunSummary, BackupError> {
        self.summary = RunSummary::new();

        if self.filter.excludes_dir(source) {
            self.report(source, Outcome::Skipped)?;
            self.logger.flush()?;
            return Err(BackupError::SourceExcluded {
                path: source.to_path_buf(),
            });
        }

        if !destination.is_dir() {
            self.commander
                .make_dirs(destination)
                .map_err(|err| BackupError::CreateDestination {
                    path: err.path,
                    source: err.source,
                })?;
        }
        self.walk(source, link_source, destination)?;

        self.logger.flush()?;
        Ok(std::mem::take(&mut self.summary))
    }

    fn walk(
        &mut self,
        source: &Path,
        link_source: &Path,
        destination: &Path,
    ) -> Result<(), BackupError> {
        self.report(source, Outcome::Directory)?;

        let mut entries = WalkDir::new(source)
            .min_depth(1)
            .follow_links(true)
            .into_iter();

        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(source).to_path_buf();
                    if err.depth() == 0 {
                        return Err(BackupError::ReadSource {
                            path,
                            source: io::Error::from(err),
                        });
                    }
                    let outcome = self.visit_unlisted(&path, err);
                    self.report(&path, outcome)?;
                    continue;
                }
            };

            // Entries always live under the root they were listed from.
            let Ok(relative) = entry.path().strip_prefix(source) else {
                continue;
            };
            let lnk = link_source.join(relative);
            let dst = destination.join(relative);

            let outcome = if entry.file_type().is_dir() {
                let outcome = self.visit_dir(entry.path(), &dst);
                if !matches!(outcome, Outcome::Directory) {
                    entries.skip_current_dir();
                }
                outcome
            } else {
                self.visit_file(&entry, &lnk, &dst)
                    .unwrap_or_else(Outcome::errored)
            };

            self.report(entry.path(), outcome)?;
        }

        Ok(())
    }

    fn visit_dir(&self, src: &Path, dst: &Path) -> Outcome {
        if self.filter.excludes_dir(src) {
            return Outcome::Skipped;
        }
        match self.commander.copy_dir(src, dst) {
            Ok(()) => Outcome::Directory,
            Err(err) => Outcome::errored(err),
        }
    }

    fn visit_file(&self, entry: &DirEntry, lnk: &Path, dst: &Path) -> Result<Outcome, OpError> {
        let src = entry.path();
        if self.filter.excludes_file(src) {
            return Ok(Outcome::Skipped);
        }

        let metadata = entry
            .metadata()
            .map_err(|err| OpError::new(Operation::ReadMetadata, src, io::Error::from(err)))?;
        let size = metadata.len();

        if self.comparator.is_same_file(src, lnk) {
            debug!(path = %src.display(), "unchanged, linking");
            self.commander.link_file(lnk, dst)?;
            return Ok(Outcome::Linked { size });
        }

        // Pipes and devices would block or make no sense to copy.
        if !metadata.is_file() {
            return Err(OpError::new(
                Operation::Copy,
                src,
                io::Error::new(io::ErrorKind::Unsupported, "not a regular file"),
            ));
        }

        debug!(path = %src.display(), "changed, copying");
        self.commander.copy_file(src, dst)?;
        Ok(Outcome::Copied { size })
    }

    /// Outcome for an entry the listing could not hand out: a link that
    /// loops back to an ancestor, a link that does not resolve, or a
    /// directory that cannot be read.
    ///
    /// Exclusion rules still apply to links, so an excluded link is skipped
    /// rather than reported.
    fn visit_unlisted(&self, path: &Path, err: walkdir::Error) -> Outcome {
        if let Some(ancestor) = err.loop_ancestor() {
            if self.filter.excludes_dir(path) {
                return Outcome::Skipped;
            }
            return Outcome::errored(format!(
                "filesystem loop back to {}",
                ancestor.display()
            ));
        }

        let is_link = fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink());
        if is_link && self.filter.excludes_file(path) {
            return Outcome::Skipped;
        }

        let op = if is_link {
            Operation::ReadMetadata
        } else {
            Operation::ReadDirectory
        };
        let source = err
            .into_io_error()
            .unwrap_or_else(|| io::Error::other("listing failed"));
        Outcome::errored(OpError::new(op, path, source))
    }

    fn report(&mut self, path: &Path, outcome: Outcome) -> Result<(), BackupError> {
        if outcome.is_error() {
            debug!(path = %path.display(), ?outcome, "entry failed");
        }
        self.summary.record(&outcome);
        self.logger.record(path, &outcome)
    }
}
