use crate::config::{ResolvedPaths, SummariesConfig};
use crate::scanner::{FileScanner, ScanOptions};
use crate::stats::RegenerationStats;
use script_summaries_extractor::{MappingBuilder, MappingRecord, OwnerResolver, KEY_SEPARATOR};
use script_summaries_store::{clear_artifacts, write_artifacts, ArtifactListener, ArtifactSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Rebuilds the artifact directory from the sources and tells listeners about it
pub struct Regenerator {
    config: SummariesConfig,
    paths: ResolvedPaths,
    listeners: Vec<Arc<dyn ArtifactListener>>,
    run_lock: Mutex<()>,
}

impl Regenerator {
    pub fn new(config: SummariesConfig, project_dir: impl AsRef<Path>) -> Self {
        let paths = config.resolve(project_dir);
        Self {
            config,
            paths,
            listeners: Vec::new(),
            run_lock: Mutex::new(()),
        }
    }

    /// Register a consumer that is signalled after every run
    pub fn subscribe(&mut self, listener: Arc<dyn ArtifactListener>) {
        self.listeners.push(listener);
    }

    pub fn config(&self) -> &SummariesConfig {
        &self.config
    }

    pub fn paths(&self) -> &ResolvedPaths {
        &self.paths
    }

    pub fn output_dir(&self) -> &Path {
        &self.paths.output_dir
    }

    /// Delete the old artifacts, rebuild them from the configured scan directories and
    /// signal the listeners.
    ///
    /// Runs are serialized. Nothing here is fatal: per-file and per-owner failures are
    /// logged and counted in the returned stats.
    pub fn regenerate(&self) -> RegenerationStats {
        let _guard = self
            .run_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let start = Instant::now();
        let mut stats = RegenerationStats::new();
        let output_dir = &self.paths.output_dir;

        log::info!(
            "Regenerating script summaries from {} into {}",
            self.paths.scan_root.display(),
            output_dir.display()
        );

        match clear_artifacts(output_dir) {
            Ok(removed) => stats.removed_artifacts = removed,
            Err(e) => {
                log::warn!("Failed to clear {}: {e}", output_dir.display());
                stats.add_error(format!("clear {}: {e}", output_dir.display()));
            }
        }

        let directories = self.paths.scan_directories(&self.config.scan_directories);
        if directories.is_empty() {
            log::warn!("No scan directories defined, no summaries will be generated");
            return self.finish(stats, start, true);
        }

        let files = FileScanner::new(&self.paths.scan_root)
            .with_options(ScanOptions {
                respect_gitignore: self.config.respect_gitignore,
            })
            .scan_filtered(&directories);
        stats.files_scanned = files.len();

        let records = match self.collect_records(&files, &mut stats) {
            Some(records) => records,
            None => return self.finish(stats, start, true),
        };
        stats.records = records.len();

        let artifacts = match ArtifactSet::encode(&records) {
            Ok(artifacts) => artifacts,
            Err(e) => {
                log::error!("Failed to encode artifacts: {e}");
                stats.add_error(format!("encode: {e}"));
                return self.finish(stats, start, true);
            }
        };
        stats.owners = artifacts.documentation.len();

        match write_artifacts(output_dir, &artifacts) {
            Ok(failed) => {
                stats.write_failures = failed.len();
                for owner in failed {
                    stats.add_error(format!("write artifacts for {owner}"));
                }
            }
            Err(e) => {
                log::error!("Failed to prepare {}: {e}", output_dir.display());
                stats.write_failures = stats.owners;
                stats.add_error(format!("create {}: {e}", output_dir.display()));
            }
        }

        self.finish(stats, start, false)
    }

    fn collect_records(
        &self,
        files: &[PathBuf],
        stats: &mut RegenerationStats,
    ) -> Option<Vec<MappingRecord>> {
        let mut builder = match MappingBuilder::new(&self.paths.scan_root) {
            Ok(builder) => builder
                .with_root_label(self.paths.root_label.clone())
                .with_owner_resolver(OwnerResolver::with_boundary(&self.paths.project_dir)),
            Err(e) => {
                log::error!("Failed to set up the C# parser: {e}");
                stats.add_error(format!("parser: {e}"));
                return None;
            }
        };

        let mut records = Vec::new();
        for path in files {
            match builder.try_build(path) {
                Ok(Some(record)) => {
                    warn_on_ambiguous_record(&record);
                    records.push(record);
                }
                Ok(None) => stats.skipped_files += 1,
                Err(e) => {
                    log::warn!("Error processing {}: {e}", path.display());
                    stats.skipped_files += 1;
                    stats.add_error(format!("{}: {e}", path.display()));
                }
            }
        }
        Some(records)
    }

    fn finish(
        &self,
        mut stats: RegenerationStats,
        start: Instant,
        aborted: bool,
    ) -> RegenerationStats {
        stats.aborted = aborted;
        stats.time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        for listener in &self.listeners {
            listener.artifacts_changed(&self.paths.output_dir);
        }

        if aborted {
            log::warn!("Summary regeneration aborted: {stats:?}");
        } else {
            log::info!(
                "Script summaries generated: {} records for {} owners from {} files in {} ms",
                stats.records,
                stats.owners,
                stats.files_scanned,
                stats.time_ms
            );
        }
        stats
    }
}

/// Lookup lines are not escaped, so these characters make the record unreachable by path
fn warn_on_ambiguous_record(record: &MappingRecord) {
    let bad_path = record.relative_path.contains(['=', KEY_SEPARATOR]);
    let bad_key = record.type_key.contains(['=', KEY_SEPARATOR]);
    if bad_path || bad_key {
        log::warn!(
            "{} contains '=' or '{KEY_SEPARATOR}'; its lookup line will not load",
            record.relative_path
        );
    }
}
