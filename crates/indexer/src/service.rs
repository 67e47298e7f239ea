use crate::config::SummariesConfig;
use crate::regenerator::Regenerator;
use crate::stats::RegenerationStats;
use crate::watcher::SourceChangeNotifier;
use script_summaries_store::{trim_summary, SummaryIndex, SummaryQuery};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One regenerator and the index it keeps fresh
pub struct SummariesService {
    regenerator: Regenerator,
    index: Arc<SummaryIndex>,
}

impl SummariesService {
    /// Wire a regenerator to a new index over its output directory and load whatever is
    /// already on disk.
    pub fn new(config: SummariesConfig, project_dir: impl AsRef<Path>) -> Self {
        let mut regenerator = Regenerator::new(config, project_dir);
        let index = Arc::new(SummaryIndex::new(regenerator.output_dir()));
        regenerator.subscribe(index.clone());
        index.reinitialize();

        Self { regenerator, index }
    }

    /// Rebuild the artifacts; the index reloads before this returns
    pub fn regenerate_and_reload(&self) -> RegenerationStats {
        self.regenerator.regenerate()
    }

    pub fn get_summary(&self, query: SummaryQuery<'_>) -> Option<String> {
        self.index.get_summary(query)
    }

    /// Summary cut to the configured tooltip length
    pub fn get_display_summary(&self, query: SummaryQuery<'_>) -> Option<String> {
        let max_lines = self.config().tooltip_line_length;
        self.get_summary(query)
            .map(|summary| trim_summary(&summary, max_lines))
    }

    pub fn index(&self) -> &Arc<SummaryIndex> {
        &self.index
    }

    pub fn regenerator(&self) -> &Regenerator {
        &self.regenerator
    }

    pub fn config(&self) -> &SummariesConfig {
        self.regenerator.config()
    }

    /// Regenerate on every source-change burst while `auto_generate_on_reload` is set
    pub fn watch_and_regenerate(self: &Arc<Self>, notifier: &mut dyn SourceChangeNotifier) {
        let service = Arc::clone(self);
        notifier.register(Arc::new(move |changed: &[PathBuf]| {
            if !service.config().auto_generate_on_reload {
                log::info!(
                    "{} source files changed; auto-generation is disabled",
                    changed.len()
                );
                return;
            }

            log::info!(
                "{} source files changed, regenerating summaries",
                changed.len()
            );
            service.regenerate_and_reload();
        }));
    }
}
