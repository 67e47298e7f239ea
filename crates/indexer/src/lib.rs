//! # Script Summaries Indexer
//!
//! Regenerates the summary artifacts of a project and keeps an index over them.
//!
//! ## Pipeline
//!
//! ```text
//! script-summaries.toml
//!     │
//!     ├──> File Scanner (scan directories only)
//!     │      └─> .cs files
//!     │
//!     ├──> Mapping Builder (tree-sitter, .asmdef owners)
//!     │      └─> Mapping records
//!     │
//!     ├──> Artifact Encoder
//!     │      └─> <Owner>.doc + <Owner>.lookup
//!     │
//!     └──> Listeners (SummaryIndex reload)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use script_summaries_indexer::{SummariesConfig, SummariesService};
//! use script_summaries_store::SummaryQuery;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = SummariesConfig::for_project("/path/to/project")?;
//!     let service = SummariesService::new(config, "/path/to/project");
//!     let stats = service.regenerate_and_reload();
//!
//!     println!("Generated {} summaries for {} owners", stats.records, stats.owners);
//!     println!("{:?}", service.get_summary(SummaryQuery::Path("Assets/Scripts/Foo.cs")));
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod regenerator;
mod scanner;
mod service;
mod stats;
mod watcher;

pub use config::{ResolvedPaths, SummariesConfig, CONFIG_FILE_NAME};
pub use error::{IndexerError, Result};
pub use regenerator::Regenerator;
pub use scanner::{FileScanner, ScanOptions};
pub use service::SummariesService;
pub use stats::RegenerationStats;
pub use watcher::{
    is_relevant, ChangeCallback, SourceChangeNotifier, SourceWatcher, SourceWatcherConfig,
};
