//! # Script Summaries Store
//!
//! Persists [`MappingRecord`](script_summaries_extractor::MappingRecord)s as per-assembly
//! artifact files and serves lookups from them.
//!
//! ## Layout
//!
//! ```text
//! <output_dir>/
//!     <Owner>.doc      JSON: { schema_version, members: [{ name, summary }] }
//!     <Owner>.lookup   relativePath=Owner;T:Namespace.Class  (one per line)
//! ```
//!
//! The [`SummaryIndex`] joins the two files per owner into a by-path map and a
//! by-`Owner;TypeKey` map and publishes both as one snapshot.
//!
//! ## Example
//!
//! ```no_run
//! use script_summaries_store::SummaryIndex;
//!
//! let index = SummaryIndex::new("Library/ScriptSummaries");
//! index.reinitialize();
//! if let Some(summary) = index.get_by_path("Assets/Scripts/Foo.cs") {
//!     println!("{summary}");
//! }
//! ```

mod artifact;
mod display;
mod error;
mod index;
mod loader;

pub use artifact::{
    clear_artifacts, doc_file_name, encode_documentation, encode_lookups, list_artifacts,
    lookup_file_name, owner_from_path, write_artifacts, ArtifactSet, DocMember,
    DocumentationFile, DOCUMENTATION_SCHEMA_VERSION, DOC_EXTENSION, LOOKUP_EXTENSION,
};
pub use display::trim_summary;
pub use error::{Result, StoreError};
pub use index::{
    key_for_type, ArtifactListener, DeclaredType, IndexPhase, SummaryIndex, SummaryQuery,
    SummarySnapshot, TypeMetadata,
};
pub use loader::{
    load_documentation, load_lookups, parse_documentation, parse_lookup_line, parse_lookups,
    LookupEntry, LookupLineError,
};
