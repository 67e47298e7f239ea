//! # Script Summaries Extractor
//!
//! Finds the summary documentation of the first documented class in a C# source file and
//! turns it into a [`MappingRecord`] keyed by assembly and documentation ID.
//!
//! ## Pipeline
//!
//! ```text
//! Source file
//!     │
//!     ├──> Tree-sitter parse (C#)
//!     │
//!     ├──> First class with a <summary> doc comment
//!     │      └─> namespace + class name → T:Namespace.Class
//!     │
//!     ├──> Closest *.asmdef above the file → owner (or Assembly-CSharp)
//!     │
//!     └──> MappingRecord { summary, relative_path, owner, type_key }
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use script_summaries_extractor::MappingBuilder;
//! use std::path::Path;
//!
//! let mut builder = MappingBuilder::new("/project/Assets").unwrap();
//! if let Some(record) = builder.build(Path::new("/project/Assets/Scripts/Foo.cs")) {
//!     println!("{} -> {}", record.relative_path, record.summary);
//! }
//! ```

mod analyzer;
mod builder;
pub mod doc_comment;
mod error;
mod owner;
mod paths;
mod types;

pub use analyzer::{ClassDocAnalyzer, DocumentedClass};
pub use builder::{MappingBuilder, DEFAULT_ROOT_LABEL};
pub use error::{ExtractorError, Result};
pub use owner::{OwnerResolver, DESCRIPTOR_EXTENSION};
pub use paths::{normalize_path, root_label, rooted_relative_path};
pub use types::{combined_key, type_key, MappingRecord, FALLBACK_OWNER, KEY_SEPARATOR};
