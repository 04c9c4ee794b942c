//! # codechat Code Chunker
//!
//! Syntax-aware extraction of C and C++ source fragments for retrieval.
//!
//! ## Architecture
//!
//! ```text
//! File bytes + extension
//!     │
//!     ├──> Grammar Adapter (extension → tree-sitter grammar + compiled queries)
//!     │
//!     ├──> Tree-sitter Parsing → syntax tree
//!     │
//!     ├──> Scope-Tracking Walker
//!     │    ├─> iterative pre-order cursor walk
//!     │    └─> stack of enclosing class/struct frames
//!     │
//!     └──> Chunk Extractor
//!          ├─> classify node (function, test case, class, struct, array, comment)
//!          ├─> resolve qualified names and enclosing scope
//!          ├─> reject ranges overlapping an accepted chunk
//!          └─> emit Chunk[] sorted by start line
//! ```
//!
//! ## Example
//!
//! ```rust
//! use codechat_code_chunker::{ChunkKind, Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
//!
//! let code = b"struct Point { int x; int y; };\nint add(int a, int b){ return a+b; }\n";
//! let extraction = chunker.extract(code, "point.c", "c");
//!
//! assert_eq!(extraction.chunks.len(), 2);
//! assert_eq!(extraction.chunks[1].kind, ChunkKind::Function);
//! assert_eq!(extraction.chunks[1].function_name.as_deref(), Some("add"));
//! ```

mod chunker;
mod config;
mod error;
mod extractor;
mod grammar;
mod language;
mod naming;
mod types;
mod walker;

pub use chunker::{Chunker, ChunkingStats, Extraction, ExtractionWarning};
pub use config::{ChunkerConfig, ScopeAttribution};
pub use error::{ChunkerError, Result};
pub use grammar::{Grammar, GrammarSet};
pub use language::Language;
pub use naming::{QualifiedName, TestNameMatcher};
pub use types::{Chunk, ChunkKey, ChunkKind};
pub use walker::{PreorderWalk, ScopeFrame, ScopeKind, ScopeStack};
