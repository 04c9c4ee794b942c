use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use crate::extractor::Extractor;
use crate::grammar::GrammarSet;
use crate::language::Language;
use crate::naming::TestNameMatcher;
use crate::types::{Chunk, ChunkKind};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Main chunker interface for processing C/C++ sources.
///
/// Cheap to clone; grammars are compiled once in [`Chunker::new`] and shared. Each
/// extraction call builds its own parser and walker state, so a chunker can be used
/// from many threads at once.
#[derive(Clone)]
pub struct Chunker {
    config: Arc<ChunkerConfig>,
    grammars: Arc<GrammarSet>,
    test_names: Arc<TestNameMatcher>,
}

/// Result of extracting one file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Chunks sorted by start line
    pub chunks: Vec<Chunk>,
    /// Non-fatal problems; a warning always comes with an empty chunk list
    pub warnings: Vec<ExtractionWarning>,
}

impl Extraction {
    fn skipped(warning: ExtractionWarning) -> Self {
        log::warn!("{warning}");
        Self {
            chunks: Vec::new(),
            warnings: vec![warning],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Why a file produced no chunks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionWarning {
    #[error("{file}: unsupported file extension '{extension}'")]
    UnsupportedExtension { file: String, extension: String },

    #[error("{file}: language {language} is disabled")]
    LanguageDisabled { file: String, language: Language },

    #[error("{file}: file could not be read: {message}")]
    Unreadable { file: String, message: String },

    #[error("{file}: {size} bytes exceeds the {limit} byte limit")]
    TooLarge {
        file: String,
        size: usize,
        limit: usize,
    },

    #[error("{file}: parser produced no syntax tree")]
    ParseFailed { file: String },
}

impl Chunker {
    /// Create a new chunker, compiling every grammar and query up front.
    ///
    /// A failure here means extraction cannot work for a whole language family and
    /// must be treated as a startup error.
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate().map_err(ChunkerError::invalid_config)?;
        let grammars = GrammarSet::load()?;
        let test_names = TestNameMatcher::new()?;

        Ok(Self {
            config: Arc::new(config),
            grammars: Arc::new(grammars),
            test_names: Arc::new(test_names),
        })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Extract chunks from raw bytes; `extension` selects the grammar
    pub fn extract(&self, bytes: &[u8], source: &str, extension: &str) -> Extraction {
        let Some(language) = Language::from_extension(extension) else {
            return Extraction::skipped(ExtractionWarning::UnsupportedExtension {
                file: source.to_string(),
                extension: extension.to_string(),
            });
        };
        self.extract_with_language(bytes, source, language)
    }

    /// Extract chunks from a file, naming chunks after the file name
    pub fn extract_file(&self, path: impl AsRef<Path>) -> Extraction {
        let path = path.as_ref();
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        self.extract_file_as(path, &source)
    }

    /// Extract chunks from a file with an explicit source name
    pub fn extract_file_as(&self, path: impl AsRef<Path>, source: &str) -> Extraction {
        let path = path.as_ref();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(language) = Language::from_extension(&extension) else {
            return Extraction::skipped(ExtractionWarning::UnsupportedExtension {
                file: source.to_string(),
                extension,
            });
        };

        match std::fs::read(path) {
            Ok(bytes) => self.extract_with_language(&bytes, source, language),
            Err(e) => Extraction::skipped(ExtractionWarning::Unreadable {
                file: source.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Extract chunks with an explicit language
    pub fn extract_with_language(
        &self,
        bytes: &[u8],
        source: &str,
        language: Language,
    ) -> Extraction {
        if !self.config.allows(language) {
            return Extraction::skipped(ExtractionWarning::LanguageDisabled {
                file: source.to_string(),
                language,
            });
        }
        if bytes.len() > self.config.max_file_bytes {
            return Extraction::skipped(ExtractionWarning::TooLarge {
                file: source.to_string(),
                size: bytes.len(),
                limit: self.config.max_file_bytes,
            });
        }

        let grammar = self.grammars.get(language);
        let tree = match grammar.parser() {
            Ok(mut parser) => parser.parse(bytes, None),
            Err(e) => {
                log::error!("{source}: {e}");
                None
            }
        };
        let Some(tree) = tree else {
            return Extraction::skipped(ExtractionWarning::ParseFailed {
                file: source.to_string(),
            });
        };
        if tree.root_node().has_error() {
            log::debug!("{source}: syntax errors present, extracting best-effort");
        }

        let extractor = Extractor::new(grammar, &self.config, &self.test_names);
        let chunks = extractor.extract(&tree, bytes, source);
        log::debug!("{source}: extracted {} chunks ({language})", chunks.len());

        Extraction {
            chunks,
            warnings: Vec::new(),
        }
    }

    /// Get statistics about extracted chunks
    pub fn get_stats(chunks: &[Chunk]) -> ChunkingStats {
        let count = |kind: ChunkKind| chunks.iter().filter(|c| c.kind == kind).count();
        ChunkingStats {
            total_chunks: chunks.len(),
            total_lines: chunks.iter().map(Chunk::line_count).sum(),
            functions: count(ChunkKind::Function),
            test_cases: count(ChunkKind::TestCaseFunction),
            types: count(ChunkKind::Class) + count(ChunkKind::Struct),
            arrays: count(ChunkKind::ArrayInit),
            comments: count(ChunkKind::Comment),
        }
    }
}

/// Statistics about extracted chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingStats {
    pub total_chunks: usize,
    pub total_lines: usize,
    pub functions: usize,
    pub test_cases: usize,
    pub types: usize,
    pub arrays: usize,
    pub comments: usize,
}

impl std::fmt::Display for ChunkingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunks: {} | Lines: {} | Functions: {} | Tests: {} | Types: {} | Arrays: {} | Comments: {}",
            self.total_chunks,
            self.total_lines,
            self.functions,
            self.test_cases,
            self.types,
            self.arrays,
            self.comments
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunker() -> Chunker {
        Chunker::new(ChunkerConfig::default()).unwrap()
    }

    #[test]
    fn test_unsupported_extension_warns() {
        let extraction = chunker().extract(b"def f(): pass\n", "f.py", "py");
        assert!(extraction.chunks.is_empty());
        assert_eq!(
            extraction.warnings,
            vec![ExtractionWarning::UnsupportedExtension {
                file: "f.py".to_string(),
                extension: "py".to_string()
            }]
        );
    }

    #[test]
    fn test_missing_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        let extraction = chunker().extract_file(dir.path().join("gone.c"));
        assert!(extraction.chunks.is_empty());
        assert!(matches!(
            extraction.warnings.as_slice(),
            [ExtractionWarning::Unreadable { file, .. }] if file == "gone.c"
        ));
    }

    #[test]
    fn test_extract_file_uses_file_name_as_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("math.c");
        std::fs::write(&path, "int add(int a, int b) { return a + b; }\n").unwrap();

        let extraction = chunker().extract_file(&path);
        assert!(extraction.warnings.is_empty());
        assert_eq!(extraction.chunks.len(), 1);
        assert_eq!(extraction.chunks[0].source, "math.c");
    }

    #[test]
    fn test_size_limit() {
        let config = ChunkerConfig {
            max_file_bytes: 8,
            ..Default::default()
        };
        let chunker = Chunker::new(config).unwrap();
        let extraction = chunker.extract(b"int main(void) { return 0; }\n", "m.c", "c");
        assert!(extraction.chunks.is_empty());
        assert!(matches!(
            extraction.warnings.as_slice(),
            [ExtractionWarning::TooLarge { limit: 8, .. }]
        ));
    }

    #[test]
    fn test_disabled_language() {
        let config = ChunkerConfig {
            supported_languages: vec![Language::C],
            ..Default::default()
        };
        let chunker = Chunker::new(config).unwrap();
        let extraction = chunker.extract(b"class A {};\n", "a.cpp", "cpp");
        assert!(extraction.chunks.is_empty());
        assert_eq!(extraction.warnings.len(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ChunkerConfig {
            max_file_bytes: 0,
            ..Default::default()
        };
        assert!(matches!(
            Chunker::new(config),
            Err(ChunkerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_stats() {
        let chunks = chunker()
            .extract(
                b"// util\nint f(void) { return 1; }\nvoid test_f(void) {}\n",
                "u.c",
                "c",
            )
            .chunks;
        let stats = Chunker::get_stats(&chunks);
        assert_eq!(stats.total_chunks, 3);
        assert_eq!(stats.functions, 1);
        assert_eq!(stats.test_cases, 1);
        assert_eq!(stats.comments, 1);
        assert!(stats.to_string().starts_with("Chunks: 3"));
    }
}
