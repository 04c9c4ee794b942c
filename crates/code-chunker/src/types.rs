use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A source fragment classified by construct kind, the unit of indexing and retrieval
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Exact source text of the covered byte range
    pub content: String,

    /// Originating file name
    pub source: String,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,

    pub kind: ChunkKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub struct_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_name: Option<String>,

    /// Vector distance to the query; only set on retrieved chunks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

impl Chunk {
    /// Create an unnamed chunk
    #[must_use]
    pub fn new(
        kind: ChunkKind,
        source: impl Into<String>,
        start_line: usize,
        end_line: usize,
        content: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            start_line,
            end_line,
            kind,
            function_name: None,
            class_name: None,
            struct_name: None,
            array_name: None,
            distance: None,
        }
    }

    /// Builder: set function name
    #[must_use]
    pub fn function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    /// Builder: set class name
    #[must_use]
    pub fn class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = Some(name.into());
        self
    }

    /// Builder: set struct name
    #[must_use]
    pub fn struct_name(mut self, name: impl Into<String>) -> Self {
        self.struct_name = Some(name.into());
        self
    }

    /// Builder: set array name
    #[must_use]
    pub fn array_name(mut self, name: impl Into<String>) -> Self {
        self.array_name = Some(name.into());
        self
    }

    /// Builder: attach a retrieval distance
    #[must_use]
    pub const fn with_distance(mut self, distance: f32) -> Self {
        self.distance = Some(distance);
        self
    }

    /// The name most representative of this chunk, if any
    pub fn display_name(&self) -> Option<&str> {
        match self.kind {
            ChunkKind::Function | ChunkKind::TestCaseFunction => self.function_name.as_deref(),
            ChunkKind::Class => self.class_name.as_deref(),
            ChunkKind::Struct => self.struct_name.as_deref(),
            ChunkKind::ArrayInit => self.array_name.as_deref(),
            ChunkKind::Comment => None,
        }
    }

    /// Key used to detect duplicate retrieval results.
    ///
    /// Covers the content, location, kind and every name slot; `end_line` and
    /// `distance` are deliberately left out.
    pub fn dedup_key(&self) -> ChunkKey<'_> {
        ChunkKey {
            content: &self.content,
            source: &self.source,
            start_line: self.start_line,
            kind: self.kind,
            function_name: self.function_name.as_deref(),
            class_name: self.class_name.as_deref(),
            struct_name: self.struct_name.as_deref(),
            array_name: self.array_name.as_deref(),
        }
    }

    /// Get the number of lines in this chunk
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// Borrowed identity tuple of a chunk, see [`Chunk::dedup_key`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkKey<'a> {
    pub content: &'a str,
    pub source: &'a str,
    pub start_line: usize,
    pub kind: ChunkKind,
    pub function_name: Option<&'a str>,
    pub class_name: Option<&'a str>,
    pub struct_name: Option<&'a str>,
    pub array_name: Option<&'a str>,
}

/// Construct kind of a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Function,
    /// Function whose name looks like a test case
    TestCaseFunction,
    Class,
    Struct,
    /// Array declaration with a brace initializer
    ArrayInit,
    Comment,
}

impl ChunkKind {
    pub const ALL: [ChunkKind; 6] = [
        ChunkKind::Function,
        ChunkKind::TestCaseFunction,
        ChunkKind::Class,
        ChunkKind::Struct,
        ChunkKind::ArrayInit,
        ChunkKind::Comment,
    ];

    /// Get kind as string
    pub const fn as_str(self) -> &'static str {
        match self {
            ChunkKind::Function => "function",
            ChunkKind::TestCaseFunction => "test_case_function",
            ChunkKind::Class => "class",
            ChunkKind::Struct => "struct",
            ChunkKind::ArrayInit => "array_init",
            ChunkKind::Comment => "comment",
        }
    }

    /// Functions and test cases
    pub const fn is_function(self) -> bool {
        matches!(self, ChunkKind::Function | ChunkKind::TestCaseFunction)
    }

    /// Classes and structs, the constructs that open a scope
    pub const fn is_container(self) -> bool {
        matches!(self, ChunkKind::Class | ChunkKind::Struct)
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChunkKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let known: Vec<&str> = ChunkKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown chunk kind '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in ChunkKind::ALL {
            assert_eq!(kind.as_str().parse::<ChunkKind>(), Ok(kind));
        }
        assert!("method".parse::<ChunkKind>().is_err());
    }

    #[test]
    fn test_distance_is_omitted_until_retrieved() {
        let chunk = Chunk::new(ChunkKind::Function, "a.c", 2, 2, "int f(){}").function_name("f");
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["kind"], "function");
        assert!(json.get("distance").is_none());
        assert!(json.get("class_name").is_none());

        let retrieved = chunk.with_distance(0.25);
        let json = serde_json::to_value(&retrieved).unwrap();
        assert_eq!(json["distance"], 0.25);
    }

    #[test]
    fn test_dedup_key_ignores_distance_and_end_line() {
        let a = Chunk::new(ChunkKind::Comment, "a.c", 3, 3, "// x").with_distance(0.1);
        let mut b = Chunk::new(ChunkKind::Comment, "a.c", 3, 3, "// x").with_distance(0.9);
        b.end_line = 4;
        assert_eq!(a.dedup_key(), b.dedup_key());

        let c = a.clone().struct_name("S");
        assert_ne!(a.dedup_key(), c.dedup_key());
    }
}
