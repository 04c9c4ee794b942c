use crate::error::{ChunkerError, Result};
use crate::language::Language;
use std::fmt;
use tree_sitter::{Node, Parser, Query, QueryCapture, QueryCursor, StreamingIterator};

pub(crate) const FUNCTION_DECLARATOR: &str = "function.declarator";
pub(crate) const CLASS_NAME: &str = "class.name";
pub(crate) const STRUCT_NAME: &str = "struct.name";
pub(crate) const STRUCT_ALIAS: &str = "struct.alias";
pub(crate) const ARRAY_NAME: &str = "array.name";
pub(crate) const COMMENT: &str = "comment";

const FUNCTION_QUERY: &str = r#"
(function_definition
  declarator: (_) @function.declarator) @function.definition
"#;

const CLASS_QUERY: &str = r#"
(class_specifier
  name: (type_identifier) @class.name
  body: (field_declaration_list)) @class.definition
"#;

const STRUCT_QUERY: &str = r#"
(struct_specifier
  name: (type_identifier) @struct.name
  body: (field_declaration_list)) @struct.definition

(type_definition
  type: (struct_specifier
    body: (field_declaration_list))
  declarator: (type_identifier) @struct.alias) @struct.typedef
"#;

const ARRAY_QUERY: &str = r#"
(declaration
  declarator: (init_declarator
    declarator: (array_declarator
      declarator: (identifier) @array.name)
    value: (initializer_list))) @array.definition

(declaration
  declarator: (init_declarator
    declarator: (array_declarator
      declarator: (array_declarator
        declarator: (identifier) @array.name))
    value: (initializer_list))) @array.definition

(declaration
  declarator: (init_declarator
    declarator: (pointer_declarator
      declarator: (array_declarator
        declarator: (identifier) @array.name))
    value: (initializer_list))) @array.definition
"#;

const COMMENT_QUERY: &str = "(comment) @comment";

/// A compiled query that is only ever matched with its pattern rooted at one node
pub struct RootedQuery {
    name: &'static str,
    query: Query,
}

impl RootedQuery {
    fn compile(
        language: Language,
        ts_language: &tree_sitter::Language,
        name: &'static str,
        source: &str,
        required_captures: &[&str],
    ) -> Result<Self> {
        let query = Query::new(ts_language, source)
            .map_err(|e| ChunkerError::query_compile(language.as_str(), name, e.to_string()))?;

        for capture in required_captures {
            if query.capture_index_for_name(capture).is_none() {
                return Err(ChunkerError::query_compile(
                    language.as_str(),
                    name,
                    format!("missing capture @{capture}"),
                ));
            }
        }

        Ok(Self { name, query })
    }

    /// Query name used in diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// First match whose pattern root is exactly `node`.
    ///
    /// Matches starting deeper in the subtree are ignored; they get their own turn
    /// when the walker reaches them.
    pub fn match_at<'q, 'tree>(
        &'q self,
        node: Node<'tree>,
        source: &[u8],
    ) -> Option<RootedMatch<'q, 'tree>> {
        let mut cursor = QueryCursor::new();
        cursor.set_max_start_depth(Some(0));
        let mut matches = cursor.matches(&self.query, node, source);
        let found = matches.next()?;

        Some(RootedMatch {
            query: &self.query,
            captures: found.captures.to_vec(),
        })
    }
}

/// Captures of a single rooted match
pub struct RootedMatch<'q, 'tree> {
    query: &'q Query,
    captures: Vec<QueryCapture<'tree>>,
}

impl<'tree> RootedMatch<'_, 'tree> {
    /// Node bound to a capture name, if the matched pattern has it
    pub fn capture(&self, name: &str) -> Option<Node<'tree>> {
        let index = self.query.capture_index_for_name(name)?;
        self.captures
            .iter()
            .find(|capture| capture.index == index)
            .map(|capture| capture.node)
    }
}

/// Grammar plus the extraction queries available for one language family
pub struct Grammar {
    language: Language,
    ts_language: tree_sitter::Language,
    function: RootedQuery,
    class: Option<RootedQuery>,
    structure: RootedQuery,
    array_init: RootedQuery,
    comment: RootedQuery,
}

impl Grammar {
    /// Compile every query for a language family
    pub fn load(language: Language) -> Result<Self> {
        let ts_language = language.tree_sitter_language();

        // Fail here rather than on the first file if the grammar ABI is incompatible.
        Parser::new()
            .set_language(&ts_language)
            .map_err(|e| ChunkerError::grammar_load(language.as_str(), e.to_string()))?;

        let function = RootedQuery::compile(
            language,
            &ts_language,
            "function",
            FUNCTION_QUERY,
            &[FUNCTION_DECLARATOR],
        )?;
        let class = if language.has_classes() {
            Some(RootedQuery::compile(
                language,
                &ts_language,
                "class",
                CLASS_QUERY,
                &[CLASS_NAME],
            )?)
        } else {
            None
        };
        let structure = RootedQuery::compile(
            language,
            &ts_language,
            "struct",
            STRUCT_QUERY,
            &[STRUCT_NAME, STRUCT_ALIAS],
        )?;
        let array_init =
            RootedQuery::compile(language, &ts_language, "array", ARRAY_QUERY, &[ARRAY_NAME])?;
        let comment =
            RootedQuery::compile(language, &ts_language, "comment", COMMENT_QUERY, &[COMMENT])?;

        log::debug!("Compiled extraction queries for {language}");

        Ok(Self {
            language,
            ts_language,
            function,
            class,
            structure,
            array_init,
            comment,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Fresh parser bound to this grammar
    pub fn parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.ts_language)
            .map_err(|e| ChunkerError::grammar_load(self.language.as_str(), e.to_string()))?;
        Ok(parser)
    }

    pub fn function_query(&self) -> &RootedQuery {
        &self.function
    }

    /// `None` for grammars without classes (C)
    pub fn class_query(&self) -> Option<&RootedQuery> {
        self.class.as_ref()
    }

    pub fn struct_query(&self) -> &RootedQuery {
        &self.structure
    }

    pub fn array_query(&self) -> &RootedQuery {
        &self.array_init
    }

    pub fn comment_query(&self) -> &RootedQuery {
        &self.comment
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("language", &self.language)
            .field("has_class_query", &self.class.is_some())
            .finish_non_exhaustive()
    }
}

/// Grammars for every supported language family, compiled once at startup
pub struct GrammarSet {
    c: Grammar,
    cpp: Grammar,
}

impl GrammarSet {
    pub fn load() -> Result<Self> {
        Ok(Self {
            c: Grammar::load(Language::C)?,
            cpp: Grammar::load(Language::Cpp)?,
        })
    }

    pub fn get(&self, language: Language) -> &Grammar {
        match language {
            Language::C => &self.c,
            Language::Cpp => &self.cpp,
        }
    }

    /// Grammar for a file extension, `None` when unsupported
    pub fn for_extension(&self, ext: &str) -> Option<&Grammar> {
        Language::from_extension(ext).map(|language| self.get(language))
    }
}

impl fmt::Debug for GrammarSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries([&self.c, &self.cpp]).finish()
    }
}
