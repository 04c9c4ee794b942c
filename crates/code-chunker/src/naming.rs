use crate::error::{ChunkerError, Result};
use regex::Regex;
use tree_sitter::Node;

const TEST_NAME_PATTERN: &str =
    r"(?i)(?:^|_)test_\w*$|^[A-Z_]+_TEST_\w*$|^[A-Z_]+_CASE_\w*$|Test[A-Z]\w*$";

/// Heuristic classifier for test-case function names.
///
/// Matches `test_*` (also after a prefix segment, `foo_test_bar`), `*_TEST_*`,
/// `*_CASE_*` and `Test<Name>`, ignoring case.
#[derive(Debug, Clone)]
pub struct TestNameMatcher {
    re: Regex,
}

impl TestNameMatcher {
    pub fn new() -> Result<Self> {
        let re = Regex::new(TEST_NAME_PATTERN)
            .map_err(|e| ChunkerError::invalid_config(format!("test name pattern: {e}")))?;
        Ok(Self { re })
    }

    pub fn is_test_name(&self, name: &str) -> bool {
        self.re.is_match(name)
    }
}

/// A possibly qualified function name split into scope and leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    /// `A::B` for `A::B::f`; `None` for an unqualified name
    pub scope: Option<String>,
    pub leaf: String,
}

impl QualifiedName {
    /// Read the name of a function declarator.
    ///
    /// Walks nested `qualified_identifier` nodes through their `scope`/`name` fields,
    /// so `::` inside template arguments never splits the name. Template arguments
    /// are dropped from scopes and leaf (`Vec<T>::push` is `Vec` + `push`) and
    /// whitespace runs collapse to one space (`operator new`). A leading `::` yields
    /// no scope.
    pub fn from_node(node: Node<'_>, source: &[u8]) -> Option<Self> {
        let mut scopes = Vec::new();
        let mut current = node;
        while current.kind() == "qualified_identifier" {
            if let Some(scope) = current.child_by_field_name("scope") {
                scopes.push(plain_name(scope, source)?);
            }
            current = current.child_by_field_name("name")?;
        }

        Some(Self {
            scope: (!scopes.is_empty()).then(|| scopes.join("::")),
            leaf: plain_name(current, source)?,
        })
    }
}

fn plain_name(node: Node<'_>, source: &[u8]) -> Option<String> {
    let node = match node.kind() {
        "template_type" | "template_function" | "template_method" => {
            node.child_by_field_name("name")?
        }
        _ => node,
    };
    let text = node.utf8_text(source).ok()?;
    let name = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!name.is_empty()).then_some(name)
}
