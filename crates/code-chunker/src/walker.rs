use std::fmt;
use tree_sitter::{Node, Tree, TreeCursor};

/// Iterative pre-order traversal over a syntax tree.
///
/// Visits every node exactly once in document order, children before siblings. When a
/// subtree is exhausted the cursor climbs to the nearest ancestor that still has an
/// unvisited sibling. No recursion, so deeply nested sources cannot blow the stack.
pub struct PreorderWalk<'tree> {
    cursor: TreeCursor<'tree>,
    done: bool,
}

impl<'tree> PreorderWalk<'tree> {
    pub fn new(tree: &'tree Tree) -> Self {
        Self::from_node(tree.root_node())
    }

    /// Walk the subtree rooted at `node` (the node itself is visited first)
    pub fn from_node(node: Node<'tree>) -> Self {
        Self {
            cursor: node.walk(),
            done: false,
        }
    }

    fn advance(&mut self) {
        if self.cursor.goto_first_child() {
            return;
        }
        loop {
            if self.cursor.goto_next_sibling() {
                return;
            }
            if !self.cursor.goto_parent() {
                self.done = true;
                return;
            }
        }
    }
}

impl<'tree> Iterator for PreorderWalk<'tree> {
    type Item = Node<'tree>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let node = self.cursor.node();
        self.advance();
        Some(node)
    }
}

/// Kind of an enclosing named scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Class,
    Struct,
}

impl ScopeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Class => "class",
            ScopeKind::Struct => "struct",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An enclosing class/struct and the byte offset at which its coverage ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFrame {
    pub kind: ScopeKind,
    pub name: String,
    pub end_byte: usize,
}

/// Stack of enclosing scopes for one traversal
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ScopeKind, name: impl Into<String>, end_byte: usize) {
        self.frames.push(ScopeFrame {
            kind,
            name: name.into(),
            end_byte,
        });
    }

    /// Pop every frame that ends at or before `start_byte`.
    ///
    /// Must run on every visited node so sibling scopes never leak into each other.
    pub fn pop_finished(&mut self, start_byte: usize) {
        while self
            .frames
            .last()
            .is_some_and(|frame| frame.end_byte <= start_byte)
        {
            self.frames.pop();
        }
    }

    /// Nearest enclosing frame
    pub fn innermost(&self) -> Option<&ScopeFrame> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use pretty_assertions::assert_eq;
    use tree_sitter::Parser;

    fn parse(code: &str) -> Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&Language::C.tree_sitter_language())
            .unwrap();
        parser.parse(code, None).unwrap()
    }

    #[test]
    fn test_visits_every_node_once_in_document_order() {
        let tree = parse("int a;\nstruct S { int x; };\nint f(void) { return 1; }\n");

        let visited: Vec<Node> = PreorderWalk::new(&tree).collect();

        fn count(node: Node) -> usize {
            let mut cursor = node.walk();
            1 + node
                .children(&mut cursor)
                .map(count)
                .sum::<usize>()
        }
        assert_eq!(visited.len(), count(tree.root_node()));

        let starts: Vec<usize> = visited.iter().map(|n| n.start_byte()).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted, "pre-order must be non-decreasing in start offset");

        assert_eq!(visited[0].kind(), "translation_unit");
        let ids: std::collections::HashSet<usize> = visited.iter().map(|n| n.id()).collect();
        assert_eq!(ids.len(), visited.len());
    }

    #[test]
    fn test_parent_before_children() {
        let tree = parse("int f(void) { return 1; }\n");
        let kinds: Vec<&str> = PreorderWalk::new(&tree).map(|n| n.kind()).collect();
        let def = kinds.iter().position(|k| *k == "function_definition").unwrap();
        let body = kinds.iter().position(|k| *k == "compound_statement").unwrap();
        let ret = kinds.iter().position(|k| *k == "return_statement").unwrap();
        assert!(def < body && body < ret);
    }

    #[test]
    fn test_empty_source_yields_only_root() {
        let tree = parse("");
        let kinds: Vec<&str> = PreorderWalk::new(&tree).map(|n| n.kind()).collect();
        assert_eq!(kinds, vec!["translation_unit"]);
    }

    #[test]
    fn test_scope_stack_pops_finished_frames() {
        let mut scopes = ScopeStack::new();
        scopes.push(ScopeKind::Class, "Outer", 100);
        scopes.push(ScopeKind::Struct, "Inner", 40);

        scopes.pop_finished(10);
        assert_eq!(scopes.innermost().map(|f| f.name.as_str()), Some("Inner"));

        scopes.pop_finished(40);
        assert_eq!(scopes.innermost().map(|f| f.name.as_str()), Some("Outer"));
        assert_eq!(scopes.depth(), 1);

        scopes.pop_finished(100);
        assert!(scopes.is_empty());
    }

    #[test]
    fn test_sibling_scopes_do_not_leak() {
        let mut scopes = ScopeStack::new();
        scopes.push(ScopeKind::Struct, "A", 20);
        scopes.pop_finished(25);
        scopes.push(ScopeKind::Struct, "B", 50);
        scopes.pop_finished(30);
        assert_eq!(scopes.innermost().map(|f| f.name.as_str()), Some("B"));
        assert_eq!(scopes.depth(), 1);
    }
}
