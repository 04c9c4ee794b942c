use crate::config::{ChunkerConfig, ScopeAttribution};
use crate::grammar::{self, Grammar};
use crate::naming::{QualifiedName, TestNameMatcher};
use crate::types::{Chunk, ChunkKind};
use crate::walker::{PreorderWalk, ScopeKind, ScopeStack};
use std::ops::Range;
use tree_sitter::{Node, Tree};

/// Classifies syntax nodes into chunks for one grammar.
///
/// Holds only shared, read-only state; everything mutated during a pass lives in
/// [`ExtractionPass`], so one extractor can serve concurrent files.
pub(crate) struct Extractor<'a> {
    grammar: &'a Grammar,
    config: &'a ChunkerConfig,
    test_names: &'a TestNameMatcher,
}

/// Mutable state threaded through a single traversal
#[derive(Debug, Default)]
struct ExtractionPass {
    scopes: ScopeStack,
    accepted: AcceptedRanges,
    chunks: Vec<Chunk>,
}

/// A classified node before the overlap check
#[derive(Debug)]
struct Candidate {
    kind: ChunkKind,
    function_name: Option<String>,
    class_name: Option<String>,
    struct_name: Option<String>,
    array_name: Option<String>,
    opens_scope: Option<(ScopeKind, String)>,
}

impl Candidate {
    fn new(kind: ChunkKind) -> Self {
        Self {
            kind,
            function_name: None,
            class_name: None,
            struct_name: None,
            array_name: None,
            opens_scope: None,
        }
    }

    fn into_chunk(self, node: Node<'_>, source: &[u8], source_name: &str) -> Chunk {
        let content = String::from_utf8_lossy(&source[node.byte_range()]).into_owned();
        let mut chunk = Chunk::new(
            self.kind,
            source_name,
            node.start_position().row + 1,
            node.end_position().row + 1,
            content,
        );
        chunk.function_name = self.function_name;
        chunk.class_name = self.class_name;
        chunk.struct_name = self.struct_name;
        chunk.array_name = self.array_name;
        chunk
    }
}

impl<'a> Extractor<'a> {
    pub(crate) fn new(
        grammar: &'a Grammar,
        config: &'a ChunkerConfig,
        test_names: &'a TestNameMatcher,
    ) -> Self {
        Self {
            grammar,
            config,
            test_names,
        }
    }

    /// Run one extraction pass over a parsed file
    pub(crate) fn extract(&self, tree: &Tree, source: &[u8], source_name: &str) -> Vec<Chunk> {
        let mut pass = ExtractionPass::default();

        for node in PreorderWalk::new(tree) {
            pass.scopes.pop_finished(node.start_byte());

            let Some(mut candidate) = self.classify(node, source, &pass.scopes) else {
                continue;
            };

            // Scopes open even when the chunk itself loses the overlap check, so members
            // still see their nearest enclosing class/struct.
            if let Some((kind, name)) = candidate.opens_scope.take() {
                pass.scopes.push(kind, name, node.end_byte());
            }

            let range = node.byte_range();
            if pass
                .accepted
                .admits(&range, candidate.kind, self.config.nest_members_in_scopes)
            {
                pass.accepted.insert(range, candidate.kind);
                pass.chunks.push(candidate.into_chunk(node, source, source_name));
            } else {
                log::trace!(
                    "{source_name}: rejected overlapping {} at line {}",
                    candidate.kind,
                    node.start_position().row + 1
                );
            }
        }

        let mut chunks = pass.chunks;
        chunks.sort_by_key(|chunk| chunk.start_line);
        chunks
    }

    fn classify(&self, node: Node<'_>, source: &[u8], scopes: &ScopeStack) -> Option<Candidate> {
        match node.kind() {
            "class_specifier" => self.classify_class(node, source),
            "struct_specifier" => self.classify_struct(node, source),
            "type_definition" => self.classify_typedef(node, source),
            "function_definition" => self.classify_function(node, source, scopes),
            "declaration" => self.classify_array(node, source),
            "comment" => self.classify_comment(node, source),
            _ => None,
        }
    }

    fn classify_class(&self, node: Node<'_>, source: &[u8]) -> Option<Candidate> {
        let found = self.grammar.class_query()?.match_at(node, source)?;
        let name = node_text(found.capture(grammar::CLASS_NAME)?, source)?;

        let mut candidate = Candidate::new(ChunkKind::Class);
        candidate.class_name = Some(name.clone());
        candidate.opens_scope = Some((ScopeKind::Class, name));
        Some(candidate)
    }

    fn classify_struct(&self, node: Node<'_>, source: &[u8]) -> Option<Candidate> {
        let found = self.grammar.struct_query().match_at(node, source)?;
        let name = node_text(found.capture(grammar::STRUCT_NAME)?, source)?;
        Some(struct_candidate(name))
    }

    /// `typedef struct {...} Alias;` is named by its alias
    fn classify_typedef(&self, node: Node<'_>, source: &[u8]) -> Option<Candidate> {
        let found = self.grammar.struct_query().match_at(node, source)?;
        let name = node_text(found.capture(grammar::STRUCT_ALIAS)?, source)?;
        Some(struct_candidate(name))
    }

    fn classify_function(
        &self,
        node: Node<'_>,
        source: &[u8],
        scopes: &ScopeStack,
    ) -> Option<Candidate> {
        let found = self.grammar.function_query().match_at(node, source)?;
        let declarator = found.capture(grammar::FUNCTION_DECLARATOR)?;
        let name_node = function_name_node(declarator)?;
        let qualified = QualifiedName::from_node(name_node, source)?;

        let kind = if self.test_names.is_test_name(&qualified.leaf) {
            ChunkKind::TestCaseFunction
        } else {
            ChunkKind::Function
        };
        let mut candidate = Candidate::new(kind);

        let enclosing = match qualified.scope {
            Some(scope) => Some((None, scope)),
            None => scopes
                .innermost()
                .map(|frame| (Some(frame.kind), frame.name.clone())),
        };
        if let Some((scope_kind, scope_name)) = enclosing {
            match self.attribution_slot(scope_kind) {
                ScopeKind::Class => candidate.class_name = Some(scope_name),
                ScopeKind::Struct => candidate.struct_name = Some(scope_name),
            }
        }

        candidate.function_name = Some(qualified.leaf);
        Some(candidate)
    }

    fn classify_array(&self, node: Node<'_>, source: &[u8]) -> Option<Candidate> {
        let found = self.grammar.array_query().match_at(node, source)?;
        let name = node_text(found.capture(grammar::ARRAY_NAME)?, source)?;

        let mut candidate = Candidate::new(ChunkKind::ArrayInit);
        candidate.array_name = Some(name);
        Some(candidate)
    }

    fn classify_comment(&self, node: Node<'_>, source: &[u8]) -> Option<Candidate> {
        self.grammar.comment_query().match_at(node, source)?;
        Some(Candidate::new(ChunkKind::Comment))
    }

    /// Name slot that receives an enclosing scope
    fn attribution_slot(&self, scope_kind: Option<ScopeKind>) -> ScopeKind {
        let by_language = if self.grammar.language().has_classes() {
            ScopeKind::Class
        } else {
            ScopeKind::Struct
        };
        match self.config.scope_attribution {
            ScopeAttribution::ByLanguage => by_language,
            ScopeAttribution::ByScopeKind => scope_kind.unwrap_or(by_language),
        }
    }
}

fn struct_candidate(name: String) -> Candidate {
    let mut candidate = Candidate::new(ChunkKind::Struct);
    candidate.struct_name = Some(name.clone());
    candidate.opens_scope = Some((ScopeKind::Struct, name));
    candidate
}

fn node_text(node: Node<'_>, source: &[u8]) -> Option<String> {
    let text = node.utf8_text(source).ok()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Unwrap function, pointer, reference and parenthesized declarators down to the
/// innermost name node.
///
/// Returns `None` unless a function declarator was seen on the way, so
/// `int (*fp)(int)`-style variables never resolve to a function name.
fn function_name_node(declarator: Node<'_>) -> Option<Node<'_>> {
    let mut node = declarator;
    let mut seen_function = false;
    loop {
        match node.kind() {
            "function_declarator"
            | "pointer_declarator"
            | "reference_declarator"
            | "parenthesized_declarator"
            | "attributed_declarator" => {
                seen_function |= node.kind() == "function_declarator";
                node = inner_declarator(node)?;
            }
            _ => return seen_function.then_some(node),
        }
    }
}

fn inner_declarator(node: Node<'_>) -> Option<Node<'_>> {
    if let Some(inner) = node.child_by_field_name("declarator") {
        return Some(inner);
    }
    // reference and parenthesized declarators carry no field name for the inner one
    let mut cursor = node.walk();
    let last = node.named_children(&mut cursor).last();
    last
}

/// Byte ranges accepted so far in one pass
#[derive(Debug, Default)]
struct AcceptedRanges {
    ranges: Vec<(Range<usize>, ChunkKind)>,
}

impl AcceptedRanges {
    /// Whether `candidate` may be accepted.
    ///
    /// A candidate is rejected if it contains or is contained by an accepted range.
    /// With `nest_members`, a function lying inside an accepted class/struct is the
    /// one tolerated containment.
    fn admits(&self, candidate: &Range<usize>, kind: ChunkKind, nest_members: bool) -> bool {
        self.ranges.iter().all(|(accepted, accepted_kind)| {
            let inside = contains(accepted, candidate);
            let around = contains(candidate, accepted);
            if !inside && !around {
                return true;
            }
            nest_members && kind.is_function() && accepted_kind.is_container() && !around
        })
    }

    fn insert(&mut self, range: Range<usize>, kind: ChunkKind) {
        self.ranges.push((range, kind));
    }
}

fn contains(outer: &Range<usize>, inner: &Range<usize>) -> bool {
    outer.start <= inner.start && inner.end <= outer.end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_ranges_reject_containment_both_ways() {
        let mut accepted = AcceptedRanges::default();
        accepted.insert(10..50, ChunkKind::Function);

        assert!(!accepted.admits(&(20..30), ChunkKind::Comment, true));
        assert!(!accepted.admits(&(0..60), ChunkKind::Struct, true));
        assert!(!accepted.admits(&(10..50), ChunkKind::Comment, true));
        assert!(accepted.admits(&(50..60), ChunkKind::Comment, true));
        assert!(accepted.admits(&(0..10), ChunkKind::Comment, true));
    }

    #[test]
    fn test_members_nest_only_inside_containers() {
        let mut accepted = AcceptedRanges::default();
        accepted.insert(0..100, ChunkKind::Class);

        assert!(accepted.admits(&(10..20), ChunkKind::Function, true));
        assert!(accepted.admits(&(10..20), ChunkKind::TestCaseFunction, true));
        assert!(!accepted.admits(&(10..20), ChunkKind::Function, false));
        assert!(!accepted.admits(&(10..20), ChunkKind::Comment, true));
        assert!(!accepted.admits(&(10..20), ChunkKind::Struct, true));

        accepted.insert(10..20, ChunkKind::Function);
        assert!(!accepted.admits(&(12..15), ChunkKind::Comment, true));
    }

    #[test]
    fn test_contains_is_inclusive() {
        assert!(contains(&(0..10), &(0..10)));
        assert!(contains(&(0..10), &(2..8)));
        assert!(!contains(&(2..8), &(0..10)));
        assert!(!contains(&(0..5), &(5..9)));
    }
}
