use codechat_code_chunker::{
    Chunk, ChunkKind, Chunker, ChunkerConfig, Extraction, ScopeAttribution,
};
use pretty_assertions::assert_eq;

fn extract(code: &str, file: &str) -> Extraction {
    let ext = file.rsplit('.').next().unwrap_or_default();
    Chunker::new(ChunkerConfig::default())
        .expect("grammars load")
        .extract(code.as_bytes(), file, ext)
}

fn chunks(code: &str, file: &str) -> Vec<Chunk> {
    let extraction = extract(code, file);
    assert!(
        extraction.warnings.is_empty(),
        "unexpected warnings: {:?}",
        extraction.warnings
    );
    extraction.chunks
}

fn find<'a>(chunks: &'a [Chunk], kind: ChunkKind, name: &str) -> &'a Chunk {
    chunks
        .iter()
        .find(|c| c.kind == kind && c.display_name() == Some(name))
        .unwrap_or_else(|| panic!("no {kind} chunk named {name} in {chunks:#?}"))
}

#[test]
fn c_file_yields_struct_function_and_comment() {
    let code = "struct Point { int x; int y; };\nint add(int a, int b){ return a+b; }\n// adds two ints\n";
    let chunks = chunks(code, "point.c");

    let summary: Vec<(ChunkKind, Option<&str>, usize)> = chunks
        .iter()
        .map(|c| (c.kind, c.display_name(), c.start_line))
        .collect();
    assert_eq!(
        summary,
        vec![
            (ChunkKind::Struct, Some("Point"), 1),
            (ChunkKind::Function, Some("add"), 2),
            (ChunkKind::Comment, None, 3),
        ]
    );

    let add = &chunks[1];
    assert_eq!(add.content, "int add(int a, int b){ return a+b; }");
    assert_eq!(add.source, "point.c");
    assert_eq!(add.struct_name, None, "struct scope must not leak to a sibling");
    assert_eq!(chunks[2].content, "// adds two ints");
}

#[test]
fn method_inside_class_gets_class_name() {
    let chunks = chunks("class Foo { void bar(){ return; } };", "foo.cpp");

    let bar = find(&chunks, ChunkKind::Function, "bar");
    assert_eq!(bar.class_name.as_deref(), Some("Foo"));
    assert_eq!(bar.struct_name, None);

    let foo = find(&chunks, ChunkKind::Class, "Foo");
    assert_eq!(foo.start_line, 1);
}

#[test]
fn strict_mode_drops_members_nested_in_accepted_classes() {
    let chunker = Chunker::new(ChunkerConfig::strict()).unwrap();
    let chunks = chunker
        .extract(b"class Foo { void bar(){ return; } };", "foo.cpp", "cpp")
        .chunks;
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].kind, ChunkKind::Class);
}

#[test]
fn test_named_functions_are_test_cases() {
    let code = "static int test_parse_ok(void) { return 0; }\nint parse(void) { return 1; }\n";
    let chunks = chunks(code, "parser_test.c");

    assert_eq!(
        find(&chunks, ChunkKind::TestCaseFunction, "test_parse_ok").start_line,
        1
    );
    assert_eq!(find(&chunks, ChunkKind::Function, "parse").start_line, 2);
    assert!(!chunks
        .iter()
        .any(|c| c.kind == ChunkKind::Function && c.function_name.as_deref() == Some("test_parse_ok")));
}

#[test]
fn qualified_definitions_split_scope_and_leaf() {
    let code = r#"
void Widget::draw() {}
Widget::~Widget() {}
int ns::Codec::decode(const char *buf) { return 0; }
"#;
    let chunks = chunks(code, "widget.cpp");

    let draw = find(&chunks, ChunkKind::Function, "draw");
    assert_eq!(draw.class_name.as_deref(), Some("Widget"));

    let dtor = find(&chunks, ChunkKind::Function, "~Widget");
    assert_eq!(dtor.class_name.as_deref(), Some("Widget"));

    let decode = find(&chunks, ChunkKind::Function, "decode");
    assert_eq!(decode.class_name.as_deref(), Some("ns::Codec"));
}

#[test]
fn operator_and_template_names_stay_whole() {
    let code = r#"
void *Pool::operator new(unsigned long n) { return 0; }
template <> int parse<wire::Header>() { return 0; }
"#;
    let chunks = chunks(code, "pool.cpp");

    let alloc = find(&chunks, ChunkKind::Function, "operator new");
    assert_eq!(alloc.class_name.as_deref(), Some("Pool"));

    let parse = find(&chunks, ChunkKind::Function, "parse");
    assert_eq!(parse.class_name, None);
}

#[test]
fn declarator_wrappers_are_unwrapped() {
    let c_chunks = chunks(
        "char *dup(const char *s) { return 0; }\nstatic void (*pick(void))(int) { return 0; }\n",
        "str.c",
    );
    find(&c_chunks, ChunkKind::Function, "dup");
    find(&c_chunks, ChunkKind::Function, "pick");

    let cpp_chunks = chunks("int &at(int i) { static int x; return x; }\n", "ref.cpp");
    find(&cpp_chunks, ChunkKind::Function, "at");
}

#[test]
fn nested_scopes_attribute_the_nearest_enclosing_name() {
    let code = r#"
class Outer {
    struct Inner {
        void inner_fn() {}
    };
    void outer_fn() {}
};
void free_fn() {}
class Other { void other_fn() {} };
"#;
    let chunks = chunks(code, "scopes.hpp");

    assert_eq!(
        find(&chunks, ChunkKind::Function, "inner_fn").class_name.as_deref(),
        Some("Inner")
    );
    assert_eq!(
        find(&chunks, ChunkKind::Function, "outer_fn").class_name.as_deref(),
        Some("Outer"),
        "Inner must be popped once traversal leaves it"
    );
    assert_eq!(find(&chunks, ChunkKind::Function, "free_fn").class_name, None);
    assert_eq!(
        find(&chunks, ChunkKind::Function, "other_fn").class_name.as_deref(),
        Some("Other")
    );

    // Inner lies inside the accepted Outer chunk, so only its scope survives.
    assert!(!chunks
        .iter()
        .any(|c| c.kind == ChunkKind::Struct && c.struct_name.as_deref() == Some("Inner")));
}

#[test]
fn scope_attribution_by_kind_uses_the_frame_kind() {
    let code = "struct Point { int len() { return 0; } };\nclass Line { int len() { return 1; } };\n";

    let by_language = chunks(code, "shapes.cpp");
    let point_len = &by_language[1];
    assert_eq!(point_len.class_name.as_deref(), Some("Point"));
    assert_eq!(point_len.struct_name, None);

    let config = ChunkerConfig {
        scope_attribution: ScopeAttribution::ByScopeKind,
        ..Default::default()
    };
    let by_kind = Chunker::new(config)
        .unwrap()
        .extract(code.as_bytes(), "shapes.cpp", "cpp")
        .chunks;
    let names: Vec<(Option<&str>, Option<&str>)> = by_kind
        .iter()
        .filter(|c| c.kind == ChunkKind::Function)
        .map(|c| (c.class_name.as_deref(), c.struct_name.as_deref()))
        .collect();
    assert_eq!(names, vec![(None, Some("Point")), (Some("Line"), None)]);
}

#[test]
fn typedef_struct_is_named_by_alias_once() {
    let code = "typedef struct { float x, y; } Vec2;\ntypedef struct node { struct node *next; } Node;\n";
    let chunks = chunks(code, "types.h");

    let structs: Vec<(&str, usize)> = chunks
        .iter()
        .filter(|c| c.kind == ChunkKind::Struct)
        .map(|c| (c.struct_name.as_deref().unwrap_or_default(), c.start_line))
        .collect();
    assert_eq!(structs, vec![("Vec2", 1), ("Node", 2)]);
}

#[test]
fn array_initializers_are_chunked() {
    let code = r#"static const int primes[] = {2, 3, 5};
const char *names[] = {"a", "b"};
int grid[2][2] = {{1, 2}, {3, 4}};
int no_init[4];
int scalar = 3;
"#;
    let chunks = chunks(code, "tables.c");

    let arrays: Vec<&str> = chunks
        .iter()
        .filter(|c| c.kind == ChunkKind::ArrayInit)
        .filter_map(|c| c.array_name.as_deref())
        .collect();
    assert_eq!(arrays, vec!["primes", "names", "grid"]);
    assert_eq!(chunks.len(), 3);
}

#[test]
fn comments_inside_accepted_constructs_are_suppressed() {
    let code = "/* file header */\nint f(void) {\n    // inside\n    return 1;\n}\n";
    let chunks = chunks(code, "f.c");

    let kinds: Vec<ChunkKind> = chunks.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![ChunkKind::Comment, ChunkKind::Function]);
    assert_eq!(chunks[1].end_line, 5);
}

#[test]
fn comment_only_file_still_yields_comments() {
    let chunks = chunks("// just a note\n/* and another */\n", "notes.h");
    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|c| c.kind == ChunkKind::Comment));
}

#[test]
fn empty_file_yields_nothing_without_warnings() {
    let extraction = extract("", "empty.c");
    assert!(extraction.chunks.is_empty());
    assert!(extraction.warnings.is_empty());
}

#[test]
fn malformed_source_is_extracted_best_effort() {
    let code = "int broken( {\n\nint ok(void) { return 1; }\n// trailing\n";
    let chunks = chunks(code, "broken.c");
    assert!(chunks.windows(2).all(|w| w[0].start_line <= w[1].start_line));
    assert!(chunks.iter().all(|c| c.source == "broken.c" && c.start_line >= 1));
}

#[test]
fn strict_extraction_is_overlap_free() {
    let code = r#"
// registry of handlers
namespace app {
class Registry {
public:
    // lookup by name
    int find(const char *name) {
        /* linear scan */
        static const int ids[] = {1, 2, 3};
        return ids[0];
    }
    struct Entry { int id; };
};
}
typedef struct { int a; } Pair;
int Registry_test_lookup() { return 0; }
"#;
    let chunker = Chunker::new(ChunkerConfig::strict()).unwrap();
    let chunks = chunker.extract(code.as_bytes(), "registry.cpp", "cpp").chunks;
    assert!(!chunks.is_empty());

    for (i, a) in chunks.iter().enumerate() {
        for (j, b) in chunks.iter().enumerate() {
            if i == j {
                continue;
            }
            let lines_within = a.start_line <= b.start_line && b.end_line <= a.end_line;
            assert!(
                !(lines_within && a.content.contains(b.content.as_str())),
                "{:?} contains {:?}",
                a.display_name(),
                b.display_name()
            );
        }
    }
    assert!(chunks.windows(2).all(|w| w[0].start_line <= w[1].start_line));
}

#[test]
fn concurrent_extraction_matches_sequential() {
    let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
    let sources = [
        ("a.c", "struct A { int x; };\nint a(void) { return 0; }\n"),
        ("b.cpp", "class B { void b() {} };\n// tail\n"),
        ("c.h", "static const int t[] = {1};\n"),
    ];
    let sequential: Vec<Vec<Chunk>> = sources
        .iter()
        .map(|(name, code)| {
            let ext = name.rsplit('.').next().unwrap();
            chunker.extract(code.as_bytes(), name, ext).chunks
        })
        .collect();

    let concurrent: Vec<Vec<Chunk>> = std::thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .map(|(name, code)| {
                let chunker = chunker.clone();
                scope.spawn(move || {
                    let ext = name.rsplit('.').next().unwrap();
                    chunker.extract(code.as_bytes(), name, ext).chunks
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, concurrent);
}
