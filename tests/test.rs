use modelex::{
    languages, tokenize, trim, GrammarError, Highlight, KeywordTable, Language, Mode, Options,
    Registry, TokOpt, UnknownLanguage,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn registry() -> Registry {
    init();
    let mut registry = Registry::new();
    languages::register_all(&mut registry).unwrap();
    registry
}

fn some(text: &str, kind: &str) -> TokOpt {
    TokOpt::Some(text.to_string(), kind.to_string())
}

fn none(text: &str) -> TokOpt {
    TokOpt::None(text.to_string())
}

/// Leaves must tile the input exactly
fn assert_covers(result: &Highlight<'_>, input: &str) {
    let mut pos = 0;
    for leaf in result.leaves() {
        assert_eq!(leaf.range.start, pos, "gap or overlap before {:?}", leaf.text);
        assert_eq!(leaf.text, &input[leaf.range.clone()]);
        pos = leaf.range.end;
    }
    assert_eq!(pos, input.len());
    let joined: String = result.leaves().map(|leaf| leaf.text).collect();
    assert_eq!(joined, input);
}

const COFFEE: &str = r##"
# Assignment:
number   = 42
opposite = true

### block
comment ###
square = (x) -> x * x
list = [1, 2, 3, 4, 5]

class Animal extends Base
  move: (meters) ->
    alert "#{@name} moved #{meters}m."

html = `<b>${x}</b>`
pattern = /ab+c/gi
half = 4/2/1
"##;

#[test]
fn totality() {
    let registry = registry();
    let inputs = [
        "",
        "\n",
        COFFEE,
        "\"unterminated #{ (",
        "/* ``` ### '''",
        "你好 = -> '世界'",
        "\u{0}\u{7f}@@@ \\ `",
        "x = ``` a ``` `",
    ];
    for name in ["coffee", "javascript"] {
        for input in inputs {
            let result = registry.highlight(name, input).unwrap();
            assert_covers(&result, input);
        }
    }
}

#[test]
fn determinism() {
    let registry = registry();
    let first = registry.highlight("coffeescript", COFFEE).unwrap();
    let second = registry.highlight("coffeescript", COFFEE).unwrap();
    assert_eq!(first, second);
}

#[test]
fn keywords() {
    init();
    let mut lang = Language::new("tiny");
    lang.keywords(KeywordTable::new().add("keyword", &["if", "else"]));
    let lang = lang.compile().unwrap();
    let result = tokenize("if x else", &lang);
    assert_eq!(
        result.tokens(),
        [some("if", "keyword"), none(" x "), some("else", "keyword")]
    );
    assert_eq!(result.relevance, 2);
    // repeats only count once
    assert_eq!(tokenize("if if if", &lang).relevance, 1);
}

#[test]
fn case_insensitive_keywords() {
    init();
    let mut lang = Language::new("query");
    lang.case_insensitive(true)
        .keywords(KeywordTable::new().add("keyword", &["select", "FROM"]));
    let lang = lang.compile().unwrap();
    assert_eq!(
        tokenize("SELECT a From b", &lang).tokens(),
        [
            some("SELECT", "keyword"),
            none(" a "),
            some("From", "keyword"),
            none(" b"),
        ]
    );
}

#[test]
fn leftmost_match_wins() {
    init();
    let mut lang = Language::new("leftmost");
    let late = lang.mode(Mode::new().class("late").begin("c"));
    let early = lang.mode(Mode::new().class("early").begin("x"));
    lang.contains(&[late, early]);
    let lang = lang.compile().unwrap();
    assert_eq!(
        tokenize("xc", &lang).tokens(),
        [some("x", "early"), some("c", "late")]
    );
}

#[test]
fn same_offset_goes_to_first_declared() {
    init();
    let build = |long_first: bool| {
        let mut lang = Language::new("ties");
        let long = lang.mode(Mode::new().class("long").begin("ab"));
        let short = lang.mode(Mode::new().class("short").begin("a"));
        if long_first {
            lang.contains(&[long, short]);
        } else {
            lang.contains(&[short, long]);
        }
        lang.compile().unwrap()
    };
    assert_eq!(tokenize("ab", &build(true)).tokens(), [some("ab", "long")]);
    assert_eq!(
        tokenize("ab", &build(false)).tokens(),
        [some("a", "short"), none("b")]
    );
}

#[test]
fn end_beats_contains_at_same_offset() {
    init();
    let mut lang = Language::new("ends");
    let inner = lang.mode(Mode::new().class("inner").begin(">"));
    let outer = lang.mode(Mode::new().class("outer").begin("<").end(">").contains(&[inner]));
    lang.contains(&[outer]);
    let lang = lang.compile().unwrap();
    let result = tokenize("<a>>", &lang);
    assert_eq!(result.tokens(), [some("<a>", "outer"), none(">")]);
}

#[test]
fn illegal_aborts_only_the_nested_mode() {
    init();
    let mut lang = Language::new("strings");
    lang.keywords(KeywordTable::new().add("keyword", &["ok"]));
    let string = lang.mode(
        Mode::new()
            .class("string")
            .begin("\"")
            .end("\"")
            .illegal(r"\n")
            .relevance(5),
    );
    lang.contains(&[string]);
    let lang = lang.compile().unwrap();

    let input = "a \"b\nc ok";
    let result = tokenize(input, &lang);
    assert!(result.illegal);
    assert_covers(&result, input);
    assert_eq!(result.tokens(), [none("a \"b\nc "), some("ok", "keyword")]);
    // the aborted string's weight is dropped
    assert_eq!(result.relevance, 1);

    let fine = tokenize("a \"b\" ok", &lang);
    assert!(!fine.illegal);
    assert_eq!(fine.relevance, 6);
}

#[test]
fn illegal_at_top_level_is_plain() {
    let registry = registry();
    let result = registry.highlight("coffee", "/* x */").unwrap();
    assert!(result.illegal);
    assert_eq!(result.tokens(), [none("/* x */")]);
}

#[test]
fn long_inputs_keep_their_highlighting() {
    init();
    let mut lang = Language::new("nested");
    let item = lang.mode(Mode::new().class("item").begin("x"));
    let c = lang.mode(Mode::new().begin("x").return_begin().contains(&[item]));
    let b = lang.mode(Mode::new().begin("x").return_begin().contains(&[c]));
    let a = lang.mode(Mode::new().begin("x").return_begin().contains(&[b]));
    lang.contains(&[a]);
    let lang = lang.compile().unwrap();
    let input = "x;".repeat(25_000);
    let result = tokenize(&input, &lang);
    let items = result
        .tokens()
        .iter()
        .filter(|token| matches!(token, TokOpt::Some(_, kind) if kind == "item"))
        .count();
    assert_eq!(items, 25_000);
    assert!(!result.illegal);
}

#[test]
fn starts_cycle_alternates() {
    init();
    let mut lang = Language::new("pairs");
    let key = lang.declare();
    let value = lang.mode(Mode::new().class("value").end(";").starts(key));
    lang.define(key, Mode::new().class("key").begin(r"\w").end("=").starts(value));
    lang.contains(&[key]);
    let lang = lang.compile().unwrap();
    let result = tokenize("a=1;b=2;", &lang);
    assert_covers(&result, "a=1;b=2;");
    assert_eq!(
        result.tokens(),
        [
            some("a=", "key"),
            some("1;", "value"),
            some("b=", "key"),
            some("2;", "value"),
        ]
    );
}

#[test]
fn self_containing_mode_nests() {
    init();
    let mut lang = Language::new("groups");
    let group = lang.mode(
        Mode::new()
            .class("group")
            .begin(r"\(")
            .end(r"\)")
            .contains_self(),
    );
    lang.contains(&[group]);
    let lang = lang.compile().unwrap();
    let result = tokenize("((a))", &lang);
    assert_covers(&result, "((a))");
    let outer = &result.root.children[0];
    assert_eq!(outer.kind.as_deref(), Some("group"));
    assert_eq!(outer.text, "((a))");
    let texts: Vec<&str> = outer.children.iter().map(|s| s.text).collect();
    assert_eq!(texts, ["(", "(a)", ")"]);
    let inner = &outer.children[1];
    assert_eq!(inner.kind.as_deref(), Some("group"));
    assert_eq!(inner.children.len(), 1);
    assert!(inner.children[0].is_plain());
}

#[test]
fn coffee_function_rescans_its_head() {
    let registry = registry();
    let result = registry.highlight("coffee", "square = (x) -> x * x").unwrap();
    assert_eq!(
        result.tokens(),
        [
            some("square", "title"),
            some(" = ", "function"),
            some("(x)", "params"),
            some(" ->", "function"),
            none(" x * x"),
        ]
    );
    let function = &result.root.children[0];
    assert_eq!(function.kind.as_deref(), Some("function"));
    assert_eq!(function.range, 0..15);
    assert_eq!(result.relevance, 3);
}

#[test]
fn coffee_nested_parameter_parens() {
    let registry = registry();
    let result = registry.highlight("coffee", "f = (a, (b)) -> a").unwrap();
    assert_eq!(
        result.tokens(),
        [
            some("f", "title"),
            some(" = ", "function"),
            some("(a, (b))", "params"),
            some(" ->", "function"),
            none(" a"),
        ]
    );
    let params: Vec<&str> = result.root.children[0]
        .children
        .iter()
        .filter(|s| s.kind.as_deref() == Some("params"))
        .map(|s| s.text)
        .collect();
    assert_eq!(params, ["(a, (b))"]);
    // function, params and both parens frames
    assert_eq!(result.relevance, 4);
}

fn auto_registry(candidates: &[&str], options: Options) -> Registry {
    init();
    let mut registry = Registry::new().with_options(options);
    let mut one = Language::new("one");
    one.keywords(KeywordTable::new().add("keyword", &["a"]));
    let mut two = Language::new("two");
    two.keywords(KeywordTable::new().add("keyword", &["a", "b"]));
    let mut outer = Language::new("outer");
    let fence = outer.mode(
        Mode::new()
            .begin("`")
            .end("`")
            .exclude_begin()
            .exclude_end()
            .sub_language_auto(candidates),
    );
    outer.contains(&[fence]);
    registry.register(one).unwrap();
    registry.register(two).unwrap();
    registry.register(outer).unwrap();
    registry
}

fn embedded_language(registry: &Registry, input: &str) -> Option<String> {
    let result = registry.highlight("outer", input).unwrap();
    assert_covers(&result, input);
    result.root.children[1].kind.clone()
}

#[test]
fn auto_sub_language_picks_best_score() {
    let registry = auto_registry(&["one", "two"], Options::default());
    assert_eq!(embedded_language(&registry, "`a b`").as_deref(), Some("two"));
    // ties go to the first listed language
    assert_eq!(embedded_language(&registry, "`a`").as_deref(), Some("one"));
    let registry = auto_registry(&["two", "one"], Options::default());
    assert_eq!(embedded_language(&registry, "`a`").as_deref(), Some("two"));
    // the fence itself adds nothing, the embedded result is counted
    let result = registry.highlight("outer", "`a b`").unwrap();
    assert_eq!(result.relevance, 2);
}

#[test]
fn auto_sub_language_without_candidates_tries_all() {
    let registry = auto_registry(&[], Options::default());
    assert_eq!(embedded_language(&registry, "`b`").as_deref(), Some("two"));
    assert_eq!(embedded_language(&registry, "`a`").as_deref(), Some("one"));
}

#[test]
fn sub_language_depth_limit() {
    init();
    let mut inner = Language::new("inner");
    inner.keywords(KeywordTable::new().add("variable", &["x"]));
    let mut outer = Language::new("outer");
    let fence = outer.mode(
        Mode::new()
            .class("code")
            .begin("`")
            .end("`")
            .sub_language("inner")
            .exclude_begin()
            .exclude_end(),
    );
    outer.contains(&[fence]);
    let mut registry = Registry::new().with_options(Options::new().max_sub_language_depth(0));
    registry.register(inner).unwrap();
    registry.register(outer).unwrap();

    let result = registry.highlight("outer", "a `x` b").unwrap();
    assert_covers(&result, "a `x` b");
    let code = &result.root.children[1];
    assert_eq!(code.kind.as_deref(), Some("code"));
    assert_eq!(code.children.len(), 1);
    assert!(code.children[0].is_plain());
    assert_eq!(code.children[0].text, "x");
    assert_eq!(
        result.tokens(),
        [none("a `"), some("x", "code"), none("` b")]
    );
}

#[test]
fn sub_language_is_spliced() {
    init();
    let mut inner = Language::new("inner");
    inner.keywords(KeywordTable::new().add("variable", &["x"]));
    let mut outer = Language::new("outer");
    let fence = outer.mode(
        Mode::new()
            .begin("`")
            .end("`")
            .sub_language("inner")
            .exclude_begin()
            .exclude_end(),
    );
    outer.contains(&[fence]);
    let mut registry = Registry::new();
    registry.register(inner).unwrap();
    registry.register(outer).unwrap();

    let result = registry.highlight("outer", "a `x` b").unwrap();
    assert_covers(&result, "a `x` b");
    let children = &result.root.children;
    assert_eq!(children.len(), 3);
    assert_eq!(children[0].text, "a `");
    assert_eq!(children[1].kind.as_deref(), Some("inner"));
    assert_eq!(children[1].range, 3..4);
    // scanning resumes after the closing fence
    assert_eq!(children[2].text, "` b");
    assert_eq!(
        result.tokens(),
        [none("a `"), some("x", "variable"), none("` b")]
    );
    assert_eq!(result.relevance, 1);
}

#[test]
fn unknown_sub_language_stays_plain() {
    init();
    let mut outer = Language::new("outer");
    let fence = outer.mode(Mode::new().begin("`").end("`").sub_language("missing"));
    outer.contains(&[fence]);
    let lang = outer.compile().unwrap();
    assert_eq!(tokenize("a `x` b", &lang).tokens(), [none("a `x` b")]);
}

#[test]
fn coffee_embeds_javascript() {
    let registry = registry();
    let result = registry.highlight("coffee", "`x = 1`").unwrap();
    assert_covers(&result, "`x = 1`");
    assert_eq!(result.root.children[1].kind.as_deref(), Some("javascript"));
    assert_eq!(
        result.tokens(),
        [
            none("`"),
            some("x = ", "javascript"),
            some("1", "number"),
            none("`"),
        ]
    );
}

#[test]
fn coffee_class_definition() {
    let registry = registry();
    let result = registry.highlight("coffee", "class Animal extends Base").unwrap();
    assert_eq!(
        result.tokens(),
        [
            some("class", "keyword"),
            some(" ", "class"),
            some("Animal", "title"),
            some(" ", "class"),
            some("extends", "keyword"),
            some(" ", "class"),
            some("Base", "title"),
        ]
    );
    assert_eq!(result.relevance, 2);
}

#[test]
fn coffee_division_after_number() {
    let registry = registry();
    let result = registry.highlight("coffee", "4/2/1").unwrap();
    assert_eq!(
        result.tokens(),
        [
            some("4", "number"),
            none("/"),
            some("2", "number"),
            none("/"),
            some("1", "number"),
        ]
    );
}

#[test]
fn coffee_labels_are_plain() {
    let registry = registry();
    let result = registry.highlight("coffee", "key: 1").unwrap();
    assert_eq!(result.tokens(), [none("key: "), some("1", "number")]);
}

#[test]
fn detection() {
    let registry = registry();
    let coffee = registry
        .detect("square = (x) -> x * x\n# the answer\n")
        .unwrap();
    assert_eq!(coffee.language, "coffeescript");
    assert_eq!(coffee.relevance, 3);
    assert_eq!(coffee.second_best, Some(("javascript".to_string(), 0)));

    let js = registry
        .detect("function add(a, b) {\n  return a + b;\n}\n")
        .unwrap();
    assert_eq!(js.language, "javascript");
    assert_eq!(js.second_best, Some(("coffeescript".to_string(), 1)));

    assert_eq!(Registry::new().detect("anything"), None);
}

#[test]
fn lines_and_trimming() {
    let registry = registry();
    let result = registry.highlight("coffee", "x = 'a'\ny").unwrap();
    let lines = result.lines();
    assert_eq!(
        lines,
        [vec![none("x = "), some("'a'", "string")], vec![none("y")]]
    );
    assert_eq!(trim(&lines[0], 2), [none("= "), some("'a'", "string")]);
    assert_eq!(trim(&lines[0], 5), [some("a'", "string")]);
}

#[test]
fn errors() {
    init();
    let mut registry = Registry::new();
    let mut broken = Language::new("broken");
    let mode = broken.mode(Mode::new().class("string").begin("[unclosed"));
    broken.contains(&[mode]);
    assert!(matches!(
        registry.register(broken),
        Err(GrammarError::InvalidPattern { field: "begin", .. })
    ));
    assert!(registry.is_empty());
    assert_eq!(
        registry.highlight("broken", "text").unwrap_err(),
        UnknownLanguage::new("broken")
    );
}
