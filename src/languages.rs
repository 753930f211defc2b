//! Bundled grammars.
//!
//! These grammars classify text with the following names:
//!
//! keyword - a keyword for that language
//! built_in - a built in function, global or type
//! literal - a literal value such as `true` or `null`
//! comment - a comment (both multiline and single line)
//! string - a string data type
//! subst - an interpolation inside a string
//! number - a number
//! regexp - a regular expression literal
//! function - a function definition
//! title - the name being defined
//! params - a parameter list
//! class - a class definition
//!
//! Regions written in another language are classified with that language's name.

use crate::common;
use crate::error::GrammarError;
use crate::keywords::KeywordTable;
use crate::language::Language;
use crate::mode::Mode;
use crate::registry::Registry;
use std::sync::Arc;

/// ECMAScript reserved words
pub const ECMA_KEYWORDS: &[&str] = &[
    "as", "in", "of", "if", "for", "while", "finally", "var", "new", "function", "do", "return",
    "void", "else", "break", "catch", "instanceof", "with", "throw", "case", "default", "try",
    "switch", "continue", "typeof", "delete", "let", "yield", "const", "class", "debugger",
    "async", "await", "static", "import", "from", "export", "extends",
];

pub const ECMA_LITERALS: &[&str] = &["true", "false", "null", "undefined", "NaN", "Infinity"];

pub const ECMA_TYPES: &[&str] = &[
    "Object", "Function", "Boolean", "Symbol", "Math", "Date", "Number", "BigInt", "String",
    "RegExp", "Array", "Float32Array", "Float64Array", "Int8Array", "Uint8Array",
    "Uint8ClampedArray", "Int16Array", "Int32Array", "Uint16Array", "Uint32Array",
    "BigInt64Array", "BigUint64Array", "Set", "Map", "WeakSet", "WeakMap", "ArrayBuffer",
    "SharedArrayBuffer", "Atomics", "DataView", "JSON", "Promise", "Generator",
    "GeneratorFunction", "AsyncFunction", "Reflect", "Proxy", "Intl", "WebAssembly",
];

pub const ECMA_ERROR_TYPES: &[&str] = &[
    "Error", "EvalError", "InternalError", "RangeError", "ReferenceError", "SyntaxError",
    "TypeError", "URIError",
];

pub const ECMA_BUILT_IN_GLOBALS: &[&str] = &[
    "setInterval", "setTimeout", "clearInterval", "clearTimeout", "require", "exports", "eval",
    "isFinite", "isNaN", "parseFloat", "parseInt", "decodeURI", "decodeURIComponent",
    "encodeURI", "encodeURIComponent", "escape", "unescape",
];

pub const ECMA_BUILT_IN_VARIABLES: &[&str] = &[
    "arguments", "this", "super", "console", "window", "document", "localStorage",
    "sessionStorage", "module", "global",
];

const ECMA_IDENT: &str = r"[A-Za-z$_][0-9A-Za-z$_]*";

/// Globals, types and error types together
fn ecma_built_ins() -> impl Iterator<Item = &'static str> {
    ECMA_BUILT_IN_GLOBALS
        .iter()
        .chain(ECMA_TYPES)
        .chain(ECMA_ERROR_TYPES)
        .copied()
}

/// Register every bundled grammar
pub fn register_all(registry: &mut Registry) -> Result<(), GrammarError> {
    registry.register(javascript())?;
    registry.register(coffeescript())?;
    Ok(())
}

/// Obtain the CoffeeScript grammar.
/// Code between backticks is handed to the `javascript` language.
#[allow(clippy::too_many_lines)]
#[must_use]
pub fn coffeescript() -> Language {
    const POSSIBLE_PARAMS: &str = r"(\(.*\)\s*)?\B[-=]>";
    const NOT_VALID: &[&str] = &["var", "const", "let", "function", "static"];
    let coffee_keywords = ["then", "unless", "until", "loop", "by", "when", "and", "or", "is", "isnt", "not"];

    let keyword_words: Vec<&str> = ECMA_KEYWORDS
        .iter()
        .chain(&coffee_keywords)
        .copied()
        .filter(|w| !NOT_VALID.contains(w))
        .collect();
    let built_ins: Vec<&str> = ecma_built_ins().chain(["npm", "print"]).collect();
    let literals: Vec<&str> = ECMA_LITERALS
        .iter()
        .copied()
        .chain(["yes", "no", "on", "off"])
        .collect();
    let keywords = Arc::new(
        KeywordTable::new()
            .add("keyword", &keyword_words)
            .add("built_in", &built_ins)
            .add("literal", &literals),
    );

    let mut lang = Language::new("coffeescript");
    lang.alias("coffee");
    let escape = lang.mode(common::backslash_escape());
    let subst = lang.declare();
    let hash_comment = lang.mode(common::hash_comment());

    let binary = lang.mode(common::binary_number());
    // a division after a number is not the start of a regexp
    let after_number = lang.mode(Mode::new().end(r"(\s*/)?").relevance(0));
    let number = lang.mode(Mode::inherit(&common::c_number(), Mode::new().starts(after_number)));
    let string = lang.mode(
        Mode::new()
            .class("string")
            .keywords(KeywordTable::new())
            .variants(vec![
                Mode::new().begin("'''").end("'''").contains(&[escape]),
                Mode::new().begin("\"\"\"").end("\"\"\"").contains(&[escape, subst]),
                common::apos_string(escape),
                Mode::new().begin("\"").end("\"").contains(&[escape, subst]),
            ]),
    );
    let regexp = lang.mode(
        Mode::new()
            .class("regexp")
            .keywords(KeywordTable::new())
            .variants(vec![
                Mode::new().begin("///").end("///").contains(&[subst, hash_comment]),
                Mode::new().begin(r"//[gim]{0,3}(?!\w)").relevance(0),
                Mode::new().begin(r"/(?![ *]).*?(?![\\])./[gim]{0,3}(?!\w)"),
            ]),
    );
    let member = lang.mode(Mode::new().begin(format!("@{ECMA_IDENT}")));
    let sublang = lang.mode(
        Mode::new()
            .sub_language("javascript")
            .exclude_begin()
            .exclude_end()
            .variants(vec![
                Mode::new().begin("```").end("```"),
                Mode::new().begin("`").end("`"),
            ]),
    );
    let expressions = [binary, number, string, regexp, member, sublang];
    lang.define(
        subst,
        Mode::new()
            .class("subst")
            .begin(r"#\{")
            .end(r"\}")
            .keywords(Arc::clone(&keywords))
            .contains(&expressions),
    );

    let title = lang.mode(common::title(ECMA_IDENT));
    let parens = lang.mode(
        Mode::new()
            .begin(r"\(")
            .end(r"\)")
            .keywords(Arc::clone(&keywords))
            .contains(&expressions)
            .contains_self(),
    );
    let params = lang.mode(
        Mode::new()
            .class("params")
            .begin(r"\([^\(]")
            .return_begin()
            .contains(&[parens]),
    );
    let function = lang.mode(
        Mode::new()
            .class("function")
            .begin(format!(r"^\s*{ECMA_IDENT}\s*=\s*{POSSIBLE_PARAMS}"))
            .end("[-=]>")
            .return_begin()
            .contains(&[title, params]),
    );
    let arrow = lang.mode(
        Mode::new()
            .class("function")
            .begin(POSSIBLE_PARAMS)
            .end("[-=]>")
            .return_begin()
            .contains(&[params]),
    );
    let function_anonym = lang.mode(
        Mode::new()
            .begin(r"[:\(,=]\s*")
            .relevance(0)
            .contains(&[arrow]),
    );
    let extends = lang.mode(
        Mode::new()
            .begin_keywords(&["extends"])
            .ends_with_parent()
            .illegal(r#"[:="\[\]]"#)
            .contains(&[title]),
    );
    let class = lang.mode(
        Mode::new()
            .class("class")
            .begin_keywords(&["class"])
            .end("$")
            .illegal(r#"[:="\[\]]"#)
            .contains(&[extends, title]),
    );
    let label = lang.mode(
        Mode::new()
            .begin(format!("{ECMA_IDENT}:"))
            .end(":")
            .return_begin()
            .return_end()
            .relevance(0),
    );
    let block_comment = lang.mode(common::comment("###", "###"));

    lang.keywords(keywords)
        .contains(&expressions)
        .contains(&[block_comment, hash_comment, function, function_anonym, class, label])
        .illegal(r"/\*");
    lang
}

/// Obtain a compact JavaScript grammar
#[must_use]
pub fn javascript() -> Language {
    let built_ins: Vec<&str> = ecma_built_ins().chain(ECMA_BUILT_IN_VARIABLES.iter().copied()).collect();
    let keywords = Arc::new(
        KeywordTable::new()
            .add("keyword", ECMA_KEYWORDS)
            .add("literal", ECMA_LITERALS)
            .add("built_in", &built_ins),
    );

    let mut lang = Language::new("javascript");
    lang.alias("js");
    let escape = lang.mode(common::backslash_escape());
    let apos = lang.mode(common::apos_string(escape));
    let quote = lang.mode(common::quote_string(escape));
    let number = lang.mode(common::c_number());
    let line_comment = lang.mode(common::c_line_comment());
    let block_comment = lang.mode(common::c_block_comment());
    let subst = lang.declare();
    let template = lang.mode(
        Mode::new()
            .class("string")
            .begin("`")
            .end("`")
            .keywords(KeywordTable::new())
            .contains(&[escape, subst]),
    );
    let expressions = [apos, quote, template, number, line_comment, block_comment];
    lang.define(
        subst,
        Mode::new()
            .class("subst")
            .begin(r"\$\{")
            .end(r"\}")
            .keywords(Arc::clone(&keywords))
            .contains(&expressions),
    );

    let title = lang.mode(common::title(ECMA_IDENT));
    let params = lang.mode(
        Mode::new()
            .class("params")
            .begin(r"\(")
            .end(r"\)")
            .keywords(Arc::clone(&keywords))
            .contains(&expressions),
    );
    let function = lang.mode(
        Mode::new()
            .class("function")
            .begin_keywords(&["function"])
            .end(r"\{")
            .exclude_end()
            .contains(&[title, params]),
    );

    lang.keywords(keywords)
        .contains(&expressions)
        .contains(&[function])
        .illegal(r"#(?![$_A-z])");
    lang
}
