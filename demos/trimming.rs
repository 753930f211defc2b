use lliw::Fg;
use modelex::{languages, trim, Registry, TokOpt};

pub static CODE: &str = r#"greet = (name) -> print "你你 #{name}" # turn your back on me"#;

fn main() {
    env_logger::init();
    let mut registry = Registry::new();
    languages::register_all(&mut registry).expect("bundled grammars compile");
    let result = registry.highlight("coffee", CODE).expect("coffee is registered");
    // Take the first line and scroll it 25 columns to the right
    let line = result.lines().into_iter().next().unwrap_or_default();
    let tokens = trim(&line, 25);
    println!("{:?}", tokens);
    for token in &tokens {
        // Tokens can either require highlighting or not require highlighting
        match token {
            // This is some text that needs to be highlighted
            TokOpt::Some(text, kind) => print!("{}{text}{}", colour(kind), Fg::Reset),
            // This is just normal text with no highlighting
            TokOpt::None(text) => print!("{text}"),
        }
    }
    println!();
}

fn colour(name: &str) -> Fg {
    match name {
        "comment" => Fg::LightBlack,
        "number" => Fg::Purple,
        "string" => Fg::Green,
        "subst" => Fg::LightPurple,
        "literal" => Fg::Blue,
        "keyword" => Fg::Yellow,
        "function" | "title" => Fg::Red,
        "built_in" => Fg::LightBlue,
        _ => Fg::Reset,
    }
}
