use lliw::Fg;
use modelex::{languages, Registry, TokOpt};

pub static CODE: &str = r##"# Assignment:
number   = 42
opposite = true

square = (x) -> x * x

class Animal extends Base
  move: (meters) ->
    alert "#{@name} moved #{meters}m."

hi = `function() { return [document.title, "Hello JavaScript"].join(": "); }`
half = 4/2
"##;

fn main() {
    env_logger::init();
    let mut registry = Registry::new();
    languages::register_all(&mut registry).expect("bundled grammars compile");
    let result = registry.highlight("coffee", CODE).expect("coffee is registered");
    // Render each line with a line number
    for (y, line) in result.lines().iter().enumerate() {
        print!("{}{:>3}{} ", Fg::LightBlack, y + 1, Fg::Reset);
        for token in line {
            match token {
                TokOpt::Some(text, kind) => print!("{}{text}{}", colour(kind), Fg::Reset),
                TokOpt::None(text) => print!("{text}"),
            }
        }
        println!();
    }
    println!("relevance: {}, illegal: {}", result.relevance, result.illegal);
}

fn colour(name: &str) -> Fg {
    match name {
        "comment" => Fg::LightBlack,
        "number" => Fg::Purple,
        "string" | "regexp" => Fg::Green,
        "subst" => Fg::LightPurple,
        "literal" => Fg::Blue,
        "keyword" => Fg::Yellow,
        "function" | "title" | "class" => Fg::Red,
        "built_in" | "javascript" => Fg::LightBlue,
        _ => Fg::Reset,
    }
}
