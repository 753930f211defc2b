use modelex::{languages, Registry};

static SAMPLES: [&str; 3] = [
    "square = (x) -> x * x\n# the answer\n",
    "function add(a, b) {\n  return a + b;\n}\n",
    "name = 'world'\nconsole.log `${name}`\n",
];

fn main() {
    env_logger::init();
    let mut registry = Registry::new();
    languages::register_all(&mut registry).expect("bundled grammars compile");
    for sample in SAMPLES {
        match registry.detect(sample) {
            Some(detection) => {
                print!("{} ({})", detection.language, detection.relevance);
                if let Some((runner_up, relevance)) = detection.second_best {
                    print!(", runner up {runner_up} ({relevance})");
                }
                println!();
            }
            None => println!("no languages registered"),
        }
    }
}
