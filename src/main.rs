use std::env;
use std::io;
use std::path::Path;
use std::process;

use loxide::{Lox, EXIT_USAGE};

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut stdout = io::stdout();
    let mut lox = Lox::new(&mut stdout);

    let code = match args.len() {
        1 => {
            if let Err(err) = lox.run_prompt() {
                eprintln!("{err}");
                1
            } else {
                0
            }
        }
        2 => match lox.run_file(Path::new(&args[1])) {
            Ok(code) => code,
            Err(err) => {
                eprintln!("Could not read file '{}': {err}", args[1]);
                1
            }
        },
        _ => {
            eprintln!("Usage: loxide [script]");
            EXIT_USAGE
        }
    };

    process::exit(code);
}
