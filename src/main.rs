use std::fs;

use clap::Parser;
use octava::interpreter::evaluator::{core::Evaluator, mathml::MathMLDisplay};

/// octava is an interpreter for a matrix-oriented numeric language with
/// MATLAB/Octave surface syntax.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Tells octava to read a file instead of an inline script.
    #[arg(short, long)]
    file: bool,

    /// Emits every displayed result as a presentation-MathML fragment
    /// instead of plain text.
    #[arg(short, long)]
    mathml: bool,

    contents: String,
}

fn main() {
    let args = Args::parse();

    let script = if args.file {
        fs::read_to_string(&args.contents).unwrap_or_else(|_| {
            eprintln!("Failed to read the input file '{}'. Perhaps this file does not exist?",
                      &args.contents);
            std::process::exit(1);
        })
    } else {
        args.contents
    };

    let mut evaluator = Evaluator::new();

    if args.mathml {
        let parsed = match evaluator.parse(&script) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(evaluator.exit_status.code());
            },
        };
        match evaluator.evaluate(&parsed) {
            Ok(Some(value)) => match evaluator.unparse_value_mathml(&value, MathMLDisplay::Block)
            {
                Ok(fragment) => println!("{fragment}"),
                Err(e) => eprintln!("{e}"),
            },
            Ok(None) => {},
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(evaluator.exit_status.code());
            },
        }
        return;
    }

    match evaluator.run_display(&script) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
        },
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(evaluator.exit_status.code());
        },
    }
}
