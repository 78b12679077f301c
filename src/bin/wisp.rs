use std::io::{self, Write};

use clap::Parser as ClapParser;
use log::error;

#[derive(ClapParser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Script to run. Omit to start an interactive shell.
    file: Option<std::path::PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long)]
    no_color: bool,
}

fn report(error: &wisp::error::Error) {
    eprintln!("{error}");
}

fn main() {
    let args = Cli::parse();

    let level = match args.verbose {
        0 => log::Level::Warn,
        1 => log::Level::Info,
        2 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(level).ok();

    if args.no_color {
        colored::control::set_override(false);
    }

    match args.file {
        Some(path) => {
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    error!("could not read file '{}': {e}", path.to_string_lossy());
                    std::process::exit(1);
                }
            };

            let file_name = path.to_string_lossy().to_string();
            let (value, error) = wisp::run(&file_name, &content);

            if let Some(error) = error {
                report(&error);
                std::process::exit(1);
            }

            if let Some(value) = value {
                println!("{}", value.to_repr_string());
            }
        }
        None => run_shell(),
    }
}

fn run_shell() {
    let stdin = io::stdin();
    loop {
        print!("wisp> ");
        io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim_end_matches('\n');

        if line.trim().is_empty() {
            continue;
        }
        if matches!(line.trim(), "quit" | "exit") {
            break;
        }

        let (value, error) = wisp::run("<stdin>", line);

        if let Some(error) = error {
            report(&error);
            continue;
        }

        if let Some(value) = value {
            match &value {
                wisp::value::Value::List(items) if items.borrow().len() == 1 => {
                    println!("{}", items.borrow()[0].to_repr_string());
                }
                other => println!("{}", other.to_repr_string()),
            }
        }
    }
}
