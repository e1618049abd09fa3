//! CLI for inspecting serialized containers.
//!
//! Usage:
//!   arrayshim <file>              # Decode a container payload stored in a file
//!   arrayshim -e "payload"        # Decode a payload given on the command line
//!   arrayshim --drivers           # List available storage drivers
//!   arrayshim                     # Start REPL (one payload per line, `.get <index>` reads)
//!
//! Settings are read from the file named by `ARRAYSHIM_CONFIG`, if set. Log output goes to
//! stderr at `warn` and above; `RUST_LOG` overrides.

use arrayshim::runner::ds::array_object::ArrayObject;
use arrayshim::runner::ds::value::HostValue;
use arrayshim::runner::plugin::config::HostConfig;
use arrayshim::runner::plugin::types::HostContext;
use arrayshim::runner::std_lib::drivers::available_drivers;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process;
use std::rc::Rc;

fn main() {
    env_logger::Builder::new()
        .filter_module("arrayshim", log::LevelFilter::Warn)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let args: Vec<String> = env::args().collect();

    match args.len() {
        1 => {
            run_repl();
        }
        2 => {
            let arg = &args[1];
            if arg == "-h" || arg == "--help" {
                print_usage();
                process::exit(0);
            }
            if arg == "--drivers" {
                for driver in available_drivers() {
                    println!("{}", driver);
                }
                process::exit(0);
            }
            run_file(arg);
        }
        3 if args[1] == "-e" || args[1] == "--eval" => {
            decode_payload(args[2].trim());
        }
        _ => {
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("arrayshim - container payload inspector");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  arrayshim <file>              Decode a container payload stored in a file");
    eprintln!("  arrayshim -e \"payload\"        Decode a payload");
    eprintln!("  arrayshim --eval \"payload\"    Decode a payload");
    eprintln!("  arrayshim --drivers           List available storage drivers");
    eprintln!("  arrayshim                     Start REPL (interactive mode)");
}

/// Builds the context from `ARRAYSHIM_CONFIG`. Diagnostics go where `[diagnostics] mode`
/// says: the log, a buffer printed after each command, or nowhere.
fn build_context() -> Rc<HostContext> {
    let config = match env::var("ARRAYSHIM_CONFIG") {
        Ok(path) => match HostConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        },
        Err(_) => HostConfig::default(),
    };
    HostContext::from_config(&config).shared()
}

fn run_file(filename: &str) {
    let payload = match fs::read_to_string(filename) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", filename, e);
            process::exit(1);
        }
    };
    decode_payload(payload.trim_end_matches(&['\r', '\n'][..]));
}

fn decode_payload(payload: &str) {
    let ctx = build_context();
    match ArrayObject::from_payload(ctx.clone(), payload) {
        Ok(container) => print_container(&container),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
    print_diagnostics(&ctx);
}

fn print_container(container: &ArrayObject) {
    println!("flags:    {}", container.get_flags().bits());
    println!("mode:     {}", container.storage_mode());
    println!("storage:  {}", container.storage_value());
    match container.overlay() {
        Some(overlay) => {
            let members: Vec<String> = overlay
                .to_entries()
                .iter()
                .map(|(k, v)| format!("{} => {}", k, v))
                .collect();
            println!("overlay:  [{}]", members.join(", "));
        }
        None => println!("overlay:  []"),
    }
    println!("iterator: {}", container.get_iterator_class());
}

/// Prints what a collecting sink buffered. Other modes have nothing to drain.
fn print_diagnostics(ctx: &HostContext) {
    for diagnostic in ctx.drain_diagnostics() {
        eprintln!("warning: {}", diagnostic);
    }
}

fn read_entry(container: Option<&ArrayObject>, index: &str) {
    let container = match container {
        Some(container) => container,
        None => {
            eprintln!("No container decoded yet");
            return;
        }
    };
    match container.offset_get(&HostValue::from(index)) {
        Ok(value) => println!("{}", value),
        Err(e) => eprintln!("{}", e),
    }
}

fn run_repl() {
    println!("arrayshim v0.1.0 - container payload inspector");
    println!("Paste a serialized container and press Enter. Type .get <index> to read an");
    println!("entry of the last container, .exit to quit.");
    println!();

    let ctx = build_context();
    let mut last: Option<ArrayObject> = None;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut input = String::new();
        match stdin.read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }

        let input = input.trim();

        if input == ".exit" || input == ".quit" {
            break;
        }

        if input.is_empty() {
            continue;
        }

        if let Some(index) = input.strip_prefix(".get ") {
            read_entry(last.as_ref(), index.trim());
        } else {
            match ArrayObject::from_payload(ctx.clone(), input) {
                Ok(container) => {
                    print_container(&container);
                    last = Some(container);
                }
                Err(e) => eprintln!("{}", e),
            }
        }
        print_diagnostics(&ctx);
    }

    println!("Goodbye!");
}
