//! The `rasc` command-line tool.

use rascc::commands::{check_file, parse_run_options, print_ir, run_file};
use rascc::ExecModel;

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "check" => {
            if args.len() < 3 {
                eprintln!("Usage: rasc check <file>");
                std::process::exit(1);
            }
            check_file(&args[2]);
        }
        "ir" => {
            let mut model = ExecModel::Direct;
            let mut path = None;
            for arg in args.iter().skip(2) {
                if arg == "--indirect" {
                    model = ExecModel::Indirect;
                } else if !arg.starts_with('-') && path.is_none() {
                    path = Some(arg.as_str());
                }
            }
            let Some(path) = path else {
                eprintln!("Usage: rasc ir <file> [--indirect]");
                std::process::exit(1);
            };
            print_ir(path, model);
        }
        "run" => match parse_run_options(&args[2..]) {
            Ok(options) => run_file(&options),
            Err(message) => {
                eprintln!("error: {message}");
                eprintln!();
                eprintln!("Usage: rasc run <file> --size WxH [options]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --step <s>           World step on both axes (default: 1)");
                eprintln!("  --var <name=value>   Set an image-scope variable");
                eprintln!("  --fill <name=value>  Fill a source image with a constant");
                eprintln!("  --seed <n>           Seed for rand() and randInt()");
                eprintln!("  --threads <n>        Worker threads (default: automatic)");
                std::process::exit(1);
            }
        },
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("rasc - raster script compiler");
    println!();
    println!("Usage: rasc <command> [options]");
    println!();
    println!("Commands:");
    println!("  check <file>                  Compile a script and report diagnostics");
    println!("  ir <file> [--indirect]        Print the lowered script");
    println!("  run <file> --size WxH [...]   Evaluate a script over in-memory images");
    println!();
    println!("Set RASC_LOG (e.g. RASC_LOG=rasc_eval=debug) to enable logging.");
}

/// Hierarchical logging to stderr, filtered by `RASC_LOG`. Off when unset.
fn init_tracing() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    if std::env::var_os("RASC_LOG").is_none() {
        return;
    }
    let filter = EnvFilter::from_env("RASC_LOG");
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_tree::HierarchicalLayer::new(2)
                .with_writer(std::io::stderr)
                .with_targets(true)
                .with_bracketed_fields(true),
        )
        .init();
}
