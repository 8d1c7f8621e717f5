// scorecard - compile a rule file and score inputs against it

use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::process;

use log::debug;
use scorecard::config::{apply_case, parse_binding, InputFile, RunReport, Variables};
use scorecard::RuleCompiler;

fn main() {
    // Initialize logging
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program_name = args.first().map_or("scorecard", String::as_str);

    if args.len() < 2 {
        print_usage(program_name);
        process::exit(1);
    }

    let mut rules_file = "";
    let mut inputs_file: Option<&str> = None;
    let mut cli_vars = Variables::new();
    let mut lowercase = false;
    let mut dump = false;
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--inputs" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --inputs requires a filename");
                    process::exit(1);
                }
                inputs_file = Some(args[i + 1].as_str());
                i += 2;
            }
            "--var" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --var requires name=value");
                    process::exit(1);
                }
                match parse_binding(&args[i + 1]) {
                    Ok((name, value)) => {
                        cli_vars.insert(name, value);
                    }
                    Err(err) => {
                        eprintln!("Error: {}", err);
                        process::exit(1);
                    }
                }
                i += 2;
            }
            "--lowercase" => {
                lowercase = true;
                i += 1;
            }
            "--dump" => {
                dump = true;
                i += 1;
            }
            "-v" | "--verbose" => {
                verbose = true;
                i += 1;
            }
            "-h" | "--help" => {
                print_usage(program_name);
                process::exit(0);
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option '{}'", arg);
                print_usage(program_name);
                process::exit(1);
            }
            _ => {
                if rules_file.is_empty() {
                    rules_file = &args[i];
                } else {
                    eprintln!("Error: Multiple rule files specified");
                    process::exit(1);
                }
                i += 1;
            }
        }
    }

    if rules_file.is_empty() {
        eprintln!("Error: No rule file specified");
        print_usage(program_name);
        process::exit(1);
    }

    // Read source file
    let source = match fs::read_to_string(rules_file) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Error reading '{}': {}", rules_file, err);
            process::exit(1);
        }
    };

    // Compile
    let program = match RuleCompiler::new().compile(&source) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("Compilation error: {}", err);
            process::exit(1);
        }
    };

    if verbose {
        println!(
            "Compiled {} to {} instructions",
            rules_file,
            program.instructions().len()
        );
    }

    if dump {
        if let Err(err) = program.dump(&mut io::stdout()) {
            eprintln!("Error writing dump: {}", err);
            process::exit(1);
        }
    }

    // Collect the binding sets to run
    let mut runs = Vec::new();
    if let Some(path) = inputs_file {
        match InputFile::load(Path::new(path)) {
            Ok(mut file) => {
                file.lowercase |= lowercase;
                runs.extend(file.bindings());
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                process::exit(1);
            }
        }
    }
    if !cli_vars.is_empty() || (runs.is_empty() && !dump) {
        runs.push(apply_case(cli_vars, lowercase));
    }
    debug!("running {} input sets", runs.len());

    for (n, vars) in runs.iter().enumerate() {
        if verbose {
            println!("# input {}", n + 1);
        }

        let scores = match program.run(vars) {
            Ok(scores) => scores,
            Err(err) => {
                eprintln!("Error in input {}: {}", n + 1, err);
                process::exit(1);
            }
        };

        let report = RunReport {
            input: vars,
            scores: &scores,
        };
        match report.to_toml() {
            Ok(text) => println!("{}", text),
            Err(err) => {
                eprintln!("Error: {}", err);
                process::exit(1);
            }
        }
    }
}

fn print_usage(program_name: &str) {
    println!("Usage: {} [options] <rules-file>", program_name);
    println!();
    println!("Options:");
    println!("  --inputs <file.toml>   Run every [[input]] table in the file");
    println!("  --var <name=value>     Bind a variable (repeatable)");
    println!("  --lowercase            Lowercase all bound values");
    println!("  --dump                 Print the compiled instruction table");
    println!("  -v, --verbose          Verbose output");
    println!("  -h, --help             Show this help message");
    println!();
    println!("Set RUST_LOG=debug or RUST_LOG=trace to follow compilation and execution.");
    println!();
    println!("Examples:");
    println!(
        "  {} classify.rules --inputs articles.toml    # Score a batch of articles",
        program_name
    );
    println!(
        "  {} classify.rules --var title=\"Cricket\"     # Score one ad-hoc input",
        program_name
    );
    println!(
        "  {} classify.rules --dump                    # Show compiled instructions",
        program_name
    );
}
