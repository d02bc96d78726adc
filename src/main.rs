use logquarry::{Container, Session};
use std::io::{self, Read};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let session = match run(&config) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    match &config.output {
        Some(path) => {
            if let Err(err) = session.dump(path) {
                eprintln!("error: failed to write '{path}': {err}");
                std::process::exit(1);
            }
        }
        None => println!("{session}"),
    }
}

struct CliConfig {
    /// (container name, representative, pattern) triples, in CLI order.
    patterns: Vec<(String, String, String)>,
    file: Option<String>,
    output: Option<String>,
    infer_type: bool,
}

fn run(config: &CliConfig) -> logquarry::Result<Session> {
    let mut schema = Container::new("CliSession").infer_type(config.infer_type);
    for (name, representative, pattern) in &config.patterns {
        schema = schema.sub(
            Container::new(name)
                .pattern(pattern)
                .representative(representative)
                .infer_type(config.infer_type),
        );
    }

    match &config.file {
        Some(path) => schema.parse_path(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            schema.parse_str(&buffer)
        }
    }
}

fn parse_args() -> Result<CliConfig, String> {
    let mut patterns: Vec<(String, String, String)> = Vec::new();
    let mut representative = String::new();
    let mut file: Option<String> = None;
    let mut output: Option<String> = None;
    let mut infer_type = true;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("logquarry {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--no-infer" => infer_type = false,
            "-p" | "--pattern" => {
                let value = args.next().ok_or_else(|| "error: --pattern expects a value".to_string())?;
                let name = format!("Pattern{}", patterns.len() + 1);
                patterns.push((name, std::mem::take(&mut representative), value));
            }
            "-r" | "--representative" => {
                let value =
                    args.next().ok_or_else(|| "error: --representative expects a value".to_string())?;
                representative = value;
            }
            "-o" | "--output" => {
                let value = args.next().ok_or_else(|| "error: --output expects a value".to_string())?;
                output = Some(value);
            }
            _ if arg.starts_with("--pattern=") => {
                let value = arg.trim_start_matches("--pattern=").to_string();
                let name = format!("Pattern{}", patterns.len() + 1);
                patterns.push((name, std::mem::take(&mut representative), value));
            }
            _ if arg.starts_with("--representative=") => {
                representative = arg.trim_start_matches("--representative=").to_string();
            }
            _ if arg.starts_with("--output=") => {
                output = Some(arg.trim_start_matches("--output=").to_string());
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                if file.is_some() {
                    return Err("error: input file provided multiple times".to_string());
                }
                file = Some(arg);
            }
        }
    }

    if patterns.is_empty() {
        return Err(format!("error: at least one --pattern is required\n\n{}", help_text()));
    }
    if !representative.is_empty() {
        return Err("error: --representative must be followed by a --pattern".to_string());
    }

    Ok(CliConfig { patterns, file, output, infer_type })
}

fn help_text() -> String {
    format!(
        "logquarry {version}

Declarative log-parsing CLI: mine a JSON tree out of a log file using
regex patterns with named capturing groups.

Usage:
  logquarry [OPTIONS] -p <pattern>... [FILE]

Options:
  -p, --pattern <regex>         Pattern with named capturing groups, e.g.
                                'mother:\\s(?P<mother>.*)'. Repeatable.
  -r, --representative <name>   Group the next pattern's captures under
                                <name> in the output tree.
  -o, --output <path>           Write the JSON tree to a file instead of
                                stdout.
  --no-infer                    Keep captured values as raw strings.
  -h, --help                    Show this help message.
  -V, --version                 Print version information.

Reads FILE, or stdin when no file is given.

Exit codes:
  0  Success.
  1  Configuration or parse error.
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION")
    )
}
