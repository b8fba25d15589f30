//! Command-line interface for subtree-spec
//! Parses RFC 3672 subtree specifications and prints them in canonical or serialized form.
//!
//! Usage:
//!   subtree-spec `<spec>`... [--format `<format>`]   - Parse each argument
//!   subtree-spec --stdin                            - Parse one specification per input line
//!   subtree-spec `<spec>` --tokens                   - Dump the token stream instead
//!
//! Set `RUST_LOG=subtree_spec=debug` to trace the parser.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::io::{self, BufRead};
use std::process::ExitCode;
use subtree_spec::subtree::config::{Loader, PROJECT_CONFIG_FILE};
use subtree_spec::subtree::formats::{render, render_tokens, OutputFormat};
use subtree_spec::subtree::lexing::tokenize;
use subtree_spec::subtree::{SubtreeSpecConfig, SubtreeSpecificationParser};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let matches = Command::new("subtree-spec")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parse RFC 3672 subtree specifications")
        .arg(
            Arg::new("spec")
                .help("Subtree specification to parse, e.g. '{ base \"ou=People\" }'")
                .num_args(0..)
                .required_unless_present("stdin")
                .index(1),
        )
        .arg(
            Arg::new("stdin")
                .long("stdin")
                .help("Read one specification per line from standard input")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format (default taken from the configuration: text)")
                .value_parser(value_parser!(OutputFormat)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file layered over the built-in defaults (default: ./subtree-spec.toml if present)"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Reject specifications that repeat a component")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .help("Print the token stream instead of the parsed value")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config = match load_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let format = matches
        .get_one::<OutputFormat>("format")
        .copied()
        .unwrap_or(config.output.format);

    let mut inputs: Vec<String> = matches
        .get_many::<String>("spec")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    if matches.get_flag("stdin") {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => inputs.push(line),
                Err(e) => {
                    eprintln!("Error reading standard input: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    let parser = SubtreeSpecificationParser::with_config(config.parser);
    let mut failed = false;
    for input in &inputs {
        let outcome = if matches.get_flag("tokens") {
            handle_tokens_command(input, format)
        } else {
            handle_parse_command(&parser, input, format)
        };
        match outcome {
            Ok(output) => println!("{}", output),
            Err(message) => {
                eprintln!("{}", message);
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Defaults, then the `--config` file, then flags.
fn load_config(matches: &ArgMatches) -> Result<SubtreeSpecConfig, config::ConfigError> {
    let mut loader = match matches.get_one::<String>("config") {
        Some(path) => Loader::new().with_file(path),
        None => Loader::new().with_optional_file(PROJECT_CONFIG_FILE),
    };
    if matches.get_flag("strict") {
        loader = loader.set_override("parser.duplicate_components", "reject")?;
    }
    loader.build()
}

/// Parse one input and render the result
fn handle_parse_command(
    parser: &SubtreeSpecificationParser,
    input: &str,
    format: OutputFormat,
) -> Result<String, String> {
    let spec = parser.parse(input).map_err(|e| format!("Error: {}", e))?;
    render(spec.as_ref(), format).map_err(|e| format!("Error formatting output: {}", e))
}

/// Tokenize one input and render the tokens
fn handle_tokens_command(input: &str, format: OutputFormat) -> Result<String, String> {
    let tokens = tokenize(input).map_err(|e| format!("Error: {}", e))?;
    render_tokens(&tokens, format).map_err(|e| format!("Error formatting tokens: {}", e))
}
