//! Command-line interface for language-css
//! Converts the CSS grammar between CSON and JSON, seeds the sample stylesheet and prints the
//! tokens the grammar produces for a file.
//!
//! Usage:
//!   language-css prepare                                  - Convert the grammar and seed the sample
//!   language-css convert [INPUT] [-o OUTPUT] [--to json|cson] - Convert a grammar file
//!   language-css tokenize [PATH] [-f json|yaml|simple]    - Tokenize a stylesheet
//!
//! Every command accepts `--config <file>`; without it `language-css.toml` in the working
//! directory is used when present.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Arg, ArgMatches, Command};
use tracing::info;

use language_css::convert::{self, SeedOutcome};
use language_css::cson;
use language_css::harness::{load_css_grammar, tokenize_text};
use language_css::output::TokenFormat;
use language_css::settings::{HarnessConfig, Loader};
use language_css::{Error, Result};

const LOCAL_CONFIG: &str = "language-css.toml";

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let matches = Command::new("language-css")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build and test harness for the CSS TextMate grammar")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_name("FILE")
                .help("Configuration file layered over the built-in defaults"),
        )
        .subcommand(
            Command::new("prepare")
                .about("Convert the CSON grammar to JSON and seed the sample stylesheet"),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert a grammar between CSON and JSON")
                .arg(
                    Arg::new("input")
                        .help("Grammar to convert (defaults to the configured CSON grammar)")
                        .index(1),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_name("FILE")
                        .help("Write to FILE instead of stdout"),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_parser(["json", "cson"])
                        .default_value("json")
                        .help("Target format"),
                ),
        )
        .subcommand(
            Command::new("tokenize")
                .about("Tokenize a stylesheet with the CSS grammar")
                .arg(
                    Arg::new("path")
                        .help("Stylesheet to tokenize (defaults to the configured sample)")
                        .index(1),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .value_parser(clap::builder::ValueParser::new(
                            |s: &str| s.parse::<TokenFormat>(),
                        ))
                        .help("Output format: json, yaml or simple"),
                ),
        )
        .get_matches();

    if let Err(e) = run(&matches) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;

    match matches.subcommand() {
        Some(("prepare", _)) => handle_prepare_command(&config),
        Some(("convert", convert_matches)) => {
            let input = convert_matches
                .get_one::<String>("input")
                .map(PathBuf::from)
                .unwrap_or_else(|| config.paths.grammar_source.clone());
            let output = convert_matches.get_one::<String>("output").map(PathBuf::from);
            let to_cson = convert_matches
                .get_one::<String>("to")
                .is_some_and(|to| to == "cson");
            handle_convert_command(&input, output.as_deref(), to_cson)
        }
        Some(("tokenize", tokenize_matches)) => {
            let path = tokenize_matches
                .get_one::<String>("path")
                .map(PathBuf::from)
                .unwrap_or_else(|| config.paths.sample.clone());
            handle_tokenize_command(&config, &path)
        }
        _ => unreachable!(),
    }
}

/// Defaults, then the config file, then command line settings.
fn load_config(matches: &ArgMatches) -> Result<HarnessConfig> {
    let mut loader = match matches.get_one::<String>("config") {
        Some(path) => Loader::new().with_file(path),
        None => Loader::new().with_optional_file(LOCAL_CONFIG),
    };
    if let Some(("tokenize", tokenize_matches)) = matches.subcommand() {
        if let Some(format) = tokenize_matches.get_one::<TokenFormat>("format") {
            loader = loader.set_override("output.format", format.name())?;
        }
    }
    Ok(loader.build()?)
}

/// Handle the prepare command
fn handle_prepare_command(config: &HarnessConfig) -> Result<()> {
    let report = convert::prepare(config)?;
    println!(
        "Converted {} -> {}",
        config.paths.grammar_source.display(),
        report.grammar_json.display()
    );
    match report.seed {
        SeedOutcome::Created => println!("Seeded {}", report.sample.display()),
        SeedOutcome::AlreadyPresent => println!("Kept existing {}", report.sample.display()),
    }
    Ok(())
}

/// Handle the convert command
fn handle_convert_command(input: &Path, output: Option<&Path>, to_cson: bool) -> Result<()> {
    if !to_cson {
        if let Some(output) = output {
            convert::convert_file(input, output)?;
            info!(output = %output.display(), "converted grammar");
            return Ok(());
        }
        let value = convert::read_cson(input)?;
        print!("{}", cson::to_json_string(&value)?);
        return Ok(());
    }

    let text = fs::read_to_string(input).map_err(|source| Error::Io {
        path: input.to_path_buf(),
        source,
    })?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let rendered = cson::to_cson_string(&value);
    match output {
        Some(output) => fs::write(output, rendered).map_err(|source| Error::Io {
            path: output.to_path_buf(),
            source,
        }),
        None => {
            print!("{}", rendered);
            Ok(())
        }
    }
}

/// Handle the tokenize command
fn handle_tokenize_command(config: &HarnessConfig, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let grammar = load_css_grammar(config)?;
    let lines = tokenize_text(&grammar, &text);
    print!("{}", config.output.format.render(&lines)?);
    Ok(())
}
