//! reqban CLI — check ban rule files and try them against requests.
//!
//! # Usage
//!
//! ```bash
//! reqban check rules/example.yaml --strict
//! reqban eval rules/example.yaml --port 8080 --protocol http
//! reqban explain rules/example.json --path /img/a.png -H 'User-Agent: spider' --host x.edu
//! ```
//!
//! Rule files ending in `.json` are read as JSON, anything else as YAML.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use reqban::{AttrValue, Compiled, CompileOptions, Compiler, RequestSnapshot};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "reqban")]
#[command(version)]
#[command(about = "Compile ban rules and evaluate requests against them", long_about = None)]
struct Cli {
    /// Log compiler and store activity at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a rule file and report warnings
    Check {
        #[command(flatten)]
        rules: RulesArgs,
    },
    /// Print the verdict for one request
    Eval {
        #[command(flatten)]
        rules: RulesArgs,
        #[command(flatten)]
        request: RequestArgs,
    },
    /// Print the evaluation trace for one request
    Explain {
        #[command(flatten)]
        rules: RulesArgs,
        #[command(flatten)]
        request: RequestArgs,
    },
}

#[derive(Args)]
struct RulesArgs {
    /// Rule file (.json, or YAML otherwise)
    rules: PathBuf,

    /// Treat warnings (empty AND/OR) as errors
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Default)]
struct RequestArgs {
    /// Request path
    #[arg(long)]
    path: Option<String>,

    /// Host name
    #[arg(long)]
    host: Option<String>,

    /// Port number
    #[arg(long)]
    port: Option<u16>,

    /// Protocol (e.g. http, https:)
    #[arg(long)]
    protocol: Option<String>,

    /// Header as `name:value` (repeatable)
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
    headers: Vec<String>,

    /// Extension attribute as `key=value` (repeatable)
    #[arg(short = 'a', long = "attr", value_name = "KEY=VALUE")]
    attributes: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check { rules } => cmd_check(&rules),
        Commands::Eval { rules, request } => cmd_eval(&rules, &request),
        Commands::Explain { rules, request } => cmd_explain(&rules, &request),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_check(args: &RulesArgs) -> Result<()> {
    let compiled = compile_file(args)?;
    for warning in &compiled.warnings {
        println!("warning: {warning}");
    }
    println!(
        "{}: {} rules OK (max depth {})",
        args.rules.display(),
        compiled.ruleset.len(),
        compiled.ruleset.depth()
    );
    Ok(())
}

fn cmd_eval(args: &RulesArgs, request: &RequestArgs) -> Result<()> {
    let ruleset = compile_file(args)?.ruleset;
    let req = build_request(request)?;
    println!("{}", ruleset.evaluate(&req));
    Ok(())
}

fn cmd_explain(args: &RulesArgs, request: &RequestArgs) -> Result<()> {
    let ruleset = compile_file(args)?.ruleset;
    let req = build_request(request)?;
    println!("{}", ruleset.evaluate_with_trace(&req));
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rule loading
// ═══════════════════════════════════════════════════════════════════════════════

fn compile_file(args: &RulesArgs) -> Result<Compiled> {
    tracing::debug!(path = %args.rules.display(), strict = args.strict, "loading rules");
    let raw = load_rules(&args.rules)?;
    let options = CompileOptions {
        strict: args.strict,
        ..CompileOptions::default()
    };
    Compiler::new(options)
        .compile(&raw)
        .with_context(|| format!("invalid rules in \"{}\"", args.rules.display()))
}

fn load_rules(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read \"{}\"", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).context("JSON parse error")
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(&content).context("YAML parse error")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Request assembly
// ═══════════════════════════════════════════════════════════════════════════════

fn build_request(args: &RequestArgs) -> Result<RequestSnapshot> {
    let mut builder = RequestSnapshot::builder();
    if let Some(path) = &args.path {
        builder = builder.path(path.as_str());
    }
    if let Some(host) = &args.host {
        builder = builder.host(host.as_str());
    }
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    if let Some(protocol) = &args.protocol {
        builder = builder.protocol(protocol.as_str());
    }
    for header in &args.headers {
        let (name, value) = parse_header(header)?;
        builder = builder.header(name, value);
    }
    for attribute in &args.attributes {
        let (key, value) = parse_attribute(attribute)?;
        builder = builder.attribute(key, value);
    }
    Ok(builder.build())
}

fn parse_header(raw: &str) -> Result<(&str, &str)> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("invalid header \"{raw}\", expected name:value");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("invalid header \"{raw}\", name is empty");
    }
    Ok((name, value.trim()))
}

/// Values that are exactly an integer's decimal form become integers.
fn parse_attribute(raw: &str) -> Result<(&str, AttrValue)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("invalid attribute \"{raw}\", expected key=value");
    };
    if key.is_empty() {
        bail!("invalid attribute \"{raw}\", key is empty");
    }
    let value = match value.parse::<i64>() {
        Ok(i) if i.to_string() == value => AttrValue::Int(i),
        _ => AttrValue::from(value),
    };
    Ok((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn example(file: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("rules")
            .join(file)
    }

    fn rules_args(file: &str) -> RulesArgs {
        RulesArgs {
            rules: example(file),
            strict: true,
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_eval_flags() {
        let cli = Cli::try_parse_from([
            "reqban",
            "eval",
            "rules.yaml",
            "--port",
            "8080",
            "-H",
            "User-Agent: spider",
            "-H",
            "Accept: */*",
            "-a",
            "method=POST",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Eval { rules, request } = cli.command else {
            panic!("expected eval");
        };
        assert_eq!(rules.rules, PathBuf::from("rules.yaml"));
        assert!(!rules.strict);
        assert_eq!(request.port, Some(8080));
        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.attributes, vec!["method=POST".to_string()]);
    }

    #[test]
    fn parse_header_pairs() {
        assert_eq!(
            parse_header("User-Agent: Mozilla/5.0").unwrap(),
            ("User-Agent", "Mozilla/5.0")
        );
        assert_eq!(parse_header("x-time:12:30").unwrap(), ("x-time", "12:30"));
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn parse_attribute_pairs() {
        assert_eq!(
            parse_attribute("content-length=512").unwrap(),
            ("content-length", AttrValue::Int(512))
        );
        assert_eq!(
            parse_attribute("zip=00501").unwrap(),
            ("zip", AttrValue::Str("00501".into()))
        );
        assert_eq!(
            parse_attribute("method=").unwrap(),
            ("method", AttrValue::Str(String::new()))
        );
        assert!(parse_attribute("method").is_err());
        assert!(parse_attribute("=POST").is_err());
    }

    #[test]
    fn example_files_compile_strictly() {
        for file in ["example.yaml", "example.json"] {
            let compiled = compile_file(&rules_args(file)).unwrap();
            assert_eq!(compiled.ruleset.len(), 5, "{file}");
            assert!(compiled.warnings.is_empty());
        }
    }

    #[test]
    fn eval_example_request() {
        let ruleset = compile_file(&rules_args("example.yaml")).unwrap().ruleset;
        let request = RequestArgs {
            path: Some("/img/photo.jpg".into()),
            host: Some("lib.university.edu".into()),
            headers: vec!["User-Agent: SomeSpiderBot".into()],
            ..RequestArgs::default()
        };
        let verdict = ruleset.evaluate(&build_request(&request).unwrap());
        assert_eq!(verdict.to_string(), "BAN rule 3 (edu-image-spider)");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_rules(Path::new("/nonexistent/rules.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
