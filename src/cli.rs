// Command-line front end for CTF.
//
// JSON in, CTF out (and back), plus an `optimize` report that shows what
// the encoder would decide for a given document.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::{
    analyze, choose_delimiter, decode_with_options, encode_with_options,
    estimate_reference_savings, get_stats, recommend_strategy, DecodeOptions, Delimiter,
    EncodeOptions, Error, OptimizeLevel, Result, Toggle, Value,
};

/// Characters of encoded output shown by `optimize`.
const PREVIEW_CHARS: usize = 500;

/// Reference estimate above which `optimize` recommends references.
const REFERENCE_RECOMMEND_THRESHOLD: i64 = 50;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// CTF (Compressed Text Format) encoder/decoder.
#[derive(Parser, Debug)]
#[command(
    name = "ctf",
    version,
    about = "Token-efficient text encoding for JSON data",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Verbose logging (-v for debug, -vv for trace).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Encode JSON to CTF.
    Encode(EncodeArgs),
    /// Decode CTF to JSON.
    Decode(DecodeArgs),
    /// Analyze JSON and show the encoder's recommendations.
    Optimize(OptimizeArgs),
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Input JSON file (`-` or omitted: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(short = 'o', long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Tabular delimiter: pipe, comma, tab or auto.
    #[arg(long, default_value = "auto")]
    delimiter: Delimiter,

    /// Reference compression: on, off or auto.
    #[arg(long, default_value = "auto", conflicts_with = "no_references")]
    references: Toggle,

    /// Disable reference compression.
    #[arg(long)]
    no_references: bool,

    /// Columnar encoding of large arrays: on, off or auto.
    #[arg(long, default_value = "auto")]
    columnar: Toggle,

    /// Optimization level: none, balanced or aggressive.
    #[arg(long, default_value = "balanced")]
    optimize: OptimizeLevel,

    /// Spaces per nesting level.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    indent: u32,

    /// Print size statistics to stderr.
    #[arg(long)]
    stats: bool,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Input CTF file (`-` or omitted: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(short = 'o', long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,

    /// Skip blank rows and pad short rows instead of failing.
    #[arg(long)]
    lenient: bool,
}

#[derive(Args, Debug)]
struct OptimizeArgs {
    /// Input JSON file (`-` for stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

impl EncodeArgs {
    fn options(&self) -> EncodeOptions {
        let references = if self.no_references {
            Toggle::Off
        } else {
            self.references
        };
        EncodeOptions::new()
            .with_indent(self.indent)
            .with_delimiter(self.delimiter)
            .with_references(references)
            .with_columnar(self.columnar)
            .with_optimize(self.optimize)
    }
}

impl DecodeArgs {
    fn options(&self) -> DecodeOptions {
        DecodeOptions::new().with_strict(!self.lenient)
    }
}

// ---------------------------------------------------------------------------
// I/O helpers
// ---------------------------------------------------------------------------

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .map_err(|e| Error::io(&format!("{}: {}", path.display(), e))),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| Error::io(&format!("stdin: {}", e)))?;
            Ok(text)
        }
    }
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, text).map_err(|e| Error::io(&format!("{}: {}", path.display(), e)))?;
            log::info!("wrote {} bytes to {}", text.len(), path.display());
            Ok(())
        }
        None => {
            let mut out = io::stdout().lock();
            writeln!(out, "{}", text).map_err(|e| Error::io(&format!("stdout: {}", e)))
        }
    }
}

fn parse_json(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| Error::parse(format!("invalid JSON input: {}", e)))
}

/// First `limit` characters of `text` and the number of characters left out.
fn preview(text: &str, limit: usize) -> (&str, usize) {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => (&text[..cut], text[cut..].chars().count()),
        None => (text, 0),
    }
}

fn delimiter_name(delimiter: Delimiter) -> &'static str {
    match delimiter {
        Delimiter::Pipe => "pipe (|)",
        Delimiter::Comma => "comma (,)",
        Delimiter::Tab => "tab (\\t)",
        Delimiter::Auto => "auto",
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_encode(args: &EncodeArgs) -> Result<()> {
    let input = read_input(args.input.as_deref())?;
    let value = parse_json(&input)?;
    let encoded = encode_with_options(&value, &args.options());

    if args.stats {
        let stats = get_stats(&input, &encoded);
        eprintln!("Statistics:");
        eprintln!("  JSON size:   {} bytes", stats.original_bytes);
        eprintln!("  CTF size:    {} bytes", stats.encoded_bytes);
        eprintln!("  Savings:     {:.1}%", stats.savings_percent);
        eprintln!("  References:  {}", stats.reference_count);
    }

    write_output(args.output.as_deref(), &encoded)
}

fn cmd_decode(args: &DecodeArgs) -> Result<()> {
    let input = read_input(args.input.as_deref())?;
    let value = decode_with_options(&input, &args.options())?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .map_err(Error::custom)?;

    write_output(args.output.as_deref(), &json)
}

fn cmd_optimize(args: &OptimizeArgs) -> Result<()> {
    let value = parse_json(&read_input(Some(&args.input))?)?;
    let analysis = analyze(&value);
    let strategy = recommend_strategy(&analysis);
    let delimiter = choose_delimiter(&analysis);
    let use_references = estimate_reference_savings(&analysis) > REFERENCE_RECOMMEND_THRESHOLD;

    let options = EncodeOptions::new()
        .with_delimiter(delimiter)
        .with_references(use_references);
    let encoded = encode_with_options(&value, &options);
    let (head, rest) = preview(&encoded, PREVIEW_CHARS);

    let rule = "=".repeat(50);
    let mut report = vec![
        "Optimization Recommendations:".to_string(),
        rule,
        format!("Strategy:         {}", strategy),
        format!("Delimiter:        {}", delimiter_name(delimiter)),
        format!("Use references:   {}", use_references),
        format!("Total arrays:     {}", analysis.total_arrays),
        format!("Tabular arrays:   {}", analysis.tabular_candidates),
        format!("Columnar arrays:  {}", analysis.columnar_candidates),
        format!("Repeated strings: {}", analysis.repeated_values.len()),
        format!("Estimated tokens: {}", analysis.estimated_tokens),
        String::new(),
        "Example encoding with recommendations:".to_string(),
        "-".repeat(50),
        head.to_string(),
    ];
    if rest > 0 {
        report.push(format!("\n... ({} more characters)", rest));
    }

    write_output(None, &report.join("\n"))
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    builder.format_timestamp(None).format_target(false);
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }
    builder.init();
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

pub fn run() -> ! {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Cmd::Encode(args) => cmd_encode(args),
        Cmd::Decode(args) => cmd_decode(args),
        Cmd::Optimize(args) => cmd_optimize(args),
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("ctf: {}", e);
            process::exit(1);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let argv: Vec<String> = std::iter::once("ctf".to_string())
            .chain(args.iter().map(|s| s.to_string()))
            .collect();
        Cli::try_parse_from(argv).expect("cli parse failed")
    }

    fn encode_args(args: &[&str]) -> EncodeArgs {
        match parse(args).command {
            Cmd::Encode(args) => args,
            other => panic!("expected encode, got {:?}", other),
        }
    }

    #[test]
    fn encode_defaults() {
        let args = encode_args(&["encode", "in.json"]);
        assert_eq!(args.input.as_deref(), Some(Path::new("in.json")));
        assert_eq!(args.options(), EncodeOptions::default());
        assert!(!args.stats);
    }

    #[test]
    fn encode_flags_map_to_options() {
        let args = encode_args(&[
            "encode",
            "-",
            "--delimiter",
            "tab",
            "--references",
            "on",
            "--columnar",
            "off",
            "--optimize",
            "aggressive",
            "--indent",
            "4",
        ]);
        let options = args.options();
        assert_eq!(options.delimiter, Delimiter::Tab);
        assert_eq!(options.references, Toggle::On);
        assert_eq!(options.columnar, Toggle::Off);
        assert_eq!(options.optimize, OptimizeLevel::Aggressive);
        assert_eq!(options.indent, 4);
    }

    #[test]
    fn no_references_forces_off() {
        let args = encode_args(&["encode", "--no-references"]);
        assert_eq!(args.options().references, Toggle::Off);
    }

    #[test]
    fn references_conflicts_with_no_references() {
        let argv = ["ctf", "encode", "--references", "on", "--no-references"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn rejects_zero_indent() {
        assert!(Cli::try_parse_from(["ctf", "encode", "--indent", "0"]).is_err());
        assert_eq!(encode_args(&["encode", "--indent", "1"]).options().indent, 1);
    }

    #[test]
    fn rejects_unknown_delimiter() {
        let argv = ["ctf", "encode", "--delimiter", "semicolon"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn decode_lenient_flag() {
        match parse(&["decode", "x.ctf", "--lenient", "--pretty", "-v"]).command {
            Cmd::Decode(args) => {
                assert!(!args.options().strict);
                assert!(args.pretty);
            }
            other => panic!("expected decode, got {:?}", other),
        }
    }

    #[test]
    fn preview_counts_remaining_chars() {
        assert_eq!(preview("abc", 5), ("abc", 0));
        assert_eq!(preview("abcdef", 4), ("abcd", 2));
        assert_eq!(preview("ééé", 1), ("é", 2));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        assert!(matches!(parse_json("{nope"), Err(Error::Parse { .. })));
        assert_eq!(parse_json("[1, 2]").unwrap(), crate::ctf!([1, 2]));
    }
}
