// Command-line front end for oxihuff.
//
// Subcommands map onto the library: `compress` builds a tree from the input
// byte frequencies and frames the payload, `decompress` reverses it, and
// `inspect` prints the code table stored in an artifact's header.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::codec::{DecodeOptions, HuffDecoder, HuffEncoder};
use crate::tree::{self, FrequencyTable, build_tree};

const BUF_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Huffman stream compressor/decompressor.
#[derive(Parser, Debug)]
#[command(
    name = "oxihuff",
    version,
    about = "Huffman stream compressor/decompressor",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Compress an input stream.
    Compress(StreamArgs),
    /// Decompress an input stream.
    Decompress(DecompressArgs),
    /// Print the code table stored in a compressed file's header.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct StreamArgs {
    /// Input file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DecompressArgs {
    #[command(flatten)]
    stream: StreamArgs,

    /// Fail if the input ends before its end-of-stream code.
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Compressed input file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Compress,
    Decompress,
    Inspect,
}

#[derive(Debug, Clone)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    use_stdout: bool,
    strict: bool,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

fn resolve_options(cli: Cli) -> Options {
    let mut opts = Options {
        command: Command::Compress,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        use_stdout: false,
        strict: false,
        input_file: None,
        output_file: None,
    };

    let stream = match cli.command {
        Cmd::Compress(args) => args,
        Cmd::Decompress(args) => {
            opts.command = Command::Decompress;
            opts.strict = args.strict;
            args.stream
        }
        Cmd::Inspect(args) => {
            opts.command = Command::Inspect;
            opts.input_file = Some(args.input);
            return opts;
        }
    };

    opts.use_stdout = stream.stdout;
    opts.input_file = stream.input.or(stream.input_pos);
    opts.output_file = stream.output.or(stream.output_pos);
    opts
}

// ---------------------------------------------------------------------------
// I/O plumbing
// ---------------------------------------------------------------------------

fn open_input(opts: &Options) -> Result<Box<dyn Read>, String> {
    match &opts.input_file {
        Some(path) => File::open(path)
            .map(|f| Box::new(BufReader::with_capacity(BUF_SIZE, f)) as Box<dyn Read>)
            .map_err(|e| format!("input file: {}: {e}", path.display())),
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn open_output(opts: &Options) -> Result<Box<dyn Write>, String> {
    match (opts.use_stdout, &opts.output_file) {
        (true, _) | (_, None) => Ok(Box::new(BufWriter::with_capacity(
            BUF_SIZE,
            io::stdout().lock(),
        ))),
        (false, Some(path)) => {
            if path.exists() && !opts.force {
                return Err(format!(
                    "output file exists, use -f to overwrite: {}",
                    path.display()
                ));
            }
            File::create(path)
                .map(|f| Box::new(BufWriter::with_capacity(BUF_SIZE, f)) as Box<dyn Write>)
                .map_err(|e| format!("output file: {}: {e}", path.display()))
        }
    }
}

fn report_json(value: serde_json::Value) {
    match serde_json::to_string_pretty(&value) {
        Ok(s) => eprintln!("{s}"),
        Err(e) => eprintln!("oxihuff: json error: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Compress command
// ---------------------------------------------------------------------------

fn cmd_compress(opts: &Options) -> Result<(), String> {
    let mut reader = open_input(opts)?;
    let mut data = Vec::new();
    reader
        .read_to_end(&mut data)
        .map_err(|e| format!("read error: {e}"))?;

    let freqs = FrequencyTable::from_bytes(&data);
    let tree = build_tree(&freqs).map_err(|e| format!("tree error: {e}"))?;

    let writer = open_output(opts)?;
    let encoder = HuffEncoder::new(writer, &tree).map_err(|e| format!("encode error: {e}"))?;
    let (_, stats) = encoder
        .encode_all(&data)
        .map_err(|e| format!("encode error: {e}"))?;

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "oxihuff: compress: input size: {}, output size: {}, symbols: {}, tree depth: {}",
            stats.input_bytes,
            stats.output_bytes(),
            freqs.distinct(),
            tree.depth()
        );
    }

    if opts.json_output {
        report_json(serde_json::json!({
            "command": "compress",
            "input_size": stats.input_bytes,
            "output_size": stats.output_bytes(),
            "header_size": stats.header_bytes,
            "payload_bits": stats.payload_bits,
            "padding_bits": stats.padding_bits,
            "distinct_symbols": freqs.distinct(),
        }));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Decompress command
// ---------------------------------------------------------------------------

fn cmd_decompress(opts: &Options) -> Result<(), String> {
    let reader = open_input(opts)?;
    let decode_opts = DecodeOptions {
        strict: opts.strict,
    };
    let mut decoder =
        HuffDecoder::with_options(reader, decode_opts).map_err(|e| format!("decode error: {e}"))?;

    let mut writer = open_output(opts)?;
    let total = decoder
        .decode_to(&mut writer)
        .map_err(|e| format!("decode error: {e}"))?;
    writer
        .flush()
        .map_err(|e| format!("write flush error: {e}"))?;

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "oxihuff: decompress: output size: {total}, end marker: {}",
            decoder.end_marker_seen()
        );
    }

    if opts.json_output {
        report_json(serde_json::json!({
            "command": "decompress",
            "output_size": total,
            "payload_bits": decoder.payload_bits(),
            "end_marker_seen": decoder.end_marker_seen(),
        }));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Inspect command
// ---------------------------------------------------------------------------

fn cmd_inspect(path: &Path, opts: &Options) -> Result<(), String> {
    let file = File::open(path).map_err(|e| format!("input file: {}: {e}", path.display()))?;
    let mut reader = BufReader::new(file);
    let tree = tree::read_tree(&mut reader).map_err(|e| format!("{}: {e}", path.display()))?;
    let table = tree.encoding_table();

    if opts.json_output {
        let codes: serde_json::Map<String, serde_json::Value> = table
            .iter()
            .map(|(symbol, code)| (symbol.to_string(), code.to_string().into()))
            .collect();
        report_json(serde_json::json!({
            "command": "inspect",
            "leaves": tree.leaf_count(),
            "depth": tree.depth(),
            "codes": codes,
        }));
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut print = || -> io::Result<()> {
        writeln!(out, "leaves: {}", tree.leaf_count())?;
        writeln!(out, "depth: {}", tree.depth())?;
        for (symbol, code) in table.iter() {
            let label = symbol.to_string();
            writeln!(out, "{label:>6}  {:>3}  {code}", code.len())?;
        }
        Ok(())
    };
    print().map_err(|e| format!("write error: {e}"))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let mut opts = resolve_options(cli);

    let default_filter = match opts.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    // Warn if -c overrides output filename.
    if opts.use_stdout
        && !opts.quiet
        && let Some(path) = opts.output_file.take()
    {
        eprintln!(
            "oxihuff: warning: -c option overrides output filename: {}",
            path.display()
        );
    }

    let result = match (opts.command, opts.input_file.clone()) {
        (Command::Compress, _) => cmd_compress(&opts),
        (Command::Decompress, _) => cmd_decompress(&opts),
        (Command::Inspect, Some(path)) => cmd_inspect(&path, &opts),
        (Command::Inspect, None) => Err("inspect requires an input file".into()),
    };

    match result {
        Ok(()) => process::exit(0),
        Err(msg) => {
            eprintln!("oxihuff: {msg}");
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

    fn parse_opts(args: &[&str]) -> Options {
        let argv: Vec<String> = std::iter::once("oxihuff".to_string())
            .chain(args.iter().map(|s| s.to_string()))
            .collect();
        let cli = Cli::try_parse_from(argv).expect("cli parse failed");
        resolve_options(cli)
    }

    #[test]
    fn compress_subcommand_maps_correctly() {
        let opts = parse_opts(&["compress", "in.txt", "out.huf"]);
        assert_eq!(opts.command, Command::Compress);
        assert_eq!(opts.input_file, Some(PathBuf::from("in.txt")));
        assert_eq!(opts.output_file, Some(PathBuf::from("out.huf")));
        assert!(!opts.strict);
    }

    #[test]
    fn long_form_paths() {
        let opts = parse_opts(&["compress", "--input", "a", "--output", "b"]);
        assert_eq!(opts.input_file, Some(PathBuf::from("a")));
        assert_eq!(opts.output_file, Some(PathBuf::from("b")));
    }

    #[test]
    fn decompress_subcommand_maps_correctly() {
        let opts = parse_opts(&["--quiet", "decompress", "--strict", "in.huf", "out.txt"]);
        assert_eq!(opts.command, Command::Decompress);
        assert!(opts.strict);
        assert!(opts.quiet);
        assert_eq!(opts.input_file, Some(PathBuf::from("in.huf")));
        assert_eq!(opts.output_file, Some(PathBuf::from("out.txt")));
    }

    #[test]
    fn global_stdio_and_force_flags() {
        let opts = parse_opts(&["--force", "compress", "--stdout", "in", "out"]);
        assert!(opts.use_stdout);
        assert!(opts.force);
    }

    #[test]
    fn verbose_is_capped() {
        let opts = parse_opts(&["-vvvv", "compress"]);
        assert_eq!(opts.verbose, 2);
        assert_eq!(opts.input_file, None);
    }

    #[test]
    fn inspect_maps_input() {
        let opts = parse_opts(&["--json", "inspect", "x.huf"]);
        assert_eq!(opts.command, Command::Inspect);
        assert!(opts.json_output);
        assert_eq!(opts.input_file, Some(PathBuf::from("x.huf")));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let argv = ["oxihuff", "-q", "-v", "compress"];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
