use clap::{ArgAction, CommandFactory, Parser};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use protostream_compiler::error::ProtoError;
use protostream_compiler::{compile_file, parse_reader, GenOptions, ProtobufProfile};

#[derive(Parser)]
#[command(name = "protostream")]
#[command(about = "Generate streaming Rust types from a protostream IDL file", long_about = None)]
struct Cli {
    /// Input schema file
    schema: Option<PathBuf>,

    /// Output `.rs` file (if omitted, prints to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the parsed schema as JSON instead of Rust code
    #[arg(long)]
    ast: bool,

    /// Let a second `close()` on a streaming type close its channels again
    #[arg(long)]
    fatal_double_close: bool,

    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli, input: &Path) -> Result<(), ProtoError> {
    let text = if cli.ast {
        let schema = parse_reader(File::open(input)?)?;
        serde_json::to_string_pretty(&schema).map_err(std::io::Error::from)? + "\n"
    } else {
        let options = GenOptions {
            idempotent_close: !cli.fatal_double_close,
        };
        let (_schema, code) = compile_file(input, &ProtobufProfile::default(), &options)?;
        code
    };

    if let Some(out_path) = &cli.output {
        fs::write(out_path, &text)?;
        info!(input = %input.display(), output = %out_path.display(), "generated code written");
    } else {
        print!("{}", text);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(input) = cli.schema.as_deref() else {
        println!("specify a schema file to compile");
        println!("{}", Cli::command().render_usage());
        return;
    };

    // Failures are reported, not turned into an exit code.
    if let Err(err) = run(&cli, input) {
        eprintln!("{}", err);
    }
}
