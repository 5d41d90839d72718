use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use omlink_core::{LinkOptions, check_paths, format_path, link_paths};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "omlink")]
#[command(about = "Links OM/HW modules into a single module")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Link(LinkArgs),
    Check(CheckArgs),
    Fmt(FmtArgs),
}

#[derive(Args, Debug)]
struct LinkArgs {
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write the merged module here instead of stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Worker threads; 0 uses every available CPU.
    #[arg(short = 'j', long = "jobs", default_value_t = 0)]
    jobs: usize,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    #[arg(short = 'j', long = "jobs", default_value_t = 0)]
    jobs: usize,
}

#[derive(Args, Debug)]
struct FmtArgs {
    input: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Commands::Link(args) => run_link(args),
        Commands::Check(args) => run_check(args),
        Commands::Fmt(args) => run_fmt(args),
    };

    std::process::exit(exit_code);
}

fn run_link(args: LinkArgs) -> i32 {
    let opts = LinkOptions { jobs: args.jobs };

    match link_paths(&args.inputs, args.output.as_deref(), &opts) {
        Ok(output) => {
            if args.output.is_none() {
                print!("{}", output.text);
            }
            0
        }
        Err(_) => 1,
    }
}

fn run_check(args: CheckArgs) -> i32 {
    let opts = LinkOptions { jobs: args.jobs };

    match check_paths(&args.inputs, &opts) {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

fn run_fmt(args: FmtArgs) -> i32 {
    match format_path(&args.input) {
        Ok(formatted) => {
            print!("{formatted}");
            0
        }
        Err(_) => 1,
    }
}
