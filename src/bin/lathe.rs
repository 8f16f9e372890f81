// The lathe CLI: read a Metamath database, write it back out with
// canonical labels and compressed, canonically ordered proofs.

use std::fs;
use std::process;

use clap::Parser;
use lathe::error::Result;
use lathe::syntax::{reader, writer};
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(
    name = "lathe",
    about = "Rewrites a Metamath database in canonical form",
    version = env!("CARGO_PKG_VERSION")
)]
struct Args {
    /// The database to read
    #[clap(value_name = "INPUT")]
    input: String,

    /// Where to write the rewritten database
    #[clap(value_name = "OUTPUT")]
    output: String,
}

fn run(args: &Args) -> Result<()> {
    let text = fs::read_to_string(&args.input)?;
    let db = reader::read_database(&text)?;
    tracing::info!(
        "{}: {} constants, {} variables, {} assertions",
        args.input,
        db.constants().len(),
        db.variables().len(),
        db.assertions().len()
    );
    fs::write(&args.output, writer::write_database(&db))?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
