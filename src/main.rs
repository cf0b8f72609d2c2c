// SPDX-License-Identifier: CC0-1.0

//! Command-line driver: parse arguments, set up logging, walk the block
//! files and write the addresses out.

use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;

use addrdump::{scan_block_dir, Network};
use anyhow::Context;
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract receiving addresses from Bitcoin Core blk*.dat block files", long_about = None)]
struct Args {
    /// Network whose block files are being scanned.
    #[arg(short, long, value_enum, default_value = "testnet")]
    network: NetworkOpt,

    /// Directory containing the blk*.dat files (e.g. ~/.bitcoin/blocks).
    #[arg(short = 'p', long = "db-path", value_name = "DIR", default_value = ".")]
    db_path: PathBuf,

    /// File the extracted addresses are written to.
    #[arg(short, long, value_name = "FILE", default_value = "addresses.txt")]
    out_file: PathBuf,

    /// Log debug details (per-block hashes).
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum NetworkOpt {
    Mainnet,
    Testnet,
    Regtest,
}

impl From<NetworkOpt> for Network {
    fn from(opt: NetworkOpt) -> Self {
        match opt {
            NetworkOpt::Mainnet => Network::Bitcoin,
            NetworkOpt::Testnet => Network::Testnet,
            NetworkOpt::Regtest => Network::Regtest,
        }
    }
}

fn set_up_logging(level: log::LevelFilter) -> anyhow::Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_seconds(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(stdout())
        .apply()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    set_up_logging(level)?;

    let out = File::create(&args.out_file)
        .with_context(|| format!("unable to open {}", args.out_file.display()))?;
    let mut out = BufWriter::new(out);

    let summary = scan_block_dir(&args.db_path, args.network.into(), &mut out)?;
    out.flush()?;

    log::info!(
        "processing finished: {} blocks in {} block files",
        summary.blocks,
        summary.files
    );
    Ok(())
}
