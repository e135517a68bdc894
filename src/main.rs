use anyhow::Result;
use bamcmprs::Args;
use bamcmprs::utils::{format_duration_verbose, throughput};
use clap::Parser;
use env_logger::Env;
use log::info;
use std::time::Instant;

#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let config = args.to_config()?;
    let start = Instant::now();
    info!("bamcmprs: {} vs {}", config.first.display(), config.second.display());

    let stats = bamcmprs::run(&config)?;
    stats.log();

    let elapsed = start.elapsed();
    info!(
        "done in {} ({} records/sec)",
        format_duration_verbose(elapsed),
        throughput(stats.first_records + stats.second_records, elapsed)
    );
    Ok(())
}
