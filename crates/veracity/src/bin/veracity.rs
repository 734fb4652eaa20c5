use anyhow::Result;
use clap::Parser;
use mimalloc::MiMalloc;
use veracity::cli::{self, Cli};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_tracing(&cli);
    cli::run(&cli).await
}
