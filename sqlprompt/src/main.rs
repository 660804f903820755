use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod cmd;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // before parsing, so `env =` arguments and RUST_LOG see `.env` values
    let dotenv = common::config::load_dotenv();
    let args = cmd::Cli::parse();
    args.execute(dotenv).await
}
