use clap::Parser;
use color_eyre::eyre::{
    Result,
    eyre,
};
use std::path::{
    Path,
    PathBuf,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::{
    EnvFilter,
    fmt,
};
use url::Url;

use card_storefront::provider::{
    NODE_URL_ENV,
    ProviderSettings,
};

mod client;
mod ui;

#[derive(Parser, Debug)]
#[command(
    name = "storefront",
    version,
    about = "Browse, list and buy NBA trading cards on Sepolia",
    long_about = None
)]
struct Args {
    /// Foundry keystore to unlock and sign with
    #[arg(long)]
    wallet: Option<String>,

    /// Keystore directory (defaults to ~/.foundry/keystores)
    #[arg(long)]
    wallet_dir: Option<String>,

    /// RPC endpoint used together with --wallet
    #[arg(long)]
    rpc_url: Option<Url>,

    /// Node that manages its own accounts
    #[arg(long, env = NODE_URL_ENV)]
    node_url: Option<Url>,

    #[arg(long, default_value = "./logs")]
    log_dir: PathBuf,
}

/// Logs go to a daily file because the terminal belongs to the UI.
fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    let appender = rolling::daily(log_dir, "storefront.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| eyre!("failed to initialize tracing: {e}"))?;
    Ok(guard)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let _guard = init_tracing(&args.log_dir)?;
    tracing::info!("starting card storefront");
    let config = client::AppConfig {
        provider: ProviderSettings {
            wallet: args.wallet,
            wallet_dir: args.wallet_dir,
            rpc_url: args.rpc_url,
            node_url: args.node_url,
        },
    };
    client::run_app(config).await
}
