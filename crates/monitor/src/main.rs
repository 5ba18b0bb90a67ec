//! lendmirror: replay a ledger fixture and print the position snapshot

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use lendmirror_common::{parse_units, Address};
use lendmirror_monitor::{FixtureLedger, MonitorConfig, MonitorResult, RefreshOutcome, RefreshScheduler};
use serde::Serialize;
use serde_json::json;
use tracing::info;

#[derive(Parser)]
#[command(name = "lendmirror")]
#[command(about = "Mirror a lending position from raw ledger state")]
struct Cli {
    /// JSON fixture with raw ledger values
    fixture: PathBuf,

    /// TOML monitor configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Account to mirror
    #[arg(long, default_value = "0x0000000000000000000000000000000000000000")]
    account: Address,

    /// Preview borrowing this many borrow tokens, e.g. "25.5"
    #[arg(long)]
    borrow: Option<String>,

    /// Preview withdrawing this many collateral shares
    #[arg(long)]
    withdraw: Option<String>,
}

fn preview_json<T: Serialize>(result: MonitorResult<T>) -> serde_json::Value {
    match result {
        Ok(preview) => json!({ "ok": preview }),
        Err(e) => json!({ "error": e.code(), "message": e.to_string() }),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lendmirror=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MonitorConfig::load(path)?,
        None => MonitorConfig::default(),
    };

    let ledger = FixtureLedger::load(&cli.fixture, config.decimals)
        .with_context(|| format!("loading fixture {}", cli.fixture.display()))?;
    let decimals = config.decimals;

    info!(fixture = %cli.fixture.display(), account = %cli.account, "replaying fixture");
    let scheduler = RefreshScheduler::new(Arc::new(ledger), config, cli.account)?;

    match scheduler.refresh_now().await {
        RefreshOutcome::Published(_) => {}
        RefreshOutcome::Failed(e) => bail!("ledger read failed: {}", e),
        other => bail!("refresh did not publish: {:?}", other),
    }

    let state = scheduler.store().current();
    let Some(snapshot) = state.snapshot else {
        bail!("no snapshot published");
    };

    let mut output = json!({
        "fingerprint": snapshot.fingerprint_hex(),
        "actionable": snapshot.is_actionable(),
        "snapshot": &*snapshot,
    });

    if let Some(amount) = &cli.borrow {
        let amount = parse_units(amount, decimals.borrow)?;
        output["borrow_preview"] = preview_json(snapshot.preview_borrow(&amount));
    }
    if let Some(shares) = &cli.withdraw {
        let shares = parse_units(shares, decimals.shares)?;
        output["withdraw_preview"] = preview_json(snapshot.preview_withdraw(&shares));
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
