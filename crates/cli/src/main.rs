use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use actai_core::llm::{BackendCheck, BackendClients};
use actai_core::orchestrator::{normalize_ticker, Orchestrator};

const CHECK_PROMPT: &str = "Reply with the single word: ready";

#[derive(Debug, Parser)]
#[command(name = "actai_cli", about = "Run the four-agent analysis for one ticker")]
struct Args {
    /// Stock ticker to analyze. Defaults to AAPL.
    #[arg(long, short)]
    ticker: Option<String>,

    /// Print the report on a single line instead of pretty-printed JSON.
    #[arg(long)]
    compact: bool,

    /// Send a short prompt to each agent's backend and report which ones answer.
    #[arg(long, conflicts_with = "ticker")]
    check_backends: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = actai_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if args.check_backends {
        if let Err(err) = check_backends(&settings).await {
            sentry_anyhow::capture_anyhow(&err);
            return Err(err);
        }
        return Ok(());
    }

    let ticker = normalize_ticker(args.ticker.as_deref());

    if let Err(err) = run(&settings, &ticker, args.compact).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(%ticker, error = %err, "analysis run failed");
        return Err(err);
    }
    Ok(())
}

async fn run(
    settings: &actai_core::config::Settings,
    ticker: &str,
    compact: bool,
) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::from_settings(settings)?;
    let report = orchestrator.analyze(ticker).await;

    let out = if compact {
        serde_json::to_string(&report)
    } else {
        serde_json::to_string_pretty(&report)
    }
    .context("failed to serialize composite report")?;

    println!("{out}");
    Ok(())
}

async fn check_backends(settings: &actai_core::config::Settings) -> anyhow::Result<()> {
    let clients = BackendClients::from_settings(settings)?;
    let checks = clients.check(CHECK_PROMPT).await;
    for check in &checks {
        println!("{}", check_line(check));
    }

    let failed = checks.iter().filter(|c| !c.healthy()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} backends failed the check", checks.len());
    }
    Ok(())
}

fn check_line(check: &BackendCheck) -> String {
    let verdict = if check.healthy() {
        "ok".to_string()
    } else {
        format!("FAILED ({})", check.reply)
    };
    format!("{:<15} {:<28} {verdict}", check.role, check.label)
}

fn init_sentry(settings: &actai_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
