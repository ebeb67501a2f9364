mod cli;

use std::time::Duration;

use btcrpc_core::{util, RpcClient};
use clap::Parser;
use eyre::{eyre, WrapErr};

const NODE_VERSION_COMMAND: &str = "node-version";

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_level(true)
        .init();

    let rpc = RpcClient::builder(&args.rpc_user, &args.rpc_password)
        .host(args.host.clone())
        .port(args.port)
        .timeout(Duration::from_secs(args.timeout_secs))
        .reject_empty_credentials(args.strict_credentials)
        .build()
        .context("build RPC client")?;

    let outcome = run(&rpc, &args).await;

    if args.stats {
        let stats = rpc.stats();
        eprintln!(
            "calls: total={} success={} error={}",
            stats.total, stats.success, stats.error
        );
    }

    outcome
}

async fn run(rpc: &RpcClient, args: &cli::Cli) -> eyre::Result<()> {
    if args.method == NODE_VERSION_COMMAND {
        let version = util::node_version(rpc)
            .await
            .wrap_err_with(|| format!("query node version at {}", rpc.url()))?;
        println!("{version}");
        return Ok(());
    }

    let params = args.params.iter().map(String::as_str).map(parse_param).collect();
    let resp = rpc
        .call(&args.method, params)
        .await
        .wrap_err_with(|| format!("call `{}` at {}", args.method, rpc.url()))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&resp).context("encode response envelope")?
    );

    match &resp.error {
        Some(err) => Err(eyre!("RPC error {}: {}", err.code, err.message)),
        None => Ok(()),
    }
}

/// `100` and `true` go out as JSON scalars; a bare block hash goes out as a
/// string.
fn parse_param(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_owned()))
}
