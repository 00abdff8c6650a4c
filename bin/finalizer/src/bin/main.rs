use action::{
    estimate_finalize_withdrawal_gas, finalize_withdrawal, wait_for_receipt, ReceiptStatus,
};
use alloy_primitives::{Address, TxHash};
use binding::opstack::{SECONDS_PER_DAY, SECONDS_PER_HOUR};
use clap::{Parser, Subcommand, ValueEnum};
use finalizer::{
    config::Config, extract_withdrawals, finalize_params, load_withdrawal, withdrawal_status,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "finalizer")]
#[command(about = "Finalize proven OP Stack withdrawals on L1")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Private key for signing transactions (hex string, with or without 0x prefix)
    #[arg(short = 'k', long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Submit finalizeWithdrawalTransaction for a proven withdrawal
    Finalize {
        /// Withdrawal record (JSON)
        #[arg(short, long)]
        withdrawal: PathBuf,

        /// Gas limit; estimated when omitted
        #[arg(long)]
        gas: Option<u64>,

        /// OptimismPortal address, overriding the configured chain's
        #[arg(long)]
        portal: Option<Address>,

        /// Wait for the transaction to be mined
        #[arg(long)]
        wait: bool,
    },

    /// Estimate gas for finalizing a withdrawal
    Estimate {
        #[arg(short, long)]
        withdrawal: PathBuf,

        #[arg(long)]
        portal: Option<Address>,
    },

    /// Show whether a withdrawal is proven, finalizable, or finalized
    Status {
        #[arg(short, long)]
        withdrawal: PathBuf,

        #[arg(long)]
        portal: Option<Address>,
    },

    /// Wait for a submitted transaction to be mined
    Wait {
        #[arg(long)]
        tx: TxHash,
    },

    /// Print the withdrawals initiated by an L2 transaction as JSON
    Extract {
        #[arg(long)]
        tx: TxHash,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = Config::from_file(&cli.config)?;
    info!(config = %cli.config.display(), rpc_url = %config.rpc_url, "Loaded config");

    let provider = client::create_provider(&config.rpc_url).await?;

    match cli.command {
        Command::Finalize {
            withdrawal,
            gas,
            portal,
            wait,
        } => {
            let account = config.account(cli.private_key.as_deref())?;
            let params = finalize_params(&config, account, load_withdrawal(withdrawal)?, gas, portal)?;

            let tx_hash = finalize_withdrawal(&provider, &params).await?;
            println!("{tx_hash}");

            if wait {
                let confirmed =
                    wait_for_receipt(&provider, tx_hash, config.receipt_options()).await?;
                if confirmed.status == ReceiptStatus::Reverted {
                    eyre::bail!("Finalize transaction {tx_hash} reverted");
                }
            }
        }
        Command::Estimate { withdrawal, portal } => {
            let account = config.account(cli.private_key.as_deref())?;
            let params =
                finalize_params(&config, account, load_withdrawal(withdrawal)?, None, portal)?;

            let gas = estimate_finalize_withdrawal_gas(&provider, &params).await?;
            println!("{gas}");
        }
        Command::Status { withdrawal, portal } => {
            let account = config.account(cli.private_key.as_deref())?;
            let params =
                finalize_params(&config, account, load_withdrawal(withdrawal)?, None, portal)?;

            let report = withdrawal_status(provider, &params).await?;
            match report.seconds_until_finalizable {
                Some(0) => println!("{:?} (ready to finalize)", report.status),
                Some(remaining) => println!(
                    "{:?} ({} days {} hours until finalizable)",
                    report.status,
                    remaining / SECONDS_PER_DAY,
                    remaining % SECONDS_PER_DAY / SECONDS_PER_HOUR
                ),
                None => println!("{:?}", report.status),
            }
        }
        Command::Wait { tx } => {
            let confirmed = wait_for_receipt(&provider, tx, config.receipt_options()).await?;
            println!("{:?}", confirmed.status);
        }
        Command::Extract { tx } => {
            let Some(l2_rpc_url) = &config.l2_rpc_url else {
                eyre::bail!("l2_rpc_url is required to extract withdrawals");
            };
            let l2_provider = client::create_provider(l2_rpc_url).await?;

            let withdrawals = extract_withdrawals(&l2_provider, tx).await?;
            println!("{}", serde_json::to_string_pretty(&withdrawals)?);
        }
    }

    Ok(())
}
