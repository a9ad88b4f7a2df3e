//! AEGIS daemon: terminal front-end for the local chain node.

use aegis_node::{Node, NodeConfig};
use aegis_transactions::{TransferTx, TxOut};
use aegis_types::{Address, Timestamp};
use aegis_work::CancelToken;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aegis-daemon", about = "AI-guarded prototype chain node")]
struct Cli {
    /// Data directory for chain storage.
    #[arg(long, default_value = "./aegis_data", env = "AEGIS_DATA_DIR")]
    data_dir: PathBuf,

    /// Path to a TOML configuration file. File settings are the base; CLI
    /// flags override them.
    #[arg(long, env = "AEGIS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "AEGIS_LOG_LEVEL")]
    log_level: String,

    /// Emit logs as JSON.
    #[arg(long, env = "AEGIS_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Initialize the datadir (mines the genesis block if absent).
    Init,
    /// Submit a transfer to the mempool.
    Send {
        from: String,
        to: String,
        amount: u64,
        #[arg(long, default_value_t = 1000)]
        fee: u64,
        #[arg(long)]
        memo: Option<String>,
        /// Per-sender monotonic nonce.
        #[arg(long)]
        nonce: u64,
    },
    /// Mine one block.
    Mine {
        /// Miner identity credited by the coinbase.
        miner: Option<String>,
    },
    /// Print an account balance.
    Balance { addr: String },
    /// List the most recent blocks.
    Chain {
        #[arg(long, default_value_t = 20)]
        n: usize,
    },
    /// Verify the rewards ledger hash chain.
    VerifyLedger,
    /// Print the emission state and vesting view.
    EmissionStatus,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    aegis_utils::init_tracing_with(&cli.log_level, cli.log_json);

    let mut config = match &cli.config {
        Some(path) => {
            let cfg = NodeConfig::from_toml_file(path)?;
            tracing::info!("loaded config from {}", path.display());
            cfg
        }
        None => NodeConfig::default(),
    };
    config.data_dir = cli.data_dir.clone();
    config.log_level = cli.log_level.clone();

    let node = Node::open_default(config)?;

    match cli.command {
        Command::Init => {
            let tip = node.tip();
            println!("ok");
            println!("height {}", tip.height);
            println!("tip {}", tip.hash);
        }
        Command::Send {
            from,
            to,
            amount,
            fee,
            memo,
            nonce,
        } => {
            // Dev-network signing: any non-zero signature passes the
            // default verifier. Real deployments inject a real scheme.
            let tx = TransferTx {
                sender: Address::new(from),
                outputs: vec![TxOut {
                    recipient: Address::new(to),
                    amount,
                }],
                fee,
                memo,
                timestamp: Timestamp::now(),
                nonce,
                signature: vec![0x01; 64],
            };
            match node.submit_tx(tx) {
                Ok(result) => {
                    println!("txid {}", result.txid);
                    println!("{}", result.decision.envelope());
                }
                Err(err) => {
                    eprintln!("error {err}");
                    std::process::exit(1);
                }
            }
        }
        Command::Mine { miner } => {
            let outcome = node.mine(miner.as_deref(), &CancelToken::new())?;
            println!("ok accepted");
            println!("height {}", outcome.summary.height);
            println!("hash {}", outcome.summary.hash);
            println!("coinbase_paid {}", outcome.coinbase_paid);
            println!("subsidy {}", outcome.subsidy);
            println!(
                "remaining_pool {}",
                node.emission_status(Timestamp::now()).state.remaining_pool
            );
        }
        Command::Balance { addr } => {
            println!("{}", node.balance(&Address::new(addr)));
        }
        Command::Chain { n } => {
            for summary in node.chain_tail(n) {
                println!(
                    "{} {} {} txs {} bits {}",
                    summary.height,
                    summary.hash,
                    summary.timestamp,
                    summary.tx_count,
                    summary.bits
                );
            }
        }
        Command::VerifyLedger => {
            let report = node.verify_ledger()?;
            if report.ok {
                println!("ok entries {}", report.entries);
                if let Some(head) = report.head_hash {
                    println!("head {head}");
                }
                if report.trailing_corruption {
                    println!("warning trailing partial line");
                }
            } else {
                println!("fail");
                for div in &report.divergences {
                    println!("  seq {} offset {} {}", div.seq, div.byte_offset, div.reason);
                }
                std::process::exit(1);
            }
        }
        Command::EmissionStatus => {
            let status = node.emission_status(Timestamp::now());
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}
