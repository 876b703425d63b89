use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use minichain::chain::{ChainStore, Transaction, UtxoSet};
use minichain::config::NodeConfig;
use minichain::node::{self, Node};
use minichain::wallet::WalletStore;
use minichain::Result;
use tracing::info;
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt,
    prelude::*,
};

#[derive(Debug, Parser)]
#[command(name = "minichain")]
struct Opt {
    #[command(subcommand)]
    command: Command,

    /// Directory the chain database lives in.
    #[arg(long, global = true, default_value = "minichain-data")]
    data_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(name = "createwallet", about = "Create a new wallet")]
    Createwallet,
    #[command(name = "listaddresses", about = "Print local wallet addresses")]
    ListAddresses,
    #[command(name = "printchain", about = "Print every block in the chain")]
    Printchain,
    #[command(name = "startnode", about = "Start a gossip node")]
    StartNode {
        #[arg(long, help = "Address to listen on")]
        listen: SocketAddr,
        #[arg(long, help = "Address to mine coinbase rewards to")]
        mining_address: Option<String>,
        #[arg(long, help = "Address to seed the chain with, seed node only")]
        genesis_address: Option<String>,
    },
}

fn initialize_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(filter))
        .init();
}

fn create_wallet() -> Result<()> {
    let mut store = WalletStore::new();
    let address = store.create_wallet()?;
    info!("created wallet {}", address);
    Ok(())
}

fn list_addresses() -> Result<()> {
    let store = WalletStore::new();
    for address in store.get_addresses() {
        info!("{}", address);
    }
    Ok(())
}

fn process_transaction(tx: &Transaction) {
    info!("- transaction {}", tx.id_hex());
    if !tx.is_coinbase() {
        for input in &tx.vin {
            info!(
                "  input txid={} vout={}",
                data_encoding::HEXLOWER.encode(&input.txid),
                input.vout
            );
        }
    }
    for output in &tx.vout {
        info!(
            "  output value={} pubkey_hash={}",
            output.value,
            data_encoding::HEXLOWER.encode(&output.pub_key_hash)
        );
    }
}

fn print_blockchain(data_dir: &PathBuf) -> Result<()> {
    let store = ChainStore::open(data_dir)?
        .ok_or_else(|| minichain::Error::NotFound("no chain found in data directory".into()))?;
    for block in store.iterator() {
        let block = block?;
        info!(
            "height={} hash={} prev={}",
            block.height,
            block.hash_hex(),
            block.prev_hash_hex()
        );
        for tx in &block.transactions {
            process_transaction(tx);
        }
    }
    Ok(())
}

async fn start_node(
    data_dir: PathBuf,
    listen: SocketAddr,
    mining_address: Option<String>,
    genesis_address: Option<String>,
) -> Result<()> {
    let store = match ChainStore::open(&data_dir)? {
        Some(store) => store,
        None => {
            let genesis_address = genesis_address.ok_or_else(|| {
                minichain::Error::ProtocolError(
                    "no chain found; pass --genesis-address to seed one".into(),
                )
            })?;
            ChainStore::create_blockchain(&data_dir, &genesis_address)?
        }
    };
    UtxoSet::new(&store).reindex()?;

    let config = NodeConfig::new(listen, mining_address)?;
    info!(addr = %listen, is_seed = config.is_seed, "starting node");
    let node = Node::new(config, store);

    node::server::run(node).await
}

async fn process_command(command: Command, data_dir: PathBuf) -> Result<()> {
    match command {
        Command::Createwallet => create_wallet(),
        Command::ListAddresses => list_addresses(),
        Command::Printchain => print_blockchain(&data_dir),
        Command::StartNode {
            listen,
            mining_address,
            genesis_address,
        } => start_node(data_dir, listen, mining_address, genesis_address).await,
    }
}

#[tokio::main]
async fn main() {
    initialize_logging();

    let opt = Opt::parse();
    if let Err(e) = process_command(opt.command, opt.data_dir).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
