//! Explorer CLI
//!
//! Runs the lookup API, performs one-off lookups and inspects the cache.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use explorer_api::{open_cache, select_provider, ApiConfig, ApiServer, LookupService, LookupSource};
use explorer_core::traits::CacheStore;
use explorer_core::types::{AddressInfo, TransactionInfo};
use explorer_core::validation::{classify, IdentifierKind};

/// Explorer - cached Bitcoin address and transaction lookups
#[derive(Parser)]
#[command(name = "explorer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value = "8000")]
        port: u16,
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,
    },

    /// Look up an address
    Address {
        /// Base58 or bech32 address
        address: String,
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Look up an address or transaction hash, whichever the query is
    Lookup {
        /// Address or 64-character transaction hash
        query: String,
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Look up a transaction
    Tx {
        /// 64-character transaction hash
        hash: String,
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or modify the cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Print the cached value for a key
    Get { key: String },
    /// Remove a key
    Delete { key: String },
    /// Check whether a key is cached
    Exists { key: String },
    /// List keys matching a glob pattern
    Keys {
        #[arg(default_value = "*")]
        pattern: String,
    },
    /// Remove every key
    Flush {
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "explorer=debug,tower_http=debug,info"
    } else {
        "explorer=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::Serve { port, bind } => cmd_serve(config, port, &bind).await,
        Commands::Address { address, json } => cmd_address(config, &address, json).await,
        Commands::Lookup { query, json } => cmd_lookup(config, &query, json).await,
        Commands::Tx { hash, json } => cmd_tx(config, &hash, json).await,
        Commands::Cache { action } => cmd_cache(config, action).await,
    }
}

/// Run the API server
async fn cmd_serve(config: ApiConfig, port: u16, bind: &str) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

    println!("{}", "🚀 Starting explorer API server...".cyan().bold());
    println!("   {} {}", "Provider:".dimmed(), config.provider);
    println!("   {} {}", "Cache:".dimmed(), config.cache_backend);

    let server = ApiServer::initialize(config)
        .await
        .context("Failed to initialize server")?;

    println!("   {} http://{}", "Listening on:".green(), addr);
    println!("   {} http://{}/health", "Health check:".dimmed(), addr);
    println!("\n   Press Ctrl+C to stop.\n");

    server.run(addr).await?;
    Ok(())
}

async fn lookup_service(config: &ApiConfig) -> Result<LookupService> {
    let provider = select_provider(config).context("Failed to create provider")?;
    let cache = open_cache(config).await.context("Failed to connect to cache")?;
    Ok(LookupService::new(provider, cache))
}

/// Look up an address
async fn cmd_address(config: ApiConfig, address: &str, json: bool) -> Result<()> {
    let service = lookup_service(&config).await?;
    let result = service.address_info(address).await;
    service.cache().close().await.ok();

    let lookup = result?;
    if json {
        return print_json(&lookup.value);
    }

    print_address(&lookup.value, lookup.source);
    Ok(())
}

/// Look up a transaction
async fn cmd_tx(config: ApiConfig, hash: &str, json: bool) -> Result<()> {
    let service = lookup_service(&config).await?;
    let result = service.transaction_info(hash).await;
    service.cache().close().await.ok();

    let lookup = result?;
    if json {
        return print_json(&lookup.value);
    }

    print_transaction(&lookup.value, lookup.source);
    Ok(())
}

/// Look up a free-form query
async fn cmd_lookup(config: ApiConfig, query: &str, json: bool) -> Result<()> {
    match route_query(query)? {
        IdentifierKind::Address => cmd_address(config, query, json).await,
        IdentifierKind::TransactionHash => cmd_tx(config, query, json).await,
    }
}

fn route_query(query: &str) -> Result<IdentifierKind> {
    classify(query)
        .with_context(|| format!("'{}' is neither a Bitcoin address nor a transaction hash", query))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn source_label(source: LookupSource) -> ColoredString {
    match source {
        LookupSource::Cache => "cache".green(),
        LookupSource::Provider => "provider".yellow(),
    }
}

fn print_address(info: &AddressInfo, source: LookupSource) {
    println!("{} {}", "📬 Address".cyan().bold(), info.address);
    println!("   {} {:.8} BTC", "Balance:".dimmed(), info.balance);
    println!("   {} {}", "Transactions:".dimmed(), info.transaction_count);
    println!("   {} {}", "Source:".dimmed(), source_label(source));
}

fn print_transaction(tx: &TransactionInfo, source: LookupSource) {
    let status = if tx.is_confirmed() {
        format!("confirmed at block {}", tx.transaction_index).green()
    } else {
        "unconfirmed".yellow()
    };

    println!("{} {}", "🧾 Transaction".cyan().bold(), tx.hash);
    println!("   {} {}", "Status:".dimmed(), status);
    println!("   {} {}", "Time:".dimmed(), tx.block_time);
    println!("   {} {:.8} BTC", "Fee:".dimmed(), tx.fee);

    println!("   {} ({:.8} BTC)", "Inputs:".dimmed(), tx.total_input());
    for input in &tx.inputs {
        println!("     {} {:.8}", input.address, input.value);
    }
    println!("   {} ({:.8} BTC)", "Outputs:".dimmed(), tx.total_output());
    for output in &tx.outputs {
        println!("     {} {:.8}", output.address, output.value);
    }
    println!("   {} {}", "Source:".dimmed(), source_label(source));
}

/// Inspect or modify the cache
async fn cmd_cache(config: ApiConfig, action: CacheAction) -> Result<()> {
    let cache: Arc<dyn CacheStore> = open_cache(&config)
        .await
        .context("Failed to connect to cache")?;

    let result = run_cache_action(cache.as_ref(), action).await;
    cache.close().await.ok();
    result
}

async fn run_cache_action(cache: &dyn CacheStore, action: CacheAction) -> Result<()> {
    match action {
        CacheAction::Get { key } => match cache.get(&key).await? {
            Some(value) => {
                // Pretty-print JSON entries, raw text otherwise
                match serde_json::from_str::<serde_json::Value>(&value) {
                    Ok(parsed) => print_json(&parsed)?,
                    Err(_) => println!("{}", value),
                }
            }
            None => println!("{} {}", "Not cached:".yellow(), key),
        },
        CacheAction::Delete { key } => {
            if cache.delete(&key).await? {
                println!("{} {}", "✓ Deleted".green(), key);
            } else {
                println!("{} {}", "Not cached:".yellow(), key);
            }
        }
        CacheAction::Exists { key } => {
            let found = cache.exists(&key).await?;
            println!("{}", if found { "true".green() } else { "false".red() });
        }
        CacheAction::Keys { pattern } => {
            let keys = cache.keys(&pattern).await?;
            for key in &keys {
                println!("{}", key);
            }
            println!("{} {}", keys.len().to_string().bold(), "key(s)".dimmed());
        }
        CacheAction::Flush { yes } => {
            if !yes {
                anyhow::bail!("Refusing to flush without --yes");
            }
            cache.flush().await?;
            println!("{}", "✓ Cache flushed".green());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use explorer_api::CacheBackend;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cache_keys_default_pattern() {
        let cli = Cli::try_parse_from(["explorer", "cache", "keys"]).unwrap();
        match cli.command {
            Commands::Cache {
                action: CacheAction::Keys { pattern },
            } => assert_eq!(pattern, "*"),
            _ => panic!("expected cache keys"),
        }
    }

    #[test]
    fn test_route_query() {
        assert_eq!(
            route_query("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa").unwrap(),
            IdentifierKind::Address
        );
        assert_eq!(
            route_query("f854aebae95150b379cc1187d848d58225f3c4157fe992bcd166f58bd5063449").unwrap(),
            IdentifierKind::TransactionHash
        );
        assert!(route_query("hello").is_err());
    }

    #[test]
    fn test_parse_free_form_lookup() {
        let cli = Cli::try_parse_from(["explorer", "lookup", "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq"]).unwrap();
        assert!(matches!(cli.command, Commands::Lookup { json: false, .. }));
    }

    #[test]
    fn test_parse_lookup_flags() {
        let cli = Cli::try_parse_from(["explorer", "-v", "tx", "abc", "--json"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Tx { ref hash, json: true } if hash == "abc"));
    }

    #[tokio::test]
    async fn test_cache_actions_against_memory_backend() {
        let config = ApiConfig {
            cache_backend: CacheBackend::Memory,
            ..Default::default()
        };
        let cache = open_cache(&config).await.unwrap();
        cache.set("k", "{\"a\":1}", None).await.unwrap();

        run_cache_action(cache.as_ref(), CacheAction::Get { key: "k".into() })
            .await
            .unwrap();
        run_cache_action(cache.as_ref(), CacheAction::Delete { key: "k".into() })
            .await
            .unwrap();
        assert!(!cache.exists("k").await.unwrap());

        let refused = run_cache_action(cache.as_ref(), CacheAction::Flush { yes: false }).await;
        assert!(refused.is_err());
    }
}
