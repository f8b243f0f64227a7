use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use urlshare::config::{Addressing, Config};
use urlshare::handlers::{MappingAdmin, MappingForm};
use urlshare::repository::{KeyEncoding, MappingRepository};
use urlshare::storage::Store;
use urlshare::{logging, metrics, server};

#[derive(Parser)]
#[command(name = "urlshare")]
#[command(about = "Shorten URLs and redirect visitors to them")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to ./urlshare.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// HTTP service address, e.g. ":8080" or "127.0.0.1:8080"
    #[arg(long, global = true)]
    addr: Option<String>,

    /// Database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// External base IRI used to build fully-qualified short addresses
    #[arg(long, global = true)]
    base_iri: Option<String>,

    #[arg(long, value_enum, global = true)]
    key_encoding: Option<KeyEncoding>,

    #[arg(long, value_enum, global = true)]
    addressing: Option<Addressing>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Print every mapping, highest key first
    List,
    /// Create a mapping, or overwrite one when --from is given
    Put {
        /// Target IRI
        to_iri: String,
        /// Key to write; a new key is generated when omitted
        #[arg(long)]
        from: Option<String>,
    },
}

impl Cli {
    fn into_config(self) -> anyhow::Result<(Config, Commands)> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(addr) = self.addr {
            config.server.addr = addr;
        }
        if let Some(db) = self.db {
            config.store.path = db;
        }
        if let Some(base_iri) = self.base_iri {
            config.server.base_iri = base_iri;
        }
        if let Some(encoding) = self.key_encoding {
            config.store.key_encoding = encoding;
        }
        if let Some(addressing) = self.addressing {
            config.server.addressing = addressing;
        }
        config.validate()?;
        Ok((config, self.command.unwrap_or(Commands::Serve)))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let (config, command) = Cli::parse().into_config()?;
    let _log_guard = logging::init_logging(&config.logging);

    let store = Store::open(&config.store.path, config.busy_timeout())
        .with_context(|| format!("opening store at {}", config.store.path.display()))?;
    let repo = MappingRepository::new(Arc::new(store));

    match command {
        Commands::Serve => {
            if config.metrics.enabled {
                metrics::init_metrics();
            }
            server::start_server(&config, repo).await?;
        }
        Commands::List => {
            let mappings = repo.blocking(|repo| repo.list()).await?;
            for mapping in mappings {
                println!("{}\t{}", mapping.key, mapping.target);
            }
        }
        Commands::Put { to_iri, from } => {
            let admin = MappingAdmin::new(repo, config.base_iri()?, config.key_format()?);
            let form = MappingForm {
                from_iri: from.unwrap_or_default(),
                to_iri,
            };
            match admin.apply(form).await? {
                Some(key) => println!("{key}"),
                None => info!("mapping updated"),
            }
        }
    }
    Ok(())
}
