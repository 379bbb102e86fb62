//! dirshare
//!
//! Serve a directory over HTTP.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dirshare::config::{default_config_path, Config};
use dirshare::HttpServer;
use tracing_subscriber::EnvFilter;

/// dirshare - browse a directory and download its files over HTTP.
#[derive(Parser, Debug)]
#[command(name = "dirshare")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start serving a directory
    Serve {
        /// Directory to serve (overrides config)
        #[arg(long, short, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Port to listen on (overrides config)
        #[arg(long, short)]
        port: Option<u16>,

        /// Address to bind (overrides config)
        #[arg(long, short)]
        bind: Option<String>,
    },

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },

    /// Print the effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    // Load configuration
    let mut config = Config::load(&config_path)?;

    // Apply environment variable overrides
    config.apply_env_overrides();

    match cli.command {
        Commands::Serve { root, port, bind } => {
            if let Some(root) = root {
                config.server.root = root;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(bind) = bind {
                config.server.bind = bind;
            }

            // Validate configuration
            config.validate()?;

            init_tracing(&config, cli.verbose);
            tracing::info!("dirshare starting...");
            tracing::debug!("Using config file: {:?}", config_path);

            let server = HttpServer::from_config(&config).await?;
            server.run().await?;

            tracing::info!("dirshare stopped");
        }
        Commands::InitConfig { force } => {
            if config_path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists: {} (use --force to overwrite)",
                    config_path.display()
                );
            }
            Config::default().save(&config_path)?;
            println!("Wrote default configuration to {}", config_path.display());
        }
        Commands::ShowConfig => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

/// Initialize tracing: `RUST_LOG` wins, then `--verbose`, then the config level.
fn init_tracing(config: &Config, verbose: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        config.log.level.to_lowercase()
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},tower_http={level}")));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from([
            "dirshare", "-v", "serve", "--root", "/srv", "--port", "9000", "--bind", "127.0.0.1",
        ]);

        assert!(cli.verbose);
        match cli.command {
            Commands::Serve { root, port, bind } => {
                assert_eq!(root, Some(PathBuf::from("/srv")));
                assert_eq!(port, Some(9000));
                assert_eq!(bind.as_deref(), Some("127.0.0.1"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_config_after_subcommand() {
        let cli = Cli::parse_from(["dirshare", "show-config", "--config", "/etc/dirshare.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/dirshare.toml")));
        assert!(matches!(cli.command, Commands::ShowConfig));
    }

    #[test]
    fn test_parse_init_config_force() {
        let cli = Cli::parse_from(["dirshare", "init-config", "--force"]);
        assert!(matches!(cli.command, Commands::InitConfig { force: true }));
    }
}
