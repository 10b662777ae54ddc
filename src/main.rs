//! rotary-proxy command line.
//!
//! ```text
//! rotary-proxy run [--config proxy.toml] [--tls on|off] [--otel on|off] [--logging on|off]
//! rotary-proxy targets [--output targets.json] [--force]
//! rotary-proxy config [--output proxy.toml] [--force]
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use rotary_proxy::config::loader::read_config;
use rotary_proxy::config::templates::{write_template, CONFIG_TEMPLATE, TARGETS_TEMPLATE};
use rotary_proxy::config::{ListenerTls, LogOutput, ProxyConfig, TracingMode};
use rotary_proxy::lifecycle;

#[derive(Parser)]
#[command(name = "rotary-proxy", version, about = "Round-robin reverse proxy for HTTP and WebSocket")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the proxy.
    Run(RunArgs),

    /// Write a targets file template.
    Targets {
        #[arg(short, long, default_value = "targets.json")]
        output: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Write a configuration file template.
    Config {
        #[arg(short, long, default_value = "proxy.toml")]
        output: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Default)]
struct RunArgs {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serve HTTPS.
    #[arg(long, value_enum)]
    tls: Option<Toggle>,

    /// Emit request and forwarding spans.
    #[arg(long, value_enum)]
    otel: Option<Toggle>,

    /// Write logs to a truncated file instead of stdout.
    #[arg(long, value_enum)]
    logging: Option<Toggle>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl RunArgs {
    fn into_config(self) -> Result<ProxyConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };

        match self.tls {
            Some(Toggle::On) if !config.listener.tls.is_on() => {
                config.listener.tls = ListenerTls::default_on();
            }
            Some(Toggle::Off) => config.listener.tls = ListenerTls::Off,
            _ => {}
        }

        if let Some(otel) = self.otel {
            config.observability.tracing = match otel {
                Toggle::On => TracingMode::On,
                Toggle::Off => TracingMode::Off,
            };
        }

        match self.logging {
            Some(Toggle::On) if config.logging.output == LogOutput::Stdout => {
                config.logging.output = LogOutput::default_file();
            }
            Some(Toggle::Off) => config.logging.output = LogOutput::Stdout,
            _ => {}
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            let config = args.into_config()?;
            lifecycle::run(config).await?;
        }
        Commands::Targets { output, force } => {
            write_template(&output, TARGETS_TEMPLATE, force)?;
            println!("Wrote {}", output.display());
        }
        Commands::Config { output, force } => {
            write_template(&output, CONFIG_TEMPLATE, force)?;
            println!("Wrote {}", output.display());
        }
    }

    Ok(())
}
