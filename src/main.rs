use std::{path::Path, sync::Arc};

use clap::Parser;
use color_eyre::{Result, eyre::Context};
use synapse::{
    HandlerError, Request, Response, ServerConfig, config::ServerConfigValidator, tracing_setup,
    utils::wait_for_interrupt,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "synapse.toml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "synapse.toml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "synapse.toml")]
        config: String,
    },
    /// Start the server (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "synapse.toml")]
        config: String,
    },
}

/// Demo handler: echoes the request line back as JSON.
///
/// Real deployments embed the library and supply their own handler; this
/// binary exists to exercise a config end to end.
async fn echo(req: Request) -> Result<Response, HandlerError> {
    let payload = serde_json::json!({
        "method": req.method().to_string(),
        "target": req.target(),
        "source": {
            "host": req.source().host,
            "port": req.source().port,
            "scheme": req.source().scheme.to_string(),
        },
    });

    Ok(Response::ok()
        .with_header("Content-Type", "application/json")
        .with_body(payload.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let (command, config_path) = match args.command {
        Some(Commands::Validate { config }) => ("validate", config),
        Some(Commands::Init { config }) => ("init", config),
        Some(Commands::Serve { config }) => ("serve", config),
        None => ("serve", args.config),
    };

    match command {
        "validate" => return validate_config_command(&config_path).await,
        "init" => return init_config_command(&config_path).await,
        _ => {}
    }

    tracing_setup::init_tracing()?;

    let config = if Path::new(&config_path).exists() {
        tracing::info!("Loading configuration from {config_path}");
        synapse::config::load_config(&config_path)
            .await
            .with_context(|| format!("Failed to load config from {config_path}"))?
    } else {
        tracing::info!("No config file at {config_path}, using defaults");
        ServerConfig::default()
    };
    ServerConfigValidator::validate(&config).wrap_err("Invalid configuration")?;

    let server = synapse::start(config, Arc::new(echo))
        .await
        .wrap_err("Failed to start server")?;
    tracing::info!(base_uri = %server.base_uri(), "Serving; press Ctrl+C to stop");

    wait_for_interrupt().await;
    server.stop().await;

    Ok(())
}

/// Validate configuration file and exit
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("Error: configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match synapse::config::load_config(config_path).await {
        Ok(config) => {
            println!("Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("Configuration parsing failed:");
            eprintln!("   {e}");
            std::process::exit(1);
        }
    };

    match ServerConfigValidator::validate(&config) {
        Ok(()) => {
            println!("Configuration validation: OK");
            println!();
            println!("Summary:");
            println!(
                "   bind: {}:{}",
                config.bind_addr.as_deref().unwrap_or("0.0.0.0"),
                config.port
            );
            if let Some(host) = &config.advertised_host {
                println!("   advertised host: {host}");
            }
            println!("   stop mode: {:?}", config.stop_mode);
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration validation failed:");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("Error: configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# Synapse server configuration

# Port to bind; 0 requests an ephemeral port assigned at bind time
port = 8080

# Address to bind
bind_addr = "127.0.0.1"

# Hostname advertised to clients (optional)
# advertised_host = "app.example.com"

# Stop policy: how stop() treats in-flight connections
# stop_mode = { type = "immediate" }
stop_mode = { type = "graceful", timeout = "5s" }
"#;

    tokio::fs::write(path, default_config)
        .await
        .wrap_err("Failed to write config file")?;
    println!("Created default configuration at: {config_path}");
    println!("   Run 'synapse serve --config {config_path}' to start the server");
    Ok(())
}
