use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use authgate::{
    adapters::{HttpClientAdapter, HttpHandler, build_router},
    config::{GatewayConfigValidator, models::GatewayConfig},
    core::ProxyService,
    ports::http_client::HttpClient,
    tracing_setup,
    utils::GracefulShutdown,
};
use clap::Parser;
use color_eyre::{Result, eyre::Context};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "config.yaml")]
        config: String,
    },
    /// Start the gateway server (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "config.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let (command, config_path) = match args.command {
        Some(Commands::Validate { config }) => ("validate", config),
        Some(Commands::Serve { config }) => ("serve", config),
        None => ("serve", args.config), // Default to serve with config from args
    };

    if command == "validate" {
        return validate_config_command(&config_path).await;
    }

    tracing_setup::init_tracing()?;

    tracing::info!("Loading configuration from {config_path}");

    let config = authgate::config::load_config(&config_path)
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;

    if let Err(e) = GatewayConfigValidator::validate(&config) {
        tracing::error!("Configuration validation failed: {e}");
        eprintln!("Configuration validation failed:\n{e}");
        std::process::exit(1);
    }

    let config = Arc::new(config);

    let http_client: Arc<dyn HttpClient> = Arc::new(
        HttpClientAdapter::new(Duration::from_millis(config.client.timeout_ms))
            .context("Failed to create HTTP client adapter")?,
    );

    let proxy_service = Arc::new(ProxyService::new(config.clone(), http_client));
    let http_handler = Arc::new(HttpHandler::new(proxy_service.clone()));

    for mapping in &config.mappings {
        tracing::info!(
            "Configured mapping: /{} -> {} (whitelist: {} pattern(s))",
            mapping.prefix,
            mapping.forward,
            mapping.whitelist.len()
        );
    }

    let addr: SocketAddr = config
        .listen_socket_addr()
        .parse()
        .context("Failed to parse listen address")?;

    tracing::info!(
        "Starting Authgate on {} ({} mapping(s), auth at {}, client timeout {}ms)",
        config.addr,
        proxy_service.target_count(),
        config.auth.url,
        config.client.timeout_ms
    );

    println!(
        "Authgate listening on {} ({} mapping(s), auth at {})",
        config.addr,
        proxy_service.target_count(),
        config.auth.url
    );

    let app = build_router(http_handler);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    // Create graceful shutdown manager and start the signal handler
    let graceful_shutdown = Arc::new(GracefulShutdown::new());
    let signal_handler_shutdown = graceful_shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signal_handler_shutdown.run_signal_handler().await {
            tracing::error!("Signal handler error: {}", e);
        }
    });

    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result.context("Server error")?;
        },
        shutdown_reason = graceful_shutdown.wait_for_shutdown_signal() => {
            tracing::info!("Shutdown signal received: {:?}", shutdown_reason);
        }
    }

    tracing::info!("Authgate shut down");
    Ok(())
}

/// Validate configuration file and exit
async fn validate_config_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config: GatewayConfig = match authgate::config::load_config(config_path).await {
        Ok(config) => {
            println!("✅ Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("❌ Configuration parsing failed:");
            eprintln!("   {e}");
            std::process::exit(1);
        }
    };

    match GatewayConfigValidator::validate(&config) {
        Ok(()) => {
            println!("✅ Configuration validation: OK");
            println!();
            println!("📋 Configuration Summary:");
            println!("   • Listen Address: {}", config.addr);
            println!("   • Auth URL: {}", config.auth.url);
            println!("   • Client Timeout: {}ms", config.client.timeout_ms);
            println!("   • Mappings: {}", config.mappings.len());
            for mapping in &config.mappings {
                println!(
                    "     - /{} -> {} ({} whitelist pattern(s))",
                    mapping.prefix,
                    mapping.forward,
                    mapping.whitelist.len()
                );
            }
            println!();
            println!("🎉 Configuration is valid and ready to use!");
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("{e}");
            println!();
            println!("💡 Common fixes:");
            println!("   • Ensure auth.url and every forward URL start with http:// or https://");
            println!("   • Give every mapping a non-empty prefix");
            println!("   • Verify the listen address format (e.g., ':3333' or '127.0.0.1:3333')");
            std::process::exit(1);
        }
    }
}
