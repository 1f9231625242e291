use anyhow::Result;
use clap::Parser;
use life::config::ComponentConfig;
use life::{Component, HookEvent, LifeConfig, Lifecycle};
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "life")]
#[command(about = "In-process application lifecycle orchestrator")]
#[command(version)]
#[command(long_about = "Starts the components listed in the configuration file in dependency \
order, waits for SIGINT/SIGTERM and shuts them down again in reverse order. A second signal \
during shutdown exits immediately.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "life.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting anything")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Dry run mode - resolve the start order but don't start components
    #[arg(long, help = "Print the resolved start order and exit")]
    dry_run: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting life v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match LifeConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let life = Lifecycle::new(config.clone());
    for component in &config.components {
        life.register(demo_component(component))?;
    }
    life.register_hook("ready", 0, HookEvent::BeforeRunning, || async {
        info!("All demo components are up, press Ctrl+C to stop");
        Ok(())
    })?;

    if args.dry_run {
        let order = life.resolve_order().map_err(|e| {
            error!("Failed to resolve start order: {}", e);
            e
        })?;
        println!("Start order: {}", order.join(" -> "));
        return Ok(());
    }

    life.start().await.map_err(|e| {
        error!("Failed to start: {}", e);
        e
    })?;

    life.wait_to_end().await;
    info!("life exited cleanly");
    Ok(())
}

fn demo_component(config: &ComponentConfig) -> Component {
    let name = config.name.clone();
    let start_delay = Duration::from_millis(config.start_delay_ms);
    let stop_delay = Duration::from_millis(config.stop_delay_ms);
    let stop_name = name.clone();

    Component::new(config.name.clone())
        .on_start(move || {
            let name = name.clone();
            async move {
                tokio::time::sleep(start_delay).await;
                info!("{} is up", name);
                Ok(())
            }
        })
        .on_shutdown(move || {
            let name = stop_name.clone();
            async move {
                tokio::time::sleep(stop_delay).await;
                info!("{} is down", name);
                Ok(())
            }
        })
        .depends_on(config.depends.iter().cloned())
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("life={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    let mut config = LifeConfig::default();
    config.components = vec![
        ComponentConfig {
            name: "database".to_string(),
            depends: Vec::new(),
            start_delay_ms: 200,
            stop_delay_ms: 100,
        },
        ComponentConfig {
            name: "http".to_string(),
            depends: vec!["database".to_string()],
            start_delay_ms: 50,
            stop_delay_ms: 50,
        },
    ];

    println!("# life configuration file");
    println!("# Environment overrides use the LIFE_ prefix, e.g. LIFE_HOOKS__TIMEOUT_MS=5000");
    println!();
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
