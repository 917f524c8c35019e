use anyhow::Result;
use clap::Parser;
use std::path::Path;
use toadscan::{PhotoStore, ToadscanConfig, ToadscanOrchestrator};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "toadscan")]
#[command(about = "Camera capture controller with local photo storage and a gallery view")]
#[command(version)]
#[command(long_about = "Takes still photos from a camera, stores them in the application's \
document directory named by capture time, and switches between a live camera view and a \
gallery of stored photos. Runs as a terminal application driven by the keyboard.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "toadscan.toml", help = "Path to TOML configuration file")]
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
    #[arg(long, help = "Validate configuration file and exit without starting the system")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Dry run mode - initialize but don't start components
    #[arg(long, help = "Perform dry run - initialize components but don't start them")]
    dry_run: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Use the synthetic camera instead of a hardware device
    #[arg(long, help = "Capture from a synthetic mock camera")]
    mock_camera: bool,

    /// Print stored photos as JSON and exit
    #[arg(long, help = "Print the stored photo listing as JSON and exit")]
    list_photos: bool,
}

impl Args {
    /// Whether the terminal UI will own the screen
    fn interactive(&self) -> bool {
        !(self.validate_config || self.dry_run || self.list_photos)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let config = match ToadscanConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {}", args.config, e);
            return Err(e.into());
        }
    };

    // Logs go to a file while the terminal UI is drawing
    let log_dir = args
        .interactive()
        .then(|| Path::new(&config.storage.document_root).join("logs"));
    let log_guard = init_logging(&args, log_dir.as_deref())?;

    info!("Starting toadscan v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

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

    if args.list_photos {
        let store = PhotoStore::new(&config.storage);
        let stats = store.stats().await?;
        info!(
            "{} photos ({} bytes) in {}",
            stats.total_photos,
            stats.total_size_bytes,
            store.photos_dir().display()
        );
        let photos = store.list_photos().await?;
        println!("{}", serde_json::to_string_pretty(&photos)?);
        return Ok(());
    }

    info!("toadscan configuration loaded and validated");

    let mut orchestrator = ToadscanOrchestrator::new(config, args.mock_camera)
        .await
        .map_err(|e| {
            error!("Failed to create orchestrator: {}", e);
            e
        })?;

    orchestrator.initialize().await.map_err(|e| {
        error!("Failed to initialize system: {}", e);
        e
    })?;

    if args.dry_run {
        info!("Dry run mode - components initialized but not started");
        println!("✓ Dry run completed successfully - all components initialized");
        return Ok(());
    }

    orchestrator.start().await.map_err(|e| {
        error!("Failed to start system: {}", e);
        e
    })?;

    let exit_code = orchestrator.run().await.map_err(|e| {
        error!("System error during execution: {}", e);
        e
    })?;

    info!("toadscan exited with code: {}", exit_code);

    // process::exit skips destructors; flush the log file first
    drop(log_guard);
    std::process::exit(exit_code);
}

fn init_logging(args: &Args, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt::writer::BoxMakeWriter;
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
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
        .unwrap_or_else(|_| EnvFilter::new(format!("toadscan={}", log_level)));

    let (writer, guard, ansi) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "toadscan.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), None, true),
    };

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi)
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

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# toadscan configuration file");
    println!("# This is the default configuration with all available options");
    println!("# Every key can be overridden with TOADSCAN_<SECTION>__<KEY>");
    println!();
    println!("{}", ToadscanConfig::default().to_toml()?);
    Ok(())
}
