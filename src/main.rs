use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use scanmatch_api::{
    ApiState, Presenter, RestApi, ScanConfig, ScanSession, SensorSource, Status, Symbology,
    TerminalPresenter,
};
use scanmatch_core::{Extractor, Lookup};
use scanmatch_storage::{Catalog, LoadOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Resolve scanned codes against a product table
#[derive(Parser, Debug)]
#[command(name = "scanmatch")]
#[command(about = "Resolve barcode and QR scans against a product table", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to the product table (JSON array of records)
    #[arg(long, global = true, env = "SCANMATCH_DB", default_value = "./db.json")]
    db: PathBuf,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Refuse to load a table with duplicate barcodes
    #[arg(long, global = true)]
    strict: bool,

    /// Only match the trimmed input, without decoding, splitting or URL parsing
    #[arg(long, global = true)]
    simple: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up a single code typed by hand
    Lookup {
        code: String,

        /// Show the record's descriptive fields
        #[arg(long)]
        details: bool,
    },

    /// Read scans from a scanner until interrupted
    Scan {
        /// Scanner device or FIFO (reads stdin if not provided)
        #[arg(long)]
        device: Option<PathBuf>,

        /// Ignore repeats of the same code within this many milliseconds
        #[arg(long, default_value_t = 2000)]
        debounce_ms: u64,

        /// Accepted symbologies, comma separated (qr, ean13, ean8, code128, code39, upca, upce)
        #[arg(long, value_delimiter = ',')]
        formats: Vec<Symbology>,

        /// Show the record's descriptive fields
        #[arg(long)]
        details: bool,
    },

    /// Serve lookups over HTTP
    Serve {
        /// HTTP API port
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },

    /// Print the loaded product table
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting scanmatch v{}", env!("CARGO_PKG_VERSION"));
    info!("Product table: {:?}", args.db);

    let options = if args.strict {
        LoadOptions::strict()
    } else {
        LoadOptions::default()
    };
    let catalog = Catalog::open(&args.db, options);
    let extractor = if args.simple {
        Extractor::seed_only()
    } else {
        Extractor::default()
    };

    match args.command {
        Command::Lookup { code, details } => run_lookup(&catalog, extractor, &code, details),
        Command::Scan {
            device,
            debounce_ms,
            formats,
            details,
        } => {
            let mut config = ScanConfig {
                source: device.map(SensorSource::Device).unwrap_or(SensorSource::Stdin),
                debounce: Duration::from_millis(debounce_ms),
                ..ScanConfig::default()
            };
            if !formats.is_empty() {
                config.formats = formats;
            }
            run_scan(&catalog, extractor, config, details).await
        }
        Command::Serve { port } => run_serve(catalog, extractor, port).await,
        Command::List => {
            println!("{}", serde_json::to_string_pretty(catalog.table())?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_lookup(
    catalog: &Catalog,
    extractor: Extractor,
    code: &str,
    details: bool,
) -> anyhow::Result<ExitCode> {
    let mut presenter = TerminalPresenter::stdout().detailed(details);
    if !catalog.is_available() {
        presenter.status(Status::for_catalog(catalog))?;
    }

    let outcome = catalog.lookup().with_extractor(extractor).resolve(code);
    presenter.present(&outcome)?;

    Ok(if outcome.is_found() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run_scan(
    catalog: &Catalog,
    extractor: Extractor,
    config: ScanConfig,
    details: bool,
) -> anyhow::Result<ExitCode> {
    let presenter = Arc::new(Mutex::new(TerminalPresenter::stdout().detailed(details)));
    presenter.lock().status(Status::for_catalog(catalog))?;

    let table = catalog.shared_table();
    let scan_presenter = presenter.clone();
    let session = ScanSession::new();

    let started = session
        .start(config, move |event| {
            let outcome = Lookup::new(&table)
                .with_extractor(extractor)
                .resolve(&event.raw);
            if let Err(e) = scan_presenter.lock().present(&outcome) {
                warn!("Could not render scan result: {}", e);
            }
        })
        .await;

    if let Err(e) = started {
        presenter
            .lock()
            .status(Status::error(format!("Could not start the scanner: {}", e)))?;
        return Ok(ExitCode::FAILURE);
    }
    presenter.lock().status(Status::success(
        "Scanner active. Scan a barcode or QR code, Ctrl-C to stop.",
    ))?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(Duration::from_millis(200));
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                if !session.is_running() {
                    break;
                }
            }
        }
    }

    session.stop();
    presenter.lock().status(Status::info("Scanner stopped."))?;
    Ok(ExitCode::SUCCESS)
}

async fn run_serve(catalog: Catalog, extractor: Extractor, port: u16) -> anyhow::Result<ExitCode> {
    let state = Arc::new(ApiState::new(catalog, extractor));

    let http_handle = std::thread::spawn(move || {
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(state, port).await {
                tracing::error!("HTTP server error: {}", e);
            }
        })
    });

    info!("HTTP API: http://localhost:{}/lookup?code=", port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            info!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(ExitCode::SUCCESS)
}
