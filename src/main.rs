use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fleet::Application;
use fleet_config::AppConfig;
use fleet_domain::{DispatchError, ErrorKind, ServiceFilter, ServiceStatus};
use fleet_dispatcher::ServiceRequest;
use fleet_infrastructure::SeedPlan;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "fleet")]
#[command(version = "1.0.0")]
#[command(about = "Nearest-driver dispatch and service lifecycle")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file; without it the default locations are tried
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Overrides observability.log_level
    #[arg(short, long, global = true, value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: Option<String>,

    /// Overrides observability.log_format
    #[arg(long, global = true, value_parser = ["json", "pretty"])]
    log_format: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database schema
    Migrate,
    /// Fill the database with random Colombian demo data
    Seed {
        #[arg(long, default_value = "50")]
        clients: usize,
        #[arg(long, default_value = "30")]
        drivers: usize,
        /// Fixed RNG seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Request a service, matching the nearest driver unless one is given
    Request {
        #[arg(long)]
        pickup: i64,
        #[arg(long)]
        client: Option<i64>,
        #[arg(long)]
        driver: Option<i64>,
        /// Kilometres; only used with --driver
        #[arg(long)]
        distance: Option<f64>,
        /// Minutes; only used with --driver
        #[arg(long)]
        estimated_time: Option<f64>,
    },
    /// Mark a service completed by its driver
    Complete {
        #[arg(long)]
        driver: i64,
        #[arg(long)]
        service: i64,
    },
    /// Move a service to another driver
    Reassign {
        #[arg(long)]
        service: i64,
        #[arg(long)]
        driver: i64,
    },
    /// Cancel a pending or in-progress service
    Cancel { service: i64 },
    /// Show one service
    Show { service: i64 },
    /// List services, newest first
    List {
        #[arg(long)]
        status: Option<ServiceStatus>,
        #[arg(long)]
        driver: Option<i64>,
        #[arg(long)]
        client: Option<i64>,
    },
    /// Count services per status
    Summary,
    /// Great-circle distance and ETA between two addresses
    Distance { from: i64, to: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let log_level = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.observability.log_level);
    let log_format = cli
        .log_format
        .as_deref()
        .unwrap_or(&config.observability.log_format);
    init_logging(log_level, log_format)?;

    info!("database: {}", config.database.url);
    let app = Application::new(config).await?;

    let result = run(&app, cli.command).await;
    app.shutdown().await;

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => match e.downcast_ref::<DispatchError>() {
            Some(dispatch_error) => {
                error!("command failed: {dispatch_error}");
                eprintln!("{}", serde_json::to_string_pretty(&error_body(dispatch_error))?);
                std::process::exit(exit_code(dispatch_error.kind()));
            }
            None => Err(e),
        },
    }
}

async fn run(app: &Application, command: Commands) -> Result<Value> {
    let output = match command {
        Commands::Migrate => {
            app.database().migrate().await?;
            app.database().health_check().await?;
            json!({ "migrated": true, "database": app.config().database.url })
        }
        Commands::Seed {
            clients,
            drivers,
            seed,
        } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let report = app.seed(SeedPlan { clients, drivers }, &mut rng).await?;
            serde_json::to_value(report)?
        }
        Commands::Request {
            pickup,
            client,
            driver,
            distance,
            estimated_time,
        } => {
            let request = ServiceRequest {
                pickup_address_id: pickup,
                client_id: client,
                driver_id: driver,
                distance,
                estimated_time,
            };
            serde_json::to_value(app.engine().create(request).await?)?
        }
        Commands::Complete { driver, service } => {
            serde_json::to_value(app.lifecycle().complete(driver, service).await?)?
        }
        Commands::Reassign { service, driver } => {
            serde_json::to_value(app.lifecycle().reassign(service, driver).await?)?
        }
        Commands::Cancel { service } => serde_json::to_value(app.lifecycle().cancel(service).await?)?,
        Commands::Show { service } => serde_json::to_value(app.lifecycle().get(service).await?)?,
        Commands::List {
            status,
            driver,
            client,
        } => {
            let filter = ServiceFilter {
                status,
                driver_id: driver,
                client_id: client,
            };
            serde_json::to_value(app.lifecycle().list(&filter).await?)?
        }
        Commands::Summary => {
            let summary = app.lifecycle().status_summary().await?;
            json!({
                "pending": summary.pending,
                "in_progress": summary.in_progress,
                "completed": summary.completed,
                "canceled": summary.canceled,
                "total": summary.total(),
            })
        }
        Commands::Distance { from, to } => {
            serde_json::to_value(app.engine().distance_between(from, to).await?)?
        }
    };
    Ok(output)
}

fn error_body(err: &DispatchError) -> Value {
    json!({
        "error": {
            "kind": kind_label(err.kind()),
            "message": err.user_message(),
            "detail": err.to_string(),
        }
    })
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "not_found",
        ErrorKind::Conflict => "conflict",
        ErrorKind::InvalidInput => "invalid_input",
        ErrorKind::Internal => "internal",
    }
}

fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::NotFound => 3,
        ErrorKind::Conflict => 4,
        ErrorKind::InvalidInput => 2,
        ErrorKind::Internal => 1,
    }
}

fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Logs go to stderr so stdout stays machine-readable JSON.
    match log_format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .context("failed to initialise JSON logging")?;
        }
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()
                .context("failed to initialise pretty logging")?;
        }
        _ => {
            return Err(anyhow::anyhow!("unsupported log format: {log_format}"));
        }
    }

    Ok(())
}
