use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, info};

use streamkeys::config as cfg;
use streamkeys::resolver::{self, ResolveContext};

/// streamkeys CLI
#[derive(Debug, Parser)]
#[command(
    name = streamkeys::PKG_NAME,
    version = streamkeys::PKG_VERSION,
    about = "Validate stream-trigger action configs and resolve their deferred values"
)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short = 'c', long = "config", default_value = "config/default.json")]
    config: PathBuf,

    /// Path to a JSON resolve context; when given (or any override below), print the resolved config
    #[arg(long = "context")]
    context: Option<PathBuf>,

    /// Override the context's base_time
    #[arg(long = "base-time")]
    base_time: Option<f64>,

    /// Override the context's default amount for "config" entries
    #[arg(long = "amount")]
    amount: Option<f64>,

    /// Override the context's seed for "true?false" choices
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Print the JSON Schema for the configuration document and exit
    #[arg(long = "print-schema")]
    print_schema: bool,
}

impl Args {
    fn wants_resolution(&self) -> bool {
        self.context.is_some()
            || self.base_time.is_some()
            || self.amount.is_some()
            || self.seed.is_some()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    streamkeys::init_tracing(args.log_level.as_deref());

    if args.print_schema {
        cfg::write_schema_to_writer(std::io::stdout().lock())?;
        println!();
        return Ok(());
    }

    info!(
        version = streamkeys::PKG_VERSION,
        config = %args.config.display(),
        "Starting streamkeys"
    );

    let config = cfg::load_from_path_async(&args.config).await?;
    info!(
        target: "streamkeys",
        bits = config.bits().len(),
        subs = config.subs().len(),
        donations = config.donations().len(),
        actions = ?config.supported_actions(),
        "Configuration is valid"
    );

    if !args.wants_resolution() {
        return Ok(());
    }

    let mut ctx = match &args.context {
        Some(path) => resolver::load_context_from_path_async(path).await?,
        None => ResolveContext::new(),
    };
    if let Some(base_time) = args.base_time {
        ctx = ctx.with_base_time(base_time);
    }
    if let Some(amount) = args.amount {
        ctx = ctx.with_amount(amount);
    }
    if let Some(seed) = args.seed {
        ctx = ctx.with_seed(seed);
    }
    debug!(target: "streamkeys", ?ctx, "Resolving with context");

    let resolved = config.resolve(&ctx)?;
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}
