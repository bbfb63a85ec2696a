//! fauxfn - Local serverless function emulator
//!
//! Serves function modules over HTTP during development, compiling them on
//! demand, and batch-compiles them for deployment.

mod router;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use fauxfn_bridge::{FunctionService, ServiceConfig, Transpiler};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "fauxfn")]
#[command(about = "Local serverless function emulator", long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "FAUXFN_LOG_LEVEL", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve functions over HTTP with on-demand compilation
    Serve {
        #[command(flatten)]
        functions: FunctionArgs,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1", env = "FAUXFN_HOST")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8000", env = "FAUXFN_PORT")]
        port: u16,

        /// Path prefix for function invocations
        #[arg(
            long,
            default_value = "/.netlify/functions/",
            env = "FAUXFN_PREFIX"
        )]
        prefix: String,
    },
    /// Compile every function source file for deployment
    Build {
        #[command(flatten)]
        functions: FunctionArgs,
    },
}

#[derive(clap::Args, Debug)]
struct FunctionArgs {
    /// Directory containing function source files (must exist)
    #[arg(long, env = "FAUXFN_FUNCTIONS_SRC")]
    functions_src: PathBuf,

    /// Directory for compiled output (created if missing)
    #[arg(long, env = "FAUXFN_FUNCTIONS_OUTPUT")]
    functions_output: PathBuf,

    /// Recognized source extensions, in priority order
    #[arg(
        long,
        value_delimiter = ',',
        default_value = ".es6,.es,.js,.mjs,.ts,.tsx",
        env = "FAUXFN_EXTENSIONS"
    )]
    extensions: Vec<String>,

    /// Program used to execute compiled handlers
    #[arg(long, default_value = "node", env = "FAUXFN_RUNTIME")]
    runtime: String,

    /// External compiler program
    #[arg(long, default_value = "npx", env = "FAUXFN_TRANSPILER")]
    transpiler: String,

    /// Arguments passed to the compiler before the source path
    #[arg(long, value_delimiter = ',', env = "FAUXFN_TRANSPILER_ARGS")]
    transpiler_args: Vec<String>,
}

impl FunctionArgs {
    fn into_config(self) -> ServiceConfig {
        let default = Transpiler::default();
        let transpiler = if self.transpiler == default.program && self.transpiler_args.is_empty() {
            default
        } else {
            Transpiler::new(self.transpiler, self.transpiler_args)
        };

        let mut config = ServiceConfig::new(self.functions_src, self.functions_output);
        config.extensions = self.extensions;
        config.runtime_program = self.runtime;
        config.transpiler = transpiler;
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "fauxfn={0},fauxfn_bridge={0},tower_http=debug",
                    args.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match args.command {
        Command::Serve {
            functions,
            host,
            port,
            prefix,
        } => serve(functions.into_config(), &host, port, &prefix).await,
        Command::Build { functions } => build(functions.into_config()).await,
    }
}

async fn serve(config: ServiceConfig, host: &str, port: u16, prefix: &str) -> anyhow::Result<()> {
    config.prepare()?;

    info!("Starting fauxfn...");
    info!("  Functions source: {}", config.functions_src.display());
    info!("  Functions output: {}", config.functions_output.display());
    info!("  Prefix: {prefix}");

    let service = Arc::new(FunctionService::new(config));
    let app = router::create_router(service, prefix);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!("Listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build(config: ServiceConfig) -> anyhow::Result<()> {
    config.prepare()?;

    let service = FunctionService::new(config);
    let compiled = service.build_all().await?;
    info!(count = compiled, "Build complete");

    Ok(())
}
