//! nestforge CLI - build, inspect and serve NESTML model modules.

mod build;
mod catalog;
mod colors;
mod serve;
mod specs;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nestforge_server::{DEFAULT_GENERATOR, DEFAULT_PORT, ErrorBody};

#[derive(Parser)]
#[command(name = "nestforge")]
#[command(about = "Build, inspect and serve NESTML model modules")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory all modules are built under [default: <temp dir>/nestmlmodules]
    #[arg(long, global = true, env = "NESTML_MODULES_PATH")]
    modules_path: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host address to bind to
        #[arg(long, env = "NESTML_SERVER_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "NESTML_SERVER_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Code generator program
        #[arg(long, env = "NESTFORGE_GENERATOR", default_value = DEFAULT_GENERATOR)]
        generator: String,
    },

    /// Build model files into a module
    Build {
        /// Model files or directories containing *.nestml files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Module to build into
        #[arg(short, long)]
        module: Option<String>,

        /// Code generator program
        #[arg(long, env = "NESTFORGE_GENERATOR", default_value = DEFAULT_GENERATOR)]
        generator: String,
    },

    /// Print the parameters and states of a model file as JSON
    Specs {
        /// Path to the model file
        file: PathBuf,
    },

    /// List built modules
    Modules,

    /// List the models of a module
    Models {
        /// Module name
        module: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = match (&cli.command, cli.verbose) {
        (_, true) => tracing::Level::DEBUG,
        (Commands::Serve { .. }, false) => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };
    let filter =
        tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let modules_root = cli
        .modules_path
        .unwrap_or_else(nestforge_server::default_modules_root);

    // Core errors are reported the same way the server reports them
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(core_err) = err.downcast_ref::<nestforge_core::Error>() {
            anyhow::anyhow!("{}", describe(core_err))
        } else {
            err
        }
    };

    match cli.command {
        Commands::Serve {
            host,
            port,
            generator,
        } => {
            serve::execute(host, port, modules_root, generator)
                .await
                .map_err(format_error)?;
        }

        Commands::Build {
            paths,
            module,
            generator,
        } => {
            build::execute(&paths, module, &modules_root, &generator).map_err(format_error)?;
        }

        Commands::Specs { file } => specs::execute(&file).map_err(format_error)?,

        Commands::Modules => catalog::list_modules(&modules_root).map_err(format_error)?,

        Commands::Models { module } => {
            catalog::list_models(&modules_root, &module).map_err(format_error)?;
        }
    }

    Ok(())
}

/// `"<Kind>: <detail>"` or `"<Kind> at line <n>: <detail>"`.
pub(crate) fn describe(err: &nestforge_core::Error) -> String {
    ErrorBody::new(err.kind(), &err.to_string(), err.line()).message
}
