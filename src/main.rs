use std::future::Future;
use std::path::Path;
use std::process::ExitCode;

use roosevelt::audit::{self, sink::TracingSink};
use roosevelt::cli::{Cli, Command};
use roosevelt::config::{load_config, Manifest, Overrides};
use roosevelt::lifecycle::{spawn_signal_listener, App, Shutdown};
use roosevelt::observability::{init_logging, LogHandle};
use roosevelt::scaffold;
use roosevelt::validator::{self, HostRequest};

fn main() -> ExitCode {
    // Spawned as a detached validator host: the command line is not ours.
    if let Some(request) = HostRequest::from_env() {
        let logging = init_logging();
        let mut builder = tokio::runtime::Builder::new_current_thread();
        builder.enable_all();
        return block_on(builder, host(request, logging));
    }

    let (cli, ignored) = match Cli::parse_lenient(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(err) => err.exit(),
    };
    let logging = init_logging();
    if !ignored.is_empty() {
        tracing::debug!(?ignored, "Ignoring unrecognized arguments");
    }

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Command::Start(args) = &cli.command {
        if let Some(cores) = args.cores {
            let threads = cores.worker_threads();
            tracing::info!(threads, "Sizing worker pool");
            builder.worker_threads(threads);
        }
    }
    block_on(builder, run(cli, logging))
}

fn block_on<F>(mut builder: tokio::runtime::Builder, task: F) -> ExitCode
where
    F: Future<Output = Result<(), Box<dyn std::error::Error>>>,
{
    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(error = %err, "Failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(task) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn host(request: HostRequest, logging: LogHandle) -> Result<(), Box<dyn std::error::Error>> {
    let config = project_config(&request.root)?;
    logging.apply(&config.logging.methods);

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());
    request.run(&config, shutdown.subscribe()).await?;
    Ok(())
}

async fn run(cli: Cli, logging: LogHandle) -> Result<(), Box<dyn std::error::Error>> {
    let root = match cli.root.clone() {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Command::Start(args) => {
            let app = App::builder(&root).overrides(args.overrides()).init()?;
            logging.apply(&app.config().logging.methods);

            let shutdown = Shutdown::new();
            spawn_signal_listener(shutdown.clone());
            app.serve(&shutdown).await?;
        }
        Command::Build(args) => {
            let app = App::builder(&root).overrides(args.overrides()).init()?;
            tracing::info!(written = app.assets().written.len(), "Build complete");
        }
        Command::Audit => {
            audit::audit(cli.root.as_deref(), &mut TracingSink);
        }
        Command::Clean => {
            let config = project_config(&root)?;
            let removed = scaffold::clean(&root, &config)?;
            tracing::info!(removed = removed.len(), "Clean complete");
        }
        Command::KillValidator => match validator::kill_detached(&root)? {
            Some(pid) => tracing::info!(pid, "Stopped detached HTML validator"),
            None => tracing::info!("No detached HTML validator running"),
        },
    }
    Ok(())
}

fn project_config(root: &Path) -> Result<roosevelt::AppConfig, Box<dyn std::error::Error>> {
    let manifest = Manifest::load(root)?;
    Ok(load_config(root, manifest.as_ref(), None, &Overrides::default())?)
}
