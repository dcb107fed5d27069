mod cli;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use procvisor::{Invocation, LoadedConfig, Supervisor, config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    match cli.command {
        cli::Commands::Run { config } => {
            let loaded = config::load(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            tracing::info!(
                config = %config.display(),
                workers = loaded.workers.len(),
                restart_automatically = loaded.supervisor.restart.automatic,
                restart_delay_ms = loaded.supervisor.restart.delay.as_millis() as u64,
                "Supervisor starting"
            );

            Supervisor::with_os(loaded.supervisor)
                .serve(loaded.workers)
                .await
                .context("supervisor stopped")?;
            tracing::info!("Supervisor stopped");
        }
        cli::Commands::Check { config } => {
            let loaded = config::load(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            print_summary(&loaded);
        }
    }

    Ok(())
}

fn print_summary(loaded: &LoadedConfig) {
    let cfg = &loaded.supervisor;
    println!(
        "restart-automatically = {}\nrestart-delay = {:?}\nlaunch-stagger = {:?}\nprobe-interval = {:?}\nmax-restart-attempts = {}",
        cfg.restart.automatic,
        cfg.restart.delay,
        cfg.stagger,
        cfg.probe_interval,
        cfg.max_restart_attempts,
    );

    for (i, def) in loaded.workers.iter().enumerate() {
        match def.resolve_path() {
            Ok(path) => {
                let inv = Invocation::resolve(path, def.params());
                let shape = if inv.is_interpreted() { "script" } else { "direct" };
                println!(
                    "[{i}] {}: {shape} {} {}",
                    def.label(),
                    inv.program(),
                    inv.args().join(" ")
                );
            }
            Err(e) => println!("[{i}] {}: SKIPPED ({e})", def.label()),
        }
    }
}
