//! `cadence`: runs the demo scene until a stop is requested.
//!
//! Usage: `cadence [settings.json]`. Log verbosity follows `RUST_LOG`
//! (default `cadence=info`).

mod demo;
mod settings;

use anyhow::Result;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cadence_core::Game;
use settings::RuntimeSettings;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cadence=info")),
        )
        .with_thread_names(true)
        .init();

    info!("Cadence v{}", cadence_core::VERSION);
    if !cadence_metrics::ENABLED {
        info!("built without metrics; timings will read zero");
    }

    let path = std::env::args().nth(1);
    let settings = RuntimeSettings::load(path.as_deref().map(Path::new))?;

    let mut game = Game::with_config(settings.scheduler.clone());
    demo::populate(&game, &settings)?;
    demo::install(&mut game, &settings)?;
    info!(
        entities = game.world().entity_count(),
        systems = game.systems().count(),
        "scene ready"
    );

    if settings.run_for_secs > 0.0 {
        let stop = game.stop_handle();
        let run_for = Duration::from_secs_f64(settings.run_for_secs);
        thread::Builder::new()
            .name("cadence-timer".into())
            .spawn(move || {
                thread::sleep(run_for);
                stop.stop();
            })?;
    }

    let summary = game.start()?;
    println!("{summary}");
    Ok(())
}
