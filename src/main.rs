mod api;
mod banner;
mod config;
mod state;
mod tasks;

use crate::{
    api::Api,
    banner::{Banner, TermSurface},
    config::Config,
    state::BannerState,
    tasks::{Clock, KeepAlive, Refresher, Rotator, SharedState, Task},
};
use log::{error, info};
use std::sync::Arc;
use tokio::sync::RwLock;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let config = Config::load();
    let api = Arc::new(Api::new(&config.api_host)?);

    // Config and the first data load happen once, up front. Both fall back
    // to empty defaults, so a dead backend still yields a running banner:
    // all dashes until the refresher finds something
    let overlay = api.overlay_config().await;
    info!("Loaded overlay config: {overlay:?}");
    let items = api.weather(&overlay.cities).await;
    info!("Loaded {} weather items", items.len());

    let banner = Banner::new(Box::new(TermSurface::default()));
    let state = Arc::new(RwLock::new(BannerState::new(
        banner,
        overlay.labels,
        items,
    )));

    spawn(Rotator::new(overlay.cycle), &state);
    spawn(Clock, &state);
    spawn(Refresher::new(Arc::clone(&api), overlay.cities), &state);
    spawn(KeepAlive::new(api), &state);

    // The timers run for the life of the process
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}

/// Run a task on its own timer, for the life of the process
fn spawn(task: impl Task, state: &SharedState) {
    let name = task.name();
    let state = Arc::clone(state);
    tokio::spawn(async move {
        if let Err(err) = task.run(state).await {
            error!("Task {name} failed: {err:?}");
        }
    });
}
