//! The banner's recurring work: rotation, the clock, the data refresh, and
//! the backend keep-alive ping. Each runs as an independent tokio task on its
//! own timer; they communicate only through the shared [BannerState].

use crate::{api::Api, banner::Region, state::BannerState};
use chrono::{DateTime, Local};
use log::{info, trace};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{sync::RwLock, time};

pub type SharedState = Arc<RwLock<BannerState>>;

/// A recurring piece of banner work. Each task gets its own timer; all state
/// mutation happens synchronously under the lock, at tick granularity.
pub trait Task: Send + Sized + 'static {
    /// Descriptive name, for logging
    fn name(&self) -> &'static str;

    /// Time between ticks
    fn period(&self) -> Duration;

    /// Run once before the first timer wait. Initial renders happen here so
    /// the banner isn't blank for a full period at startup.
    fn on_start(&mut self, _state: &mut BannerState) -> anyhow::Result<()> {
        Ok(())
    }

    /// Run once per period, starting one full period after `on_start`
    fn on_tick(
        &mut self,
        state: &SharedState,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Tick on a fixed period, forever. Only returns on error.
    fn run(
        mut self,
        state: SharedState,
    ) -> impl Future<Output = anyhow::Result<()>> + Send {
        async move {
            info!(
                "Starting task {} (period {:?})",
                self.name(),
                self.period()
            );
            let mut interval = time::interval(self.period());
            self.on_start(&mut *state.write().await)?;
            // An interval's first tick completes immediately; consume it so
            // on_tick only starts firing a full period from now
            interval.tick().await;
            loop {
                interval.tick().await;
                self.on_tick(&state).await?;
            }
        }
    }
}

/// Cycles the city and temperature fields through the item list
pub struct Rotator {
    cycle: Duration,
}

impl Rotator {
    pub fn new(cycle_secs: u64) -> Self {
        Self {
            cycle: Duration::from_secs(cycle_secs),
        }
    }

    /// Show the item at the current index, then step past it. With no items
    /// this shows placeholders and the index stays put.
    fn rotate(state: &mut BannerState) -> anyhow::Result<()> {
        state.render()?;
        state.advance();
        Ok(())
    }
}

impl Task for Rotator {
    fn name(&self) -> &'static str {
        "rotator"
    }

    fn period(&self) -> Duration {
        self.cycle
    }

    fn on_start(&mut self, state: &mut BannerState) -> anyhow::Result<()> {
        Self::rotate(state)
    }

    async fn on_tick(&mut self, state: &SharedState) -> anyhow::Result<()> {
        trace!("Rotation tick");
        Self::rotate(&mut *state.write().await)
    }
}

/// Keeps the clock field on local time
pub struct Clock;

impl Clock {
    const PERIOD: Duration = Duration::from_secs(5);

    fn render(state: &mut BannerState) -> anyhow::Result<()> {
        state.banner.set_text(Region::Clock, clock_text(Local::now()))
    }
}

impl Task for Clock {
    fn name(&self) -> &'static str {
        "clock"
    }

    fn period(&self) -> Duration {
        Self::PERIOD
    }

    fn on_start(&mut self, state: &mut BannerState) -> anyhow::Result<()> {
        Self::render(state)
    }

    async fn on_tick(&mut self, state: &SharedState) -> anyhow::Result<()> {
        Self::render(&mut *state.write().await)
    }
}

/// 24-hour wall clock text
fn clock_text(time: DateTime<Local>) -> String {
    time.format("%H:%M").to_string()
}

/// Re-fetches weather data and swaps it into the shared state
pub struct Refresher {
    api: Arc<Api>,
    cities: Vec<String>,
}

impl Refresher {
    const PERIOD: Duration = Duration::from_secs(60);

    pub fn new(api: Arc<Api>, cities: Vec<String>) -> Self {
        Self { api, cities }
    }
}

impl Task for Refresher {
    fn name(&self) -> &'static str {
        "refresher"
    }

    fn period(&self) -> Duration {
        Self::PERIOD
    }

    async fn on_tick(&mut self, state: &SharedState) -> anyhow::Result<()> {
        // Fetch outside the lock; only the swap itself holds it
        let fresh = self.api.weather(&self.cities).await;
        if fresh.is_empty() {
            // Failed or came back empty: keep showing what we have
            return Ok(());
        }
        trace!("Refreshed {} items", fresh.len());
        state.write().await.replace_items(fresh);
        Ok(())
    }
}

/// Pings the backend so its dataset stays warm
pub struct KeepAlive {
    api: Arc<Api>,
}

impl KeepAlive {
    const PERIOD: Duration = Duration::from_secs(5 * 60);

    pub fn new(api: Arc<Api>) -> Self {
        Self { api }
    }
}

impl Task for KeepAlive {
    fn name(&self) -> &'static str {
        "keep-alive"
    }

    fn period(&self) -> Duration {
        Self::PERIOD
    }

    async fn on_tick(&mut self, _: &SharedState) -> anyhow::Result<()> {
        self.api.keep_alive().await;
        Ok(())
    }
}
