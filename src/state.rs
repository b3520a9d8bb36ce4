//! The banner's one piece of shared mutable state. All four recurring tasks
//! hold a reference to this; the rotator advances the index, the refresher
//! swaps the item list, and everyone writes through the banner.

use crate::{
    api::WeatherItem,
    banner::{Banner, Region, PLACEHOLDER},
};
use indexmap::IndexMap;

pub struct BannerState {
    pub banner: Banner,
    /// Display label overrides from the overlay config
    labels: IndexMap<String, String>,
    /// Current readings, already sorted into rotation order
    items: Vec<WeatherItem>,
    /// Which item is (or will be) on screen. Always within bounds while
    /// `items` is non-empty.
    index: usize,
}

impl BannerState {
    pub fn new(
        banner: Banner,
        labels: IndexMap<String, String>,
        items: Vec<WeatherItem>,
    ) -> Self {
        Self {
            banner,
            labels,
            items,
            index: 0,
        }
    }

    /// Write the item at the current index to the banner, or placeholders if
    /// there are no items. Unchanged values are absorbed by the banner, so
    /// calling this repeatedly is harmless.
    pub fn render(&mut self) -> anyhow::Result<()> {
        match self.items.get(self.index) {
            Some(item) => {
                let label = self
                    .labels
                    .get(&item.city)
                    .unwrap_or(&item.city)
                    .clone();
                let temperature = item.temperature_text();
                self.banner.set_text(Region::City, label)?;
                self.banner.set_text(Region::Temperature, temperature)?;
            }
            None => {
                self.banner.set_text(Region::City, PLACEHOLDER)?;
                self.banner.set_text(Region::Temperature, PLACEHOLDER)?;
            }
        }
        Ok(())
    }

    /// Step the index forward, wrapping at the end of the list. No-op when
    /// the list is empty.
    pub fn advance(&mut self) {
        if !self.items.is_empty() {
            self.index = (self.index + 1) % self.items.len();
        }
    }

    /// Swap in a freshly fetched item list. An empty list is rejected; the
    /// stale data we have beats no data. The index is clamped by modulo
    /// against the new length, never reset, so the rotation picks up roughly
    /// where it left off.
    pub fn replace_items(&mut self, items: Vec<WeatherItem>) {
        if items.is_empty() {
            return;
        }
        self.index %= items.len();
        self.items = items;
    }
}
