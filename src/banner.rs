//! Text output for the banner's three display regions. The overlay itself
//! lives elsewhere (a browser source, typically), so output goes through the
//! [Surface] trait; [TermSurface] is the built-in implementation that renders
//! the banner as a terminal status line.

use std::io::{self, Write};

/// Shown in place of a reading when there's no data
pub const PLACEHOLDER: &str = "—";

/// One of the banner's display regions
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Region {
    City,
    Temperature,
    Clock,
}

impl Region {
    fn index(self) -> usize {
        match self {
            Region::City => 0,
            Region::Temperature => 1,
            Region::Clock => 2,
        }
    }
}

/// Somewhere banner text can end up. Implementations only ever see changed
/// values; [Banner] does the diffing.
pub trait Surface: Send + Sync {
    /// Replace the text content of a region
    fn set_text(&mut self, region: Region, text: &str) -> anyhow::Result<()>;

    /// Re-trigger the attention animation on a region. Called after every
    /// text change, never otherwise.
    fn pulse(&mut self, region: Region) -> anyhow::Result<()>;
}

/// Tracks what each region currently shows, and forwards *changes* to the
/// surface. Writing a value equal to the current one is a no-op, so the
/// attention animation only fires when something actually changed.
pub struct Banner {
    surface: Box<dyn Surface>,
    current: [Option<String>; 3],
}

impl Banner {
    pub fn new(surface: Box<dyn Surface>) -> Self {
        Self {
            surface,
            current: Default::default(),
        }
    }

    /// Write text to a region, if it differs from what's shown there
    pub fn set_text(
        &mut self,
        region: Region,
        text: impl Into<String>,
    ) -> anyhow::Result<()> {
        let text = text.into();
        let slot = &mut self.current[region.index()];
        if slot.as_deref() == Some(text.as_str()) {
            return Ok(());
        }
        self.surface.set_text(region, &text)?;
        self.surface.pulse(region)?;
        *slot = Some(text);
        Ok(())
    }
}

/// Renders the banner as a single rewritten line on stdout
#[derive(Debug, Default)]
pub struct TermSurface {
    text: [String; 3],
}

impl Surface for TermSurface {
    fn set_text(&mut self, region: Region, text: &str) -> anyhow::Result<()> {
        self.text[region.index()] = text.to_owned();
        let [city, temperature, clock] = &self.text;
        let mut stdout = io::stdout().lock();
        // \x1b[2K clears the previous line, since the new one may be shorter
        write!(stdout, "\r\x1b[2K[{clock}] {city} {temperature}")?;
        stdout.flush()?;
        Ok(())
    }

    fn pulse(&mut self, _: Region) -> anyhow::Result<()> {
        // Nothing to animate on a terminal
        Ok(())
    }
}
