use anyhow::{anyhow, Result};
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_EXPANDED_PAGE_SIZE: u32 = 30;
pub const DEFAULT_DISPLAY_LIMIT: usize = 4;
pub const DEFAULT_SCROLL_THRESHOLD: f64 = 0.8;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Paging and polling policy for the bell widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BellPolicy {
    /// First page size when the dropdown opens collapsed.
    pub page_size: u32,
    /// First page size when the dropdown is expanded with a small cache.
    pub expanded_page_size: u32,
    /// Items shown while collapsed.
    pub display_limit: usize,
    /// Fraction of scrollable height that triggers the next page.
    pub scroll_threshold: f64,
    pub poll_interval: Duration,
}

impl Default for BellPolicy {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            expanded_page_size: DEFAULT_EXPANDED_PAGE_SIZE,
            display_limit: DEFAULT_DISPLAY_LIMIT,
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl BellPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.expanded_page_size == 0 {
            return Err(anyhow!("page sizes must be greater than zero"));
        }
        if !(self.scroll_threshold > 0.0 && self.scroll_threshold <= 1.0) {
            return Err(anyhow!("scroll threshold must be in (0, 1]"));
        }
        if self.poll_interval.is_zero() {
            return Err(anyhow!("poll interval must be greater than zero"));
        }
        Ok(())
    }
}
