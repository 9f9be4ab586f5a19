use tracing::warn;

use crate::models::TerminalDimensions;

/// Where the current terminal size comes from.
pub trait DimensionSource {
    fn dimensions(&self) -> TerminalDimensions;
}

pub struct CrosstermDimensions;

impl DimensionSource for CrosstermDimensions {
    fn dimensions(&self) -> TerminalDimensions {
        match crossterm::terminal::size() {
            Ok((columns, rows)) if columns > 0 && rows > 0 => TerminalDimensions::new(columns, rows),
            Ok(_) => TerminalDimensions::FALLBACK,
            Err(e) => {
                warn!(error = %e, "Terminal size unavailable, assuming 80x24");
                TerminalDimensions::FALLBACK
            }
        }
    }
}

/// Compares samples against the size used by the most recent render.
#[derive(Debug, Default)]
pub struct ResizeWatcher {
    rendered: Option<TerminalDimensions>,
}

impl ResizeWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nothing rendered yet counts as a change.
    pub fn has_changed(&self, current: TerminalDimensions) -> bool {
        self.rendered != Some(current)
    }

    pub fn mark_rendered(&mut self, dimensions: TerminalDimensions) {
        self.rendered = Some(dimensions);
    }

    /// Forgets the last render so the next sample counts as a change.
    pub fn invalidate(&mut self) {
        self.rendered = None;
    }

    pub fn last_rendered(&self) -> Option<TerminalDimensions> {
        self.rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_until_size_differs() {
        let mut watcher = ResizeWatcher::new();
        let size = TerminalDimensions::new(120, 40);
        assert!(watcher.has_changed(size));

        watcher.mark_rendered(size);
        assert!(!watcher.has_changed(size));
        assert!(!watcher.has_changed(size));
        assert!(watcher.has_changed(TerminalDimensions::new(120, 30)));
        assert!(watcher.has_changed(TerminalDimensions::new(100, 40)));
        assert_eq!(watcher.last_rendered(), Some(size));
    }

    #[test]
    fn invalidated_watcher_reports_change_at_same_size() {
        let mut watcher = ResizeWatcher::new();
        let size = TerminalDimensions::new(100, 24);
        watcher.mark_rendered(size);
        assert!(!watcher.has_changed(size));

        watcher.invalidate();
        assert!(watcher.has_changed(size));
        assert_eq!(watcher.last_rendered(), None);
    }
}
