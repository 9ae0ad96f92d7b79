//! Scan event delivery.

use crate::shop::ShopRecord;

/// Receives scan events as they happen.
///
/// Every method has a no-op default so observers only implement what they
/// care about. Calls arrive on the scanning thread, in order.
pub trait ScanObserver {
    /// A shop was confirmed and fully decoded
    fn shop_found(&mut self, _shop: &ShopRecord) {}

    /// `current` of `total` regions have been scanned
    fn progress(&mut self, _current: usize, _total: usize) {}

    /// Human-readable status line
    fn status(&mut self, _message: &str) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

type ShopFn<'a> = Box<dyn FnMut(&ShopRecord) + 'a>;
type ProgressFn<'a> = Box<dyn FnMut(usize, usize) + 'a>;
type StatusFn<'a> = Box<dyn FnMut(&str) + 'a>;

/// Observer assembled from closures
#[derive(Default)]
pub struct ScanCallbacks<'a> {
    on_shop: Option<ShopFn<'a>>,
    on_progress: Option<ProgressFn<'a>>,
    on_status: Option<StatusFn<'a>>,
}

impl<'a> ScanCallbacks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_shop<F: FnMut(&ShopRecord) + 'a>(mut self, f: F) -> Self {
        self.on_shop = Some(Box::new(f));
        self
    }

    pub fn on_progress<F: FnMut(usize, usize) + 'a>(mut self, f: F) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn on_status<F: FnMut(&str) + 'a>(mut self, f: F) -> Self {
        self.on_status = Some(Box::new(f));
        self
    }
}

impl ScanObserver for ScanCallbacks<'_> {
    fn shop_found(&mut self, shop: &ShopRecord) {
        if let Some(f) = self.on_shop.as_mut() {
            f(shop);
        }
    }

    fn progress(&mut self, current: usize, total: usize) {
        if let Some(f) = self.on_progress.as_mut() {
            f(current, total);
        }
    }

    fn status(&mut self, message: &str) {
        if let Some(f) = self.on_status.as_mut() {
            f(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callbacks_forward_events() {
        let mut progress = Vec::new();
        let mut lines = Vec::new();
        {
            let mut callbacks = ScanCallbacks::new()
                .on_progress(|c, t| progress.push((c, t)))
                .on_status(|m| lines.push(m.to_string()));
            callbacks.progress(0, 2);
            callbacks.progress(1, 2);
            callbacks.status("hello");
        }
        assert_eq!(progress, vec![(0, 2), (1, 2)]);
        assert_eq!(lines, vec!["hello".to_string()]);
    }

    #[test]
    fn test_missing_callbacks_are_ignored() {
        let mut callbacks = ScanCallbacks::new();
        callbacks.progress(1, 1);
        callbacks.status("ignored");
    }
}
