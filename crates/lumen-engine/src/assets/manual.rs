use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::mpsc;

use super::{AssetResult, AssetSource};

/// Source completed by hand, for tests and in-memory assets.
///
/// Requests stay pending until `complete` is called for their id.
#[derive(Default)]
pub struct ManualAssetSource {
    pending: RefCell<HashMap<String, Vec<mpsc::Sender<AssetResult>>>>,
}

impl ManualAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unanswered requests for `id`.
    pub fn pending(&self, id: &str) -> usize {
        self.pending.borrow().get(id).map_or(0, Vec::len)
    }

    /// Answers every pending request for `id`. Returns how many were answered.
    pub fn complete(&self, id: &str, result: AssetResult) -> usize {
        let senders = self.pending.borrow_mut().remove(id).unwrap_or_default();
        senders
            .into_iter()
            .filter(|tx| tx.send(result.clone()).is_ok())
            .count()
    }
}

impl AssetSource for ManualAssetSource {
    fn request(&self, id: &str) -> mpsc::Receiver<AssetResult> {
        let (tx, rx) = mpsc::channel();
        self.pending
            .borrow_mut()
            .entry(id.to_string())
            .or_default()
            .push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetError;
    use crate::backend::Image;

    #[test]
    fn completes_pending_requests() {
        let source = ManualAssetSource::new();
        let rx = source.request("tex");
        assert_eq!(source.pending("tex"), 1);
        assert!(rx.try_recv().is_err());

        assert_eq!(source.complete("tex", Ok(Image::solid(1, 1, [1, 2, 3, 4]))), 1);
        assert_eq!(rx.try_recv().unwrap().unwrap().pixel(0, 0), [1, 2, 3, 4]);
        assert_eq!(source.pending("tex"), 0);
    }

    #[test]
    fn dropped_receivers_are_not_counted() {
        let source = ManualAssetSource::new();
        drop(source.request("tex"));
        assert_eq!(source.complete("tex", Err(AssetError::new("tex", "gone"))), 0);
    }
}
