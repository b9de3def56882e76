use crate::item::Item;
use std::collections::{HashSet, VecDeque};

/// FIFO store of admitted, not yet dispatched items.
///
/// No two queued items share a URL. A `HashSet` index mirrors the queue so
/// membership checks do not scan.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: VecDeque<Item>,
    urls: HashSet<String>,
}

impl WorkQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `item` at the tail.
    ///
    /// Returns `false` and drops the item when its URL is already queued.
    pub fn enqueue(&mut self, item: Item) -> bool {
        if !is_new(self, item.url()) {
            return false;
        }
        self.urls.insert(item.url().to_string());
        self.items.push_back(item);
        true
    }

    /// Removes and returns the head item, `None` when the queue is empty.
    pub fn dequeue(&mut self) -> Option<Item> {
        let item = self.items.pop_front()?;
        self.urls.remove(item.url());
        Some(item)
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Exact-match membership test on the URL.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Iterates queued items head first.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }
}

/// True when no queued item has exactly this URL.
#[must_use]
pub fn is_new(queue: &WorkQueue, url: &str) -> bool {
    !queue.contains(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = WorkQueue::new();
        assert!(queue.enqueue(Item::new("u1", "a")));
        assert!(queue.enqueue(Item::new("u2", "b")));

        assert_eq!(queue.dequeue().map(|i| i.url().to_string()), Some("u1".to_string()));
        assert_eq!(queue.dequeue().map(|i| i.url().to_string()), Some("u2".to_string()));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_dequeue_empty_returns_none() {
        let mut queue = WorkQueue::new();
        assert!(queue.dequeue().is_none());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_duplicate_url_rejected() {
        let mut queue = WorkQueue::new();
        assert!(queue.enqueue(Item::new("u1", "first")));
        assert!(!queue.enqueue(Item::new("u1", "second")));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.iter().next().map(Item::caption), Some("first"));
    }

    #[test]
    fn test_url_can_return_after_dispatch() {
        let mut queue = WorkQueue::new();
        queue.enqueue(Item::new("u1", ""));
        queue.dequeue();
        assert!(is_new(&queue, "u1"));
        assert!(queue.enqueue(Item::new("u1", "")));
    }

    #[test]
    fn test_dedup_has_no_normalization() {
        let mut queue = WorkQueue::new();
        queue.enqueue(Item::new("https://cdn/a.jpg", ""));
        assert!(is_new(&queue, "https://cdn/a.jpg?x=1"));
        assert!(is_new(&queue, "HTTPS://cdn/a.jpg"));
        assert!(!is_new(&queue, "https://cdn/a.jpg"));
    }

    proptest! {
        #[test]
        fn prop_queued_urls_stay_unique(ops in proptest::collection::vec((0u8..8, any::<bool>()), 0..64)) {
            let mut queue = WorkQueue::new();
            for (url, pop) in ops {
                if pop {
                    queue.dequeue();
                } else {
                    queue.enqueue(Item::new(format!("u{url}"), ""));
                }
                let mut seen = HashSet::new();
                for item in queue.iter() {
                    prop_assert!(seen.insert(item.url().to_string()));
                }
                prop_assert_eq!(seen.len(), queue.len());
            }
        }
    }
}
