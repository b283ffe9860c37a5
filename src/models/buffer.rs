use super::SeenItem;

/// Read marks waiting to be written to the store in one batch.
#[derive(Debug)]
pub struct ReadBuffer {
    pending: Vec<SeenItem>,
    threshold: usize,
}

impl ReadBuffer {
    pub fn new(threshold: usize) -> Self {
        Self {
            pending: Vec::new(),
            threshold: threshold.max(1),
        }
    }

    /// Queues `item` and reports whether the batch is due for a flush.
    /// Repeated marks of the same item only refresh its title and url.
    pub fn push(&mut self, item: SeenItem) -> bool {
        match self.pending.iter_mut().find(|p| p.hn_id == item.hn_id) {
            Some(existing) => *existing = item,
            None => self.pending.push(item),
        }
        self.pending.len() >= self.threshold
    }

    pub fn take(&mut self) -> Vec<SeenItem> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[SeenItem] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
