/// Fixed-capacity ring buffer holding clients who wait for a table
///
/// The buffer keeps an explicit element count next to the head index, so full and
/// empty never look alike and every slot is usable.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("queue is full")]
    QueueFull,
    #[error("queue is empty")]
    QueueEmpty,
}

#[derive(Debug, Clone)]
pub struct WaitingQueue<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> WaitingQueue<T> {
    pub fn new(capacity: usize) -> Self {
        WaitingQueue {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Append to the back of the line; a full queue is left untouched
    pub fn push(&mut self, item: T) -> Result<(), QueueError> {
        if self.is_full() {
            return Err(QueueError::QueueFull);
        }
        let tail = (self.head + self.len) % self.capacity();
        self.slots[tail] = Some(item);
        self.len += 1;
        Ok(())
    }

    /// Take the longest-waiting item
    pub fn pop(&mut self) -> Result<T, QueueError> {
        if self.is_empty() {
            return Err(QueueError::QueueEmpty);
        }
        let item = self.slots[self.head].take().ok_or(QueueError::QueueEmpty)?;
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        Ok(item)
    }

    /// Items from the front of the line to the back
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |offset| {
            self.slots[(self.head + offset) % self.capacity()].as_ref()
        })
    }

    /// Drop every item `keep` rejects, preserving the order of the rest
    ///
    /// Compacts in place: survivors slide toward the head, so a slot is only ever
    /// written after it has been read.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        let capacity = self.capacity();
        let mut kept = 0;
        for offset in 0..self.len {
            let Some(item) = self.slots[(self.head + offset) % capacity].take() else {
                continue;
            };
            if keep(&item) {
                self.slots[(self.head + kept) % capacity] = Some(item);
                kept += 1;
            }
        }
        self.len = kept;
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }
}
