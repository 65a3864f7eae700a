#![allow(clippy::len_without_is_empty)]
use std::ops::Index;

/// A fixed-capacity ringbuffer backed by an arena and a monotonic write cursor
///
/// The `n`th push (counting from 1) lands in slot `(n - 1) % capacity`, so once full the buffer holds the most recent
/// `capacity` items.
#[derive(Debug, Default, Clone)]
pub struct RingBuffer<T> {
    buffer: Vec<T>,
    ix: usize,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// **Panics** if `capacity` is zero
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be positive");
        Self {
            buffer: Vec::<T>::with_capacity(capacity),
            ix: 0,
            capacity,
        }
    }

    /// Rebuild a buffer from items listed oldest first, given the lifetime number of pushes that produced them
    ///
    /// Only the newest `capacity` items are kept. When the restored buffer is full, items are laid out so the newest
    /// sits in slot `(total_pushes - 1) % capacity`, as if it had been filled by pushing.
    pub fn from_chronological(mut items: Vec<T>, capacity: usize, total_pushes: u64) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be positive");
        if items.len() > capacity {
            items.drain(..items.len() - capacity);
        }

        if items.len() < capacity {
            let ix = items.len();
            let mut buffer = Vec::with_capacity(capacity);
            buffer.extend(items);
            return Self {
                buffer,
                ix,
                capacity,
            };
        }

        let shift = (total_pushes % capacity as u64) as usize;
        items.rotate_right(shift);
        Self {
            buffer: items,
            ix: shift,
            capacity,
        }
    }

    /// Returns the buffer length
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert an element into the buffer, overwriting the oldest element, and return the write index
    pub fn push(&mut self, item: T) -> usize {
        let ix = self.ix;
        if ix >= self.len() {
            self.buffer.push(item);
        } else {
            self.buffer[ix] = item;
        }
        self.ix = (ix + 1) % self.capacity;
        ix
    }

    /// Get a slice view of the internal buffer in slot order
    pub fn view(&self) -> &[T] {
        &self.buffer
    }

    /// Iterate over the stored items from oldest to newest
    pub fn chronological(&self) -> impl Iterator<Item = &T> {
        let split = if self.len() < self.capacity { 0 } else { self.ix };
        self.buffer[split..].iter().chain(self.buffer[..split].iter())
    }
}

impl<T> Index<usize> for RingBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.buffer[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ringbuffer_functional() {
        let mut buf = RingBuffer::new(4);
        assert_eq!(buf.len(), 0, "initialized empty");

        for i in 0..4 {
            buf.push(i * 2);
        }

        assert_eq!(buf.len(), 4, "length correct");
        assert_eq!(buf.view(), [0, 2, 4, 6], "contents correct");

        buf.push(1);
        let ix = buf.push(3);
        assert_eq!(ix, 1, "write index is correct");
        assert_eq!(buf.len(), 4, "length unchanged");
        assert_eq!(buf.view(), [1, 3, 4, 6], "contents overwritten correctly");
        assert_eq!(
            buf.chronological().copied().collect::<Vec<_>>(),
            [4, 6, 1, 3],
            "chronological order starts at the oldest slot"
        );
    }

    #[test]
    fn restore_places_newest_in_push_slot() {
        let mut pushed = RingBuffer::new(4);
        for i in 0..7 {
            pushed.push(i);
        }
        let items = pushed.chronological().copied().collect::<Vec<_>>();
        let restored = RingBuffer::from_chronological(items, 4, 7);

        assert_eq!(restored.view(), pushed.view(), "slot layout reproduced");

        let mut a = restored.clone();
        let mut b = pushed.clone();
        assert_eq!(a.push(99), b.push(99), "cursor reproduced");
    }

    #[test]
    fn restore_truncates_to_newest() {
        let restored = RingBuffer::from_chronological((0..10).collect(), 3, 10);
        let mut kept = restored.chronological().copied().collect::<Vec<_>>();
        kept.sort();
        assert_eq!(kept, [7, 8, 9], "only the newest items survive");
        assert_eq!(restored[(10 - 1) % 3], 9, "newest in push slot");
    }

    #[test]
    fn restore_partial_buffer_appends() {
        let mut restored = RingBuffer::from_chronological(vec![1, 2], 4, 2);
        assert_eq!(restored.push(3), 2, "next write follows the restored items");
    }
}
