//! Bounded, append-only history of recent samples.

use std::collections::VecDeque;

use super::sample::Sample;

/// Number of samples kept in the recent-history window.
pub const BUFFER_CAPACITY: usize = 240;

/// Fixed-capacity ordered sequence of samples.
///
/// Appends go to the back; once the capacity is exceeded the oldest samples
/// are dropped from the front, so `len() <= capacity()` holds after every
/// mutation. The buffer does not validate what it is given: malformed
/// payloads are rejected before they get here.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleBuffer {
    /// Create an empty buffer holding up to [`BUFFER_CAPACITY`] samples.
    pub fn new() -> Self {
        Self::with_capacity(BUFFER_CAPACITY)
    }

    /// Create an empty buffer with a custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one sample, evicting from the front if the buffer overflows.
    pub fn append(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Current contents in insertion order.
    pub fn snapshot(&self) -> &VecDeque<Sample> {
        &self.samples
    }

    /// Heart-rate values in insertion order.
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// The most recently appended sample.
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(buffer: &mut SampleBuffer, count: usize) {
        for i in 0..count {
            buffer.append(Sample::new(i as i64 * 1000, 60.0 + i as f64));
        }
    }

    #[test]
    fn test_append_below_capacity() {
        let mut buffer = SampleBuffer::new();
        fill(&mut buffer, 10);
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.snapshot()[0].value, 60.0);
        assert_eq!(buffer.latest().unwrap().value, 69.0);
    }

    #[test]
    fn test_keeps_last_n_in_order() {
        for extra in [0usize, 1, 7, BUFFER_CAPACITY, 3 * BUFFER_CAPACITY + 5] {
            let mut buffer = SampleBuffer::new();
            let total = BUFFER_CAPACITY + extra;
            fill(&mut buffer, total);

            assert_eq!(buffer.len(), BUFFER_CAPACITY);
            let expected: Vec<f64> =
                (extra..total).map(|i| 60.0 + i as f64).collect();
            assert_eq!(buffer.values(), expected);
        }
    }

    #[test]
    fn test_small_capacity_evicts_oldest() {
        let mut buffer = SampleBuffer::with_capacity(3);
        fill(&mut buffer, 5);
        let timestamps: Vec<i64> = buffer.snapshot().iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![2000, 3000, 4000]);
    }

    #[test]
    fn test_clear() {
        let mut buffer = SampleBuffer::new();
        fill(&mut buffer, 4);
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.latest().is_none());
    }
}
