use std::collections::VecDeque;

/// Sliding window over the most recent load samples.
pub struct RingBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl RingBuffer {
    /// A window of `capacity` samples. A capacity of zero is treated as
    /// one, which disables smoothing.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a sample, evicting the oldest once the window is full.
    pub fn add(&mut self, sample: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }
}
