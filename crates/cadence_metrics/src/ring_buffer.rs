//! Fixed-capacity window of durations for rolling averages

use std::time::Duration;

/// Keeps the newest `capacity` samples; older ones are overwritten in place.
pub struct RingBuffer<T> {
    samples: Vec<T>,
    capacity: usize,
    next: usize,
}

impl<T> RingBuffer<T> {
    /// A zero capacity is bumped to one so `push` always keeps the newest sample.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            next: 0,
        }
    }

    pub fn push(&mut self, sample: T) {
        if self.samples.len() < self.capacity {
            self.samples.push(sample);
        } else {
            self.samples[self.next] = sample;
        }
        self.next = (self.next + 1) % self.capacity;
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
}

impl RingBuffer<Duration> {
    pub fn average(&self) -> Duration {
        match u32::try_from(self.samples.len()) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.samples.iter().sum::<Duration>() / n,
        }
    }

    pub fn min_max(&self) -> (Duration, Duration) {
        self.samples.iter().fold(None, |acc, &sample| match acc {
            None => Some((sample, sample)),
            Some((min, max)) => Some((min.min(sample), max.max(sample))),
        })
        .unwrap_or((Duration::ZERO, Duration::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn oldest_sample_is_overwritten() {
        let mut window = RingBuffer::new(3);

        window.push(ms(10));
        assert_eq!(window.average(), ms(10));

        window.push(ms(20));
        window.push(ms(30));
        assert_eq!(window.average(), ms(20));

        window.push(ms(40));
        assert_eq!(window.len(), 3);
        assert_eq!(window.average(), ms(30));
        assert_eq!(window.min_max(), (ms(20), ms(40)));
    }

    #[test]
    fn empty_and_zero_capacity() {
        let empty: RingBuffer<Duration> = RingBuffer::new(4);
        assert!(empty.is_empty());
        assert_eq!(empty.average(), Duration::ZERO);
        assert_eq!(empty.min_max(), (Duration::ZERO, Duration::ZERO));

        let mut tiny = RingBuffer::new(0);
        assert_eq!(tiny.capacity(), 1);
        tiny.push(ms(1));
        tiny.push(ms(3));
        assert_eq!(tiny.len(), 1);
        assert_eq!(tiny.average(), ms(3));
    }
}
