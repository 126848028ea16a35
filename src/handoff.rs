//! Most-recent-wins hand-off between a capture thread and the tracker.
//!
//! A single slot: publishing replaces any frame that was not consumed yet, so
//! a slow consumer silently skips intermediate frames. There is no queue and
//! no backpressure on the producer.
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    closed: bool,
    published: u64,
    dropped: u64,
}

#[derive(Debug)]
pub struct LatestFrame<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Default for LatestFrame<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LatestFrame<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                closed: false,
                published: 0,
                dropped: 0,
            }),
            ready: Condvar::new(),
        }
    }

    /// Store `value`, replacing an unconsumed one. Returns `false` (and drops
    /// `value`) once the slot is closed.
    pub fn publish(&self, value: T) -> bool {
        let mut slot = self.slot.lock();
        if slot.closed {
            return false;
        }
        if slot.value.replace(value).is_some() {
            slot.dropped += 1;
        }
        slot.published += 1;
        drop(slot);
        self.ready.notify_one();
        true
    }

    /// Latest frame, if any, without blocking.
    pub fn take(&self) -> Option<T> {
        self.slot.lock().value.take()
    }

    /// Block until a frame is available or the slot is closed. A frame
    /// published before `close` is still delivered.
    pub fn wait_take(&self) -> Option<T> {
        let mut slot = self.slot.lock();
        loop {
            if let Some(v) = slot.value.take() {
                return Some(v);
            }
            if slot.closed {
                return None;
            }
            self.ready.wait(&mut slot);
        }
    }

    pub fn wait_take_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.slot.lock();
        loop {
            if let Some(v) = slot.value.take() {
                return Some(v);
            }
            if slot.closed {
                return None;
            }
            if self.ready.wait_until(&mut slot, deadline).timed_out() {
                return slot.value.take();
            }
        }
    }

    /// Refuse further frames and wake every waiter.
    pub fn close(&self) {
        self.slot.lock().closed = true;
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.slot.lock().closed
    }

    pub fn published(&self) -> u64 {
        self.slot.lock().published
    }

    /// Frames overwritten before anyone took them.
    pub fn dropped(&self) -> u64 {
        self.slot.lock().dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn latest_frame_wins() {
        let slot = LatestFrame::new();
        assert!(slot.publish(1));
        assert!(slot.publish(2));
        assert!(slot.publish(3));
        assert_eq!(slot.take(), Some(3));
        assert_eq!(slot.take(), None);
        assert_eq!(slot.published(), 3);
        assert_eq!(slot.dropped(), 2);
    }

    #[test]
    fn close_wakes_waiters_and_rejects_frames() {
        let slot = Arc::new(LatestFrame::<u32>::new());
        let waiter = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || slot.wait_take())
        };
        thread::sleep(Duration::from_millis(20));
        slot.close();
        assert_eq!(waiter.join().expect("waiter"), None);
        assert!(!slot.publish(7));
        assert!(slot.is_closed());
    }

    #[test]
    fn pending_frame_survives_close() {
        let slot = LatestFrame::new();
        slot.publish("frame");
        slot.close();
        assert_eq!(slot.wait_take(), Some("frame"));
        assert_eq!(slot.wait_take(), None);
    }

    #[test]
    fn timeout_returns_none_without_frames() {
        let slot = LatestFrame::<u8>::new();
        assert_eq!(slot.wait_take_timeout(Duration::from_millis(10)), None);
    }

    #[test]
    fn consumer_sees_increasing_frames() {
        let slot = Arc::new(LatestFrame::new());
        let producer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                for i in 0..500u32 {
                    slot.publish(i);
                }
                slot.close();
            })
        };
        let mut seen = Vec::new();
        while let Some(v) = slot.wait_take() {
            seen.push(v);
        }
        producer.join().expect("producer");
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(seen.last(), Some(&499));
        assert_eq!(seen.len() as u64 + slot.dropped(), 500);
    }
}
