//! Blocking double-ended queue with a pool-owned cancellation switch

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Double-ended queue of idle entries that blocking takers can wait on.
///
/// Pushing to the front gives LIFO reuse, pushing to the back gives FIFO.
/// [`cancel`](Self::cancel) is one-shot and permanent: every current and
/// future blocking take returns `None` instead of waiting.
///
/// # Examples
///
/// ```
/// use simple_objectpool::IdleQueue;
///
/// let queue = IdleQueue::new();
/// queue.push_back(1);
/// queue.push_front(2);
/// assert_eq!(queue.pop(), Some(2));
///
/// queue.cancel();
/// assert_eq!(queue.take(), Some(1));
/// assert_eq!(queue.take(), None);
/// ```
pub struct IdleQueue<E> {
    entries: Mutex<VecDeque<E>>,
    not_empty: Condvar,
    len: AtomicUsize,
    cancelled: AtomicBool,
}

impl<E> IdleQueue<E> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
            len: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn push_front(&self, entry: E) {
        let mut entries = self.entries.lock();
        entries.push_front(entry);
        self.len.store(entries.len(), Ordering::Release);
        self.not_empty.notify_one();
    }

    pub fn push_back(&self, entry: E) {
        let mut entries = self.entries.lock();
        entries.push_back(entry);
        self.len.store(entries.len(), Ordering::Release);
        self.not_empty.notify_one();
    }

    /// Push to the front unless the queue already holds `capacity` entries,
    /// in which case the entry is handed back.
    pub fn push_front_bounded(&self, entry: E, capacity: usize) -> Result<(), E> {
        self.push_bounded(entry, capacity, true)
    }

    /// Push to the back unless the queue already holds `capacity` entries,
    /// in which case the entry is handed back.
    pub fn push_back_bounded(&self, entry: E, capacity: usize) -> Result<(), E> {
        self.push_bounded(entry, capacity, false)
    }

    fn push_bounded(&self, entry: E, capacity: usize, front: bool) -> Result<(), E> {
        let mut entries = self.entries.lock();
        if entries.len() >= capacity {
            return Err(entry);
        }
        if front {
            entries.push_front(entry);
        } else {
            entries.push_back(entry);
        }
        self.len.store(entries.len(), Ordering::Release);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Non-blocking pop from the front
    pub fn pop(&self) -> Option<E> {
        let mut entries = self.entries.lock();
        let entry = entries.pop_front();
        self.len.store(entries.len(), Ordering::Release);
        entry
    }

    /// Remove the first entry matching `predicate`.
    pub fn remove_if<P>(&self, predicate: P) -> Option<E>
    where
        P: Fn(&E) -> bool,
    {
        let mut entries = self.entries.lock();
        let index = entries.iter().position(predicate)?;
        let entry = entries.remove(index);
        self.len.store(entries.len(), Ordering::Release);
        entry
    }

    /// Wait until an entry is available or the queue is cancelled.
    pub fn take(&self) -> Option<E> {
        let mut entries = self.entries.lock();
        loop {
            if let Some(entry) = entries.pop_front() {
                self.len.store(entries.len(), Ordering::Release);
                return Some(entry);
            }
            if self.is_cancelled() {
                return None;
            }
            self.not_empty.wait(&mut entries);
        }
    }

    /// Like [`take`](Self::take) but gives up after `timeout`.
    pub fn take_timeout(&self, timeout: Duration) -> Option<E> {
        let deadline = Instant::now().checked_add(timeout);
        let mut entries = self.entries.lock();
        loop {
            if let Some(entry) = entries.pop_front() {
                self.len.store(entries.len(), Ordering::Release);
                return Some(entry);
            }
            if self.is_cancelled() {
                return None;
            }
            match deadline {
                Some(deadline) => {
                    if self.not_empty.wait_until(&mut entries, deadline).timed_out() {
                        let entry = entries.pop_front();
                        self.len.store(entries.len(), Ordering::Release);
                        return entry;
                    }
                }
                // Deadline beyond what Instant can represent
                None => self.not_empty.wait(&mut entries),
            }
        }
    }

    /// Permanently stop blocking takers from waiting and wake all of them.
    pub fn cancel(&self) {
        // Flag flips under the lock so no taker can miss the broadcast.
        let _entries = self.entries.lock();
        self.cancelled.store(true, Ordering::Release);
        self.not_empty.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Number of queued entries; never blocks.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> Default for IdleQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_lifo_and_fifo_insertion() {
        let queue = IdleQueue::new();
        queue.push_back(1);
        queue.push_back(2);
        queue.push_front(3);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_bounded_push_rejects_at_capacity() {
        let queue = IdleQueue::new();
        assert!(queue.push_back_bounded(1, 2).is_ok());
        assert!(queue.push_front_bounded(2, 2).is_ok());
        assert_eq!(queue.push_back_bounded(3, 2), Err(3));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_remove_if() {
        let queue = IdleQueue::new();
        for i in 0..4 {
            queue.push_back(i);
        }
        assert_eq!(queue.remove_if(|e| *e == 2), Some(2));
        assert_eq!(queue.remove_if(|e| *e == 9), None);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_take_timeout_elapses() {
        let queue: IdleQueue<u8> = IdleQueue::new();
        let start = Instant::now();
        assert_eq!(queue.take_timeout(Duration::from_millis(50)), None);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_take_wakes_on_push() {
        let queue = Arc::new(IdleQueue::new());
        let taker = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.take())
        };

        thread::sleep(Duration::from_millis(20));
        queue.push_back(42);
        assert_eq!(taker.join().unwrap(), Some(42));
    }

    #[test]
    fn test_cancel_wakes_all_takers() {
        let queue: Arc<IdleQueue<u8>> = Arc::new(IdleQueue::new());
        let takers: Vec<_> = (0..4)
            .map(|i| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    if i % 2 == 0 {
                        queue.take()
                    } else {
                        queue.take_timeout(Duration::from_secs(30))
                    }
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        queue.cancel();

        for taker in takers {
            assert_eq!(taker.join().unwrap(), None);
        }
        assert!(queue.is_cancelled());
    }

    #[test]
    fn test_cancelled_queue_still_hands_out_entries() {
        let queue = IdleQueue::new();
        queue.cancel();
        queue.push_back(5);
        assert_eq!(queue.take(), Some(5));
        assert_eq!(queue.take_timeout(Duration::from_secs(30)), None);
    }
}
