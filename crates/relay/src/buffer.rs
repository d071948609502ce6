use std::collections::VecDeque;

use parking_lot::Mutex;

/// FIFO queue decoupling client-paced audio arrival from backend-paced
/// consumption.
///
/// The message handler pushes, the audio-supply loop pulls; both sides are
/// cooperative tasks within one session, so a plain mutex around a deque is
/// enough. `pull` never blocks — the supply loop idles between empty polls
/// instead. There is no capacity bound beyond the per-chunk size cap
/// enforced upstream; a stalled backend lets the queue grow.
pub struct AudioBuffer {
    chunks: Mutex<VecDeque<Vec<u8>>>,
}

impl AudioBuffer {
    pub fn new() -> Self {
        Self {
            chunks: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends a chunk. Chunks must already be validated (size-capped).
    pub fn push(&self, chunk: Vec<u8>) {
        self.chunks.lock().push_back(chunk);
    }

    /// Removes and returns the oldest chunk, or `None` when empty.
    pub fn pull(&self) -> Option<Vec<u8>> {
        self.chunks.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.chunks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.lock().is_empty()
    }
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_returns_chunks_in_push_order() {
        let buffer = AudioBuffer::new();
        for i in 0..50u8 {
            buffer.push(vec![i; 4]);
        }
        for i in 0..50u8 {
            assert_eq!(buffer.pull(), Some(vec![i; 4]));
        }
        assert_eq!(buffer.pull(), None);
    }

    #[test]
    fn pull_on_empty_is_none() {
        let buffer = AudioBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.pull(), None);
    }

    #[test]
    fn interleaved_push_pull_preserves_order() {
        let buffer = AudioBuffer::new();
        buffer.push(vec![1]);
        buffer.push(vec![2]);
        assert_eq!(buffer.pull(), Some(vec![1]));
        buffer.push(vec![3]);
        assert_eq!(buffer.pull(), Some(vec![2]));
        assert_eq!(buffer.pull(), Some(vec![3]));
        assert_eq!(buffer.len(), 0);
    }
}
