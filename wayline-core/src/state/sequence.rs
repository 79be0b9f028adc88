//! Outbound sequence counter

/// Auto-incrementing SEQ for node-originated frames, wrapping at 256
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxSequence {
    next: u8,
}

impl TxSequence {
    /// Start counting at 0
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocate a sequence number (post-increment)
    pub fn next(&mut self) -> u8 {
        let seq = self.next;
        self.next = self.next.wrapping_add(1);
        seq
    }

    /// The number [`Self::next`] will hand out
    pub fn peek(&self) -> u8 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_increment() {
        let mut seq = TxSequence::new();
        assert_eq!(seq.next(), 0);
        assert_eq!(seq.next(), 1);
        assert_eq!(seq.peek(), 2);
    }

    #[test]
    fn test_wraps_after_256() {
        let mut seq = TxSequence::new();
        let initial = seq.peek();
        for _ in 0..256 {
            seq.next();
        }
        assert_eq!(seq.peek(), initial);
    }
}
