//! Property tests for the bounded entry queue.

use proptest::prelude::*;
use scribe_rs::{EntryQueue, LogEntry, rate_limited_warner::RateLimitedWarner};

fn drain(queue: &EntryQueue) -> Vec<String> {
    std::iter::from_fn(|| queue.try_dequeue())
        .map(|entry| entry.message().to_owned())
        .collect()
}

proptest! {
    #[test]
    fn overflow_keeps_oldest_entries_in_order(
        capacity in 1usize..32,
        messages in prop::collection::vec("[a-z0-9]{0,8}", 0..64),
    ) {
        let queue = EntryQueue::new(capacity, RateLimitedWarner::default());
        for message in &messages {
            queue.enqueue(LogEntry::new("prop", message));
        }
        prop_assert!(queue.len() <= capacity);
        let kept = messages.len().min(capacity);
        prop_assert_eq!(drain(&queue), messages[..kept].to_vec());
    }

    #[test]
    fn interleaved_drains_preserve_fifo(
        capacity in 1usize..8,
        ops in prop::collection::vec(any::<bool>(), 0..128),
    ) {
        // `true` enqueues the next sequence number, `false` dequeues one entry.
        let queue = EntryQueue::new(capacity, RateLimitedWarner::default());
        let mut model = std::collections::VecDeque::new();
        let mut next = 0u32;
        for enqueue in ops {
            if enqueue {
                let accepted = queue.enqueue(LogEntry::new("prop", &next.to_string()));
                prop_assert_eq!(accepted, model.len() < capacity);
                if accepted {
                    model.push_back(next.to_string());
                }
                next += 1;
            } else {
                let got = queue.try_dequeue().map(|entry| entry.message().to_owned());
                prop_assert_eq!(got, model.pop_front());
            }
            prop_assert!(queue.len() <= capacity);
        }
    }
}
