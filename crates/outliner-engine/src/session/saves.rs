use std::collections::HashMap;

use crate::models::BlockId;

/// Identity of one content save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTicket {
    pub block: BlockId,
    /// Order of the local edit this save carries.
    pub seq: u64,
    /// Page load the request was issued under.
    pub generation: u64,
}

/// Serialises saves per block and decides which responses are stale.
///
/// At most one save per block is in flight. Edits made meanwhile are queued,
/// latest content winning, and handed back when the in-flight save ends.
#[derive(Debug, Default)]
pub struct SaveTracker {
    generation: u64,
    next_seq: u64,
    in_flight: HashMap<BlockId, u64>,
    queued: HashMap<BlockId, String>,
    last_edit: HashMap<BlockId, u64>,
    applied: HashMap<BlockId, u64>,
}

impl SaveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record a local edit. Returns a ticket when the save should be sent
    /// now, or `None` when it was queued behind one already in flight.
    pub fn begin(&mut self, block: &BlockId, content: &str) -> Option<SaveTicket> {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.last_edit.insert(block.clone(), seq);

        if self.in_flight.contains_key(block) {
            self.queued.insert(block.clone(), content.to_string());
            return None;
        }
        self.in_flight.insert(block.clone(), seq);
        Some(SaveTicket {
            block: block.clone(),
            seq,
            generation: self.generation,
        })
    }

    /// End the save for `ticket`, returning content queued in the meantime.
    pub fn finish(&mut self, ticket: &SaveTicket) -> Option<String> {
        if ticket.generation != self.generation {
            return None;
        }
        if self.in_flight.get(&ticket.block) == Some(&ticket.seq) {
            self.in_flight.remove(&ticket.block);
        }
        self.queued.remove(&ticket.block)
    }

    /// A response is stale when the page was reloaded since the request, the
    /// block was edited again, or a newer save was already applied.
    pub fn is_stale(&self, ticket: &SaveTicket) -> bool {
        ticket.generation != self.generation
            || self
                .last_edit
                .get(&ticket.block)
                .is_some_and(|&seq| seq > ticket.seq)
            || self
                .applied
                .get(&ticket.block)
                .is_some_and(|&seq| seq >= ticket.seq)
    }

    pub fn mark_applied(&mut self, ticket: &SaveTicket) {
        self.applied.insert(ticket.block.clone(), ticket.seq);
    }

    pub fn is_saving(&self, block: &BlockId) -> bool {
        self.in_flight.contains_key(block)
    }

    /// Forget everything; responses to earlier requests become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.in_flight.clear();
        self.queued.clear();
        self.last_edit.clear();
        self.applied.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_second_save_is_queued_with_latest_content() {
        let mut saves = SaveTracker::new();
        let block = BlockId::new("b");

        let first = saves.begin(&block, "one").unwrap();
        assert!(saves.begin(&block, "two").is_none());
        assert!(saves.begin(&block, "three").is_none());
        assert!(saves.is_saving(&block));

        assert_eq!(saves.finish(&first), Some("three".to_string()));
        assert!(!saves.is_saving(&block));
    }

    #[test]
    fn test_newer_edit_makes_response_stale() {
        let mut saves = SaveTracker::new();
        let block = BlockId::new("b");

        let first = saves.begin(&block, "one").unwrap();
        assert!(!saves.is_stale(&first));
        saves.begin(&block, "two");

        assert!(saves.is_stale(&first));
    }

    #[test]
    fn test_reset_makes_everything_stale() {
        let mut saves = SaveTracker::new();
        let ticket = saves.begin(&BlockId::new("b"), "one").unwrap();

        saves.reset();

        assert!(saves.is_stale(&ticket));
        assert_eq!(saves.finish(&ticket), None);
        assert!(saves.begin(&BlockId::new("b"), "again").is_some());
    }

    #[test]
    fn test_applied_save_blocks_older_responses() {
        let mut saves = SaveTracker::new();
        let block = BlockId::new("b");
        let first = saves.begin(&block, "one").unwrap();
        saves.finish(&first);
        let second = saves.begin(&block, "two").unwrap();
        saves.finish(&second);

        saves.mark_applied(&second);

        assert!(saves.is_stale(&first));
        assert!(!saves.is_stale(&SaveTicket { seq: 99, ..second }));
    }

    #[test]
    fn test_blocks_are_independent() {
        let mut saves = SaveTracker::new();
        assert!(saves.begin(&BlockId::new("a"), "x").is_some());
        assert!(saves.begin(&BlockId::new("b"), "y").is_some());
    }
}
