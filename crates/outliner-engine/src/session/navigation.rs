use crate::models::PageId;

/// Pages visited before the current one, most recent last.
///
/// Going back pops; nothing is kept for going forward again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationStack {
    history: Vec<PageId>,
}

impl NavigationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, page: PageId) {
        self.history.push(page);
    }

    pub fn pop(&mut self) -> Option<PageId> {
        self.history.pop()
    }

    pub fn peek(&self) -> Option<&PageId> {
        self.history.last()
    }

    /// Record leaving `current` for `destination`. Staying on the same page
    /// leaves no entry. Returns whether anything was pushed.
    pub fn visit(&mut self, current: &PageId, destination: &PageId) -> bool {
        if current == destination {
            return false;
        }
        self.push(current.clone());
        true
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageId> {
        self.history.iter()
    }
}
