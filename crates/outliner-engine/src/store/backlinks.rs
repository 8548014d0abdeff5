use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Backlink, Block, Blocks, PageId};

/// Page references across a set of pages, in both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BacklinkIndex {
    forward: BTreeMap<PageId, BTreeSet<PageId>>,
    backward: BTreeMap<PageId, Vec<Backlink>>,
}

impl BacklinkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build<'a>(pages: impl IntoIterator<Item = (&'a PageId, &'a [Block])>) -> Self {
        let mut index = Self::new();
        for (page, blocks) in pages {
            index.add_page(page, blocks);
        }
        index
    }

    /// Record every `[[link]]` on a page. Links to the page itself are skipped.
    pub fn add_page(&mut self, page: &PageId, blocks: &[Block]) {
        for block in Blocks::new(blocks) {
            for target in block.page_references() {
                let target = PageId::new(target);
                if &target == page {
                    continue;
                }
                self.forward
                    .entry(page.clone())
                    .or_default()
                    .insert(target.clone());
                self.backward.entry(target).or_default().push(Backlink {
                    source_page: page.clone(),
                    block_id: block.id().clone(),
                    content: block.content().to_string(),
                });
            }
        }
    }

    /// Blocks on other pages that link to `page`.
    pub fn backlinks_to(&self, page: &PageId) -> &[Backlink] {
        self.backward.get(page).map(Vec::as_slice).unwrap_or_default()
    }

    /// Pages that `page` links to.
    pub fn links_from(&self, page: &PageId) -> Vec<&PageId> {
        self.forward
            .get(page)
            .map(|targets| targets.iter().collect())
            .unwrap_or_default()
    }
}
