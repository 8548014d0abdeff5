use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use log::debug;

use super::{BacklinkIndex, PageStore, StoreError, StoreResult, lock_poisoned};
use crate::editing::{BlockPath, BlockTree, Delta};
use crate::models::{Block, PageData, PageId};

/// A page as kept by a store.
#[derive(Debug, Clone)]
pub(crate) struct StoredPage {
    pub title: String,
    pub properties: BTreeMap<String, String>,
    pub tree: BlockTree,
}

impl From<PageData> for StoredPage {
    fn from(data: PageData) -> Self {
        Self {
            title: data.title,
            properties: data.properties,
            tree: BlockTree::new(data.blocks),
        }
    }
}

/// Pages keyed by id, plus the edit operations both adapters share.
#[derive(Debug, Default)]
pub(crate) struct PageSet {
    pages: BTreeMap<PageId, StoredPage>,
}

impl PageSet {
    pub fn insert(&mut self, id: PageId, page: StoredPage) {
        self.pages.insert(id, page);
    }

    pub fn contains(&self, id: &PageId) -> bool {
        self.pages.contains_key(id)
    }

    pub fn get(&self, id: &PageId) -> Option<&StoredPage> {
        self.pages.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &PageId> {
        self.pages.keys()
    }

    pub fn get_or_create(&mut self, id: &PageId) -> &mut StoredPage {
        self.pages.entry(id.clone()).or_insert_with(|| {
            debug!("Creating empty page {id}");
            StoredPage::from(PageData::empty(id.clone()))
        })
    }

    pub fn page_data(&self, id: &PageId) -> Option<PageData> {
        let page = self.pages.get(id)?;
        let backlinks = BacklinkIndex::build(
            self.pages
                .iter()
                .map(|(page_id, stored)| (page_id, stored.tree.blocks())),
        );
        Some(PageData {
            id: id.clone(),
            title: page.title.clone(),
            properties: page.properties.clone(),
            blocks: page.tree.blocks().to_vec(),
            backlinks: backlinks.backlinks_to(id).to_vec(),
        })
    }

    pub fn update(&mut self, id: &PageId, path: &BlockPath, content: &str) -> StoreResult<Delta> {
        self.get_or_create(id)
            .tree
            .update_content(path, content)
            .ok_or_else(|| invalid_path(id, path))
    }

    pub fn insert_block(
        &mut self,
        id: &PageId,
        path: &BlockPath,
        content: &str,
    ) -> StoreResult<Delta> {
        self.get_or_create(id)
            .tree
            .insert_at(path, content)
            .ok_or_else(|| invalid_path(id, path))
    }

    pub fn replace_blocks(&mut self, id: &PageId, blocks: Vec<Block>) {
        self.get_or_create(id).tree = BlockTree::new(blocks);
    }
}

fn invalid_path(page: &PageId, path: &BlockPath) -> StoreError {
    StoreError::InvalidPath {
        page: page.clone(),
        path: path.clone(),
    }
}

/// Page store that lives in memory only. All data is lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    pages: RwLock<PageSet>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(pages: impl IntoIterator<Item = PageData>) -> Self {
        let mut set = PageSet::default();
        for page in pages {
            set.insert(page.id.clone(), StoredPage::from(page));
        }
        Self {
            pages: RwLock::new(set),
        }
    }

    /// Add or replace a page.
    pub fn insert_page(&self, page: PageData) -> StoreResult<()> {
        let mut pages = self.pages.write().map_err(lock_poisoned)?;
        pages.insert(page.id.clone(), StoredPage::from(page));
        Ok(())
    }

    /// Current state of a page without creating it.
    pub fn snapshot(&self, page: &PageId) -> StoreResult<Option<PageData>> {
        let pages = self.pages.read().map_err(lock_poisoned)?;
        Ok(pages.page_data(page))
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    async fn fetch_page(&self, page: &PageId) -> StoreResult<PageData> {
        let mut pages = self.pages.write().map_err(lock_poisoned)?;
        pages.get_or_create(page);
        pages
            .page_data(page)
            .ok_or_else(|| StoreError::Unavailable(format!("page {page} vanished")))
    }

    async fn commit_update(
        &self,
        page: &PageId,
        path: &BlockPath,
        content: &str,
    ) -> StoreResult<Delta> {
        let mut pages = self.pages.write().map_err(lock_poisoned)?;
        pages.update(page, path, content)
    }

    async fn commit_insert(
        &self,
        page: &PageId,
        path: &BlockPath,
        content: &str,
    ) -> StoreResult<Delta> {
        let mut pages = self.pages.write().map_err(lock_poisoned)?;
        pages.insert_block(page, path, content)
    }

    async fn commit_blocks(&self, page: &PageId, blocks: Vec<Block>) -> StoreResult<()> {
        let mut pages = self.pages.write().map_err(lock_poisoned)?;
        pages.replace_blocks(page, blocks);
        Ok(())
    }

    async fn list_pages(&self) -> StoreResult<Vec<PageId>> {
        let pages = self.pages.read().map_err(lock_poisoned)?;
        Ok(pages.ids().cloned().collect())
    }
}
