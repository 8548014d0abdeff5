use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use log::{debug, info};

use super::memory::{PageSet, StoredPage};
use super::{PageStore, StoreError, StoreResult, lock_poisoned};
use crate::editing::{BlockPath, Delta};
use crate::io::{self, parse_page_file, render_page_file, scan_page_ids};
use crate::models::{Block, BlockId, PageData, PageId};

/// Page store over a notes directory with one markdown file per page.
///
/// Pages are read on first use and kept in memory so block ids stay stable
/// for the life of the store. Every commit rewrites the page's file. A page
/// created by fetching a missing id is written on its first commit.
#[derive(Debug)]
pub struct FilePageStore {
    root: PathBuf,
    pages: RwLock<PageSet>,
}

impl FilePageStore {
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        io::validate_notes_dir(&root)?;
        info!("Opened notes directory {}", root.display());
        Ok(Self {
            root,
            pages: RwLock::new(PageSet::default()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load(&self, pages: &mut PageSet, id: &PageId) -> StoreResult<()> {
        if pages.contains(id) {
            return Ok(());
        }
        let Some(text) = io::read_page(&self.root, id)? else {
            return Ok(());
        };
        let file = parse_page_file(id, &text);
        debug!("Loaded page {id} with {} top-level blocks", file.blocks.len());
        let blocks = if file.blocks.is_empty() {
            vec![Block::new(BlockId::derived(id.as_str(), &[0]), "")]
        } else {
            file.blocks
        };
        pages.insert(
            id.clone(),
            StoredPage::from(PageData {
                id: id.clone(),
                title: file.title.unwrap_or_else(|| id.to_string()),
                properties: file.properties,
                blocks,
                backlinks: Vec::new(),
            }),
        );
        Ok(())
    }

    /// Load every page on disk so backlinks see the whole directory.
    fn load_all(&self, pages: &mut PageSet) -> StoreResult<()> {
        for id in scan_page_ids(&self.root)? {
            self.load(pages, &id)?;
        }
        Ok(())
    }

    fn persist(&self, pages: &PageSet, id: &PageId) -> StoreResult<()> {
        let Some(page) = pages.get(id) else {
            return Ok(());
        };
        let title = (page.title != id.as_str()).then_some(page.title.as_str());
        let text = render_page_file(title, &page.properties, page.tree.blocks());
        io::write_page(&self.root, id, &text)?;
        debug!("Wrote page {id}");
        Ok(())
    }
}

#[async_trait]
impl PageStore for FilePageStore {
    async fn fetch_page(&self, page: &PageId) -> StoreResult<PageData> {
        let mut pages = self.pages.write().map_err(lock_poisoned)?;
        self.load_all(&mut pages)?;
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
        self.load(&mut pages, page)?;
        let delta = pages.update(page, path, content)?;
        self.persist(&pages, page)?;
        Ok(delta)
    }

    async fn commit_insert(
        &self,
        page: &PageId,
        path: &BlockPath,
        content: &str,
    ) -> StoreResult<Delta> {
        let mut pages = self.pages.write().map_err(lock_poisoned)?;
        self.load(&mut pages, page)?;
        let delta = pages.insert_block(page, path, content)?;
        self.persist(&pages, page)?;
        Ok(delta)
    }

    async fn commit_blocks(&self, page: &PageId, blocks: Vec<Block>) -> StoreResult<()> {
        let mut pages = self.pages.write().map_err(lock_poisoned)?;
        self.load(&mut pages, page)?;
        pages.replace_blocks(page, blocks);
        self.persist(&pages, page)
    }

    async fn list_pages(&self) -> StoreResult<Vec<PageId>> {
        let pages = self.pages.read().map_err(lock_poisoned)?;
        let mut ids = scan_page_ids(&self.root)?;
        ids.extend(pages.ids().cloned());
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}
