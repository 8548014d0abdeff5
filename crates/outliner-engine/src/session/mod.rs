//! The controller a presentation layer talks to.
//!
//! A [`Session`] owns the open page, the navigation history, collapse flags,
//! the edit currently being typed and the bookkeeping for saves in flight.
//! Tree edits apply locally first and are then committed to the
//! [`PageStore`]; when the store and the local tree disagree the page is
//! fetched again.

pub mod collapse;
pub mod flags;
pub mod navigation;
pub mod saves;

use std::collections::{BTreeMap, HashMap};

use log::{debug, info, warn};

use crate::editing::{BlockPath, BlockTree, Delta, Patch};
use crate::models::{Backlink, BlockId, PageData, PageId};
use crate::store::{PageStore, StoreError, StoreResult};

pub use collapse::CollapseState;
pub use flags::{FlagStore, FlagStoreError, JsonFlagStore, MemoryFlagStore};
pub use navigation::NavigationStack;
pub use saves::{SaveTicket, SaveTracker};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No block at {0}")]
    NotFound(BlockPath),
    #[error("Page store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("Discarded stale response for block {0}")]
    StaleResponse(BlockId),
    #[error("No page is open")]
    NoPageLoaded,
    #[error("Collapse state: {0}")]
    CollapseState(#[from] FlagStoreError),
}

/// Where a navigation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavPhase {
    #[default]
    Idle,
    /// Committing the staged edit before leaving the page.
    Flushing,
    /// Fetching the destination page.
    Loading,
}

/// The page a session has open.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub id: PageId,
    pub title: String,
    pub properties: BTreeMap<String, String>,
    pub backlinks: Vec<Backlink>,
    pub tree: BlockTree,
    /// Content the store last confirmed, per block.
    confirmed: HashMap<BlockId, String>,
}

impl LoadedPage {
    fn new(data: PageData) -> Self {
        let mut page = Self {
            id: data.id,
            title: data.title,
            properties: data.properties,
            backlinks: data.backlinks,
            tree: BlockTree::new(data.blocks),
            confirmed: HashMap::new(),
        };
        page.confirm_all();
        page
    }

    fn confirm_all(&mut self) {
        self.confirmed = self
            .tree
            .iter()
            .map(|block| (block.id().clone(), block.content().to_string()))
            .collect();
    }
}

/// An edit being typed that has not been committed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedEdit {
    pub block: BlockId,
    pub content: String,
}

/// A content save ready to be sent with [`Session::send`].
///
/// It names the block by id; the path is looked up when the save is sent,
/// so structural edits made in between are respected.
#[derive(Debug, Clone)]
pub struct PendingSave {
    pub ticket: SaveTicket,
    pub page: PageId,
    pub content: String,
}

pub struct Session<S> {
    store: S,
    page: Option<LoadedPage>,
    history: NavigationStack,
    collapse: CollapseState,
    staged: Option<StagedEdit>,
    saves: SaveTracker,
    phase: NavPhase,
}

impl<S: PageStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            page: None,
            history: NavigationStack::new(),
            collapse: CollapseState::in_memory(),
            staged: None,
            saves: SaveTracker::new(),
            phase: NavPhase::Idle,
        }
    }

    pub fn with_collapse_state(mut self, collapse: CollapseState) -> Self {
        self.collapse = collapse;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn phase(&self) -> NavPhase {
        self.phase
    }

    pub fn page(&self) -> Option<&LoadedPage> {
        self.page.as_ref()
    }

    pub fn current_page(&self) -> Option<&PageId> {
        self.page.as_ref().map(|page| &page.id)
    }

    pub fn tree(&self) -> Option<&BlockTree> {
        self.page.as_ref().map(|page| &page.tree)
    }

    pub fn history(&self) -> &NavigationStack {
        &self.history
    }

    pub fn staged(&self) -> Option<&StagedEdit> {
        self.staged.as_ref()
    }

    // Navigation

    /// Open a page, committing any staged edit first.
    ///
    /// If that commit fails the navigation is abandoned and the staged edit
    /// is kept for another try.
    pub async fn navigate_to(&mut self, destination: &PageId) -> Result<(), SessionError> {
        self.flush_for_navigation().await?;
        let previous = self.current_page().cloned();
        self.load(destination).await?;
        if let Some(previous) = previous {
            self.history.visit(&previous, destination);
        }
        info!("Navigated to {destination}");
        Ok(())
    }

    /// Return to the previous page. Returns false when there is none.
    pub async fn go_back(&mut self) -> Result<bool, SessionError> {
        let Some(previous) = self.history.peek().cloned() else {
            debug!("No history to go back to");
            return Ok(false);
        };
        self.flush_for_navigation().await?;
        self.load(&previous).await?;
        self.history.pop();
        info!("Went back to {previous}");
        Ok(true)
    }

    /// Fetch the open page again, dropping unconfirmed local state.
    pub async fn reload(&mut self) -> Result<(), SessionError> {
        let id = self.current_page().cloned().ok_or(SessionError::NoPageLoaded)?;
        self.load(&id).await
    }

    async fn flush_for_navigation(&mut self) -> Result<(), SessionError> {
        self.phase = NavPhase::Flushing;
        let flushed = self.flush().await;
        self.phase = NavPhase::Idle;
        if let Err(err) = &flushed {
            warn!("Navigation cancelled, staged edit could not be saved: {err}");
        }
        flushed.map(|_| ())
    }

    async fn load(&mut self, id: &PageId) -> Result<(), SessionError> {
        self.phase = NavPhase::Loading;
        let fetched = self.store.fetch_page(id).await;
        self.phase = NavPhase::Idle;
        let data = fetched?;
        debug!("Loaded page {id} with {} top-level blocks", data.blocks.len());
        self.saves.reset();
        self.page = Some(LoadedPage::new(data));
        Ok(())
    }

    // Content edits

    /// Remember the text being typed into a block without committing it.
    pub fn stage_edit(&mut self, path: &BlockPath, content: &str) -> Result<(), SessionError> {
        let page = self.page.as_ref().ok_or(SessionError::NoPageLoaded)?;
        let block = page
            .tree
            .resolve(path)
            .ok_or_else(|| SessionError::NotFound(path.clone()))?;
        self.staged = Some(StagedEdit {
            block: block.id().clone(),
            content: content.to_string(),
        });
        Ok(())
    }

    /// Commit the staged edit, if any. On failure it stays staged.
    pub async fn flush(&mut self) -> Result<Option<Patch>, SessionError> {
        let Some(staged) = self.staged.take() else {
            return Ok(None);
        };
        let path = self
            .page
            .as_ref()
            .and_then(|page| page.tree.locate(&staged.block))
            .cloned();
        let Some(path) = path else {
            warn!("Dropping staged edit for block {} that no longer exists", staged.block);
            return Ok(None);
        };
        match self.save_block(&path, &staged.content).await {
            Ok(patch) => Ok(Some(patch)),
            Err(err) => {
                self.staged = Some(staged);
                Err(err)
            }
        }
    }

    /// Change a block's content and commit it.
    pub async fn save_block(
        &mut self,
        path: &BlockPath,
        content: &str,
    ) -> Result<Patch, SessionError> {
        let (patch, mut pending) = self.begin_save(path, content)?;
        while let Some(save) = pending {
            let result = self.send(&save).await;
            pending = match self.complete_save(save, result).await {
                Ok(next) => next,
                Err(SessionError::StaleResponse(block)) => {
                    debug!("Save for block {block} superseded");
                    None
                }
                Err(err) => return Err(err),
            };
        }
        Ok(patch)
    }

    /// Apply an edit locally and decide whether a save goes out now.
    ///
    /// Returns the local patch and, unless a save for the same block is
    /// already in flight, the save to send.
    pub fn begin_save(
        &mut self,
        path: &BlockPath,
        content: &str,
    ) -> Result<(Patch, Option<PendingSave>), SessionError> {
        let page = self.page.as_mut().ok_or(SessionError::NoPageLoaded)?;
        let delta = page
            .tree
            .update_content(path, content)
            .ok_or_else(|| SessionError::NotFound(path.clone()))?;
        let patch = Patch::single(delta, None, page.tree.version());
        let block = patch.deltas[0].block.id().clone();

        let pending = self.saves.begin(&block, content).map(|ticket| PendingSave {
            ticket,
            page: page.id.clone(),
            content: content.to_string(),
        });
        if pending.is_none() {
            debug!("Save for block {block} queued behind one in flight");
        }
        Ok((patch, pending))
    }

    /// Handle the store's answer to a save.
    ///
    /// Stale answers are dropped without touching the tree. A failed save
    /// reverts the block to what the store last confirmed, and an answer
    /// that does not fit the local tree reloads the page. Returns the
    /// follow-up save when edits were queued meanwhile.
    pub async fn complete_save(
        &mut self,
        save: PendingSave,
        result: StoreResult<Delta>,
    ) -> Result<Option<PendingSave>, SessionError> {
        let stale = self.saves.is_stale(&save.ticket);
        let queued = self.saves.finish(&save.ticket);
        let block = save.ticket.block.clone();

        if !stale {
            match result {
                Ok(delta) => {
                    self.saves.mark_applied(&save.ticket);
                    if !self.reconcile(&delta) {
                        warn!("Store delta for block {block} does not fit, reloading");
                        self.reload().await?;
                        return Ok(None);
                    }
                }
                Err(err) => {
                    warn!("Saving block {block} failed, reverting: {err}");
                    self.revert(&block);
                    return Err(err.into());
                }
            }
        } else if let Err(err) = &result {
            warn!("Stale save for block {block} failed: {err}");
        } else {
            warn!("Discarding stale save response for block {block}");
        }

        let Some(content) = queued else {
            return if stale {
                Err(SessionError::StaleResponse(block))
            } else {
                Ok(None)
            };
        };
        let page = self.page.as_ref().ok_or(SessionError::NoPageLoaded)?;
        if page.tree.locate(&block).is_none() {
            return Err(SessionError::StaleResponse(block));
        }
        let next = self.saves.begin(&block, &content).map(|ticket| PendingSave {
            ticket,
            page: page.id.clone(),
            content,
        });
        Ok(next)
    }

    /// Commit a save at the block's current path.
    pub async fn send(&self, save: &PendingSave) -> StoreResult<Delta> {
        let block = &save.ticket.block;
        let path = self
            .page
            .as_ref()
            .filter(|page| page.id == save.page)
            .and_then(|page| page.tree.locate(block))
            .cloned()
            .ok_or_else(|| StoreError::MissingBlock {
                page: save.page.clone(),
                block: block.clone(),
            })?;
        self.store
            .commit_update(&save.page, &path, &save.content)
            .await
    }

    /// Bring the local block in line with what the store saved.
    fn reconcile(&mut self, delta: &Delta) -> bool {
        let Some(page) = self.page.as_mut() else {
            return false;
        };
        let id = delta.block.id();
        let Some(path) = page.tree.locate(id).cloned() else {
            return false;
        };
        page.confirmed
            .insert(id.clone(), delta.block.content().to_string());
        match page.tree.resolve(&path) {
            Some(local) if local.content() == delta.block.content() => true,
            Some(_) => page
                .tree
                .update_content(&path, delta.block.content())
                .is_some(),
            None => false,
        }
    }

    fn revert(&mut self, block: &BlockId) {
        let Some(page) = self.page.as_mut() else {
            return;
        };
        let (Some(path), Some(content)) = (page.tree.locate(block).cloned(), page.confirmed.get(block))
        else {
            return;
        };
        let content = content.clone();
        page.tree.update_content(&path, &content);
    }

    // Structural edits

    pub async fn split(
        &mut self,
        path: &BlockPath,
        offset: usize,
    ) -> Result<Option<Patch>, SessionError> {
        self.restructure(|tree| tree.split(path, offset)).await
    }

    pub async fn merge(&mut self, path: &BlockPath) -> Result<Option<Patch>, SessionError> {
        self.restructure(|tree| tree.merge(path)).await
    }

    pub async fn indent(&mut self, path: &BlockPath) -> Result<Option<Patch>, SessionError> {
        self.restructure(|tree| tree.indent(path)).await
    }

    pub async fn outdent(&mut self, path: &BlockPath) -> Result<Option<Patch>, SessionError> {
        self.restructure(|tree| tree.outdent(path)).await
    }

    pub async fn remove(&mut self, path: &BlockPath) -> Result<Option<Patch>, SessionError> {
        self.restructure(|tree| tree.remove(path)).await
    }

    /// Insert a block through the store, which assigns its id.
    pub async fn insert_block(
        &mut self,
        path: &BlockPath,
        content: &str,
    ) -> Result<Patch, SessionError> {
        let page_id = self.current_page().cloned().ok_or(SessionError::NoPageLoaded)?;
        let delta = self.store.commit_insert(&page_id, path, content).await?;
        let page = self.page.as_mut().ok_or(SessionError::NoPageLoaded)?;
        if page.id != page_id || !page.tree.apply_delta(&delta) {
            warn!("Inserted block does not fit the local tree, reloading");
            self.reload().await?;
            return Err(SessionError::StaleResponse(delta.block.id().clone()));
        }
        page.confirmed
            .insert(delta.block.id().clone(), delta.block.content().to_string());
        let version = page.tree.version();
        Ok(Patch::single(delta, None, version))
    }

    /// Run a structural edit locally, then persist the page's blocks.
    ///
    /// `Ok(None)` means the edit did not apply. A failed commit reloads the
    /// page from the store before reporting the error.
    async fn restructure(
        &mut self,
        edit: impl FnOnce(&mut BlockTree) -> Option<Patch>,
    ) -> Result<Option<Patch>, SessionError> {
        let page = self.page.as_mut().ok_or(SessionError::NoPageLoaded)?;
        let Some(patch) = edit(&mut page.tree) else {
            return Ok(None);
        };
        let page_id = page.id.clone();
        let blocks = page.tree.blocks().to_vec();

        match self.store.commit_blocks(&page_id, blocks).await {
            Ok(()) => {
                if let Some(page) = self.page.as_mut() {
                    page.confirm_all();
                }
                Ok(Some(patch))
            }
            Err(err) => {
                warn!("Committing structure of {page_id} failed, reloading: {err}");
                self.reload().await?;
                Err(err.into())
            }
        }
    }

    // Collapse state

    pub fn is_collapsed(&self, block: &BlockId) -> bool {
        self.current_page()
            .is_some_and(|page| self.collapse.is_collapsed(page, block))
    }

    pub fn toggle_collapsed(&mut self, path: &BlockPath) -> Result<bool, SessionError> {
        let page = self.page.as_ref().ok_or(SessionError::NoPageLoaded)?;
        let block = page
            .tree
            .resolve(path)
            .ok_or_else(|| SessionError::NotFound(path.clone()))?;
        Ok(self.collapse.toggle(&page.id, block.id())?)
    }

    pub fn set_collapsed_recursive(
        &mut self,
        path: &BlockPath,
        collapse: bool,
    ) -> Result<(), SessionError> {
        let page = self.page.as_ref().ok_or(SessionError::NoPageLoaded)?;
        let block = page
            .tree
            .resolve(path)
            .ok_or_else(|| SessionError::NotFound(path.clone()))?;
        self.collapse.toggle_recursive(&page.id, block, collapse)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
