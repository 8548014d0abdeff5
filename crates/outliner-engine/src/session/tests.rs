use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use super::*;
use crate::models::Block;
use crate::store::MemoryPageStore;
use crate::tests::create_test_page;

/// Wraps a memory store, logging every call and failing commits on demand.
#[derive(Debug, Default)]
struct RecordingStore {
    inner: MemoryPageStore,
    calls: Mutex<Vec<String>>,
    fail_commits: AtomicBool,
}

impl RecordingStore {
    fn new(pages: impl IntoIterator<Item = PageData>) -> Self {
        Self {
            inner: MemoryPageStore::with_pages(pages),
            ..Self::default()
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    fn check_commit(&self) -> StoreResult<()> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PageStore for RecordingStore {
    async fn fetch_page(&self, page: &PageId) -> StoreResult<PageData> {
        self.record(format!("fetch {page}"));
        self.inner.fetch_page(page).await
    }

    async fn commit_update(
        &self,
        page: &PageId,
        path: &BlockPath,
        content: &str,
    ) -> StoreResult<Delta> {
        self.record(format!("update {page} {path} {content}"));
        self.check_commit()?;
        self.inner.commit_update(page, path, content).await
    }

    async fn commit_insert(
        &self,
        page: &PageId,
        path: &BlockPath,
        content: &str,
    ) -> StoreResult<Delta> {
        self.record(format!("insert {page} {path} {content}"));
        self.check_commit()?;
        self.inner.commit_insert(page, path, content).await
    }

    async fn commit_blocks(&self, page: &PageId, blocks: Vec<Block>) -> StoreResult<()> {
        self.record(format!("blocks {page}"));
        self.check_commit()?;
        self.inner.commit_blocks(page, blocks).await
    }

    async fn list_pages(&self) -> StoreResult<Vec<PageId>> {
        self.inner.list_pages().await
    }
}

fn p(indices: &[usize]) -> BlockPath {
    BlockPath::from(indices)
}

fn page(id: &str) -> PageId {
    PageId::new(id)
}

fn content_at(session: &Session<RecordingStore>, path: &[usize]) -> String {
    session
        .tree()
        .and_then(|tree| tree.resolve(&p(path)))
        .map(|block| block.content().to_string())
        .unwrap()
}

fn stored_content(session: &Session<RecordingStore>, id: &str, path: &[usize]) -> String {
    let data = session.store().inner.snapshot(&page(id)).unwrap().unwrap();
    let tree = BlockTree::new(data.blocks);
    tree.resolve(&p(path)).unwrap().content().to_string()
}

async fn session() -> Session<RecordingStore> {
    let store = RecordingStore::new([
        create_test_page(
            "A",
            vec![
                Block::new("a1", "first").with_children(vec![Block::new("a2", "child")]),
                Block::new("a3", "Buy milk [[B]]"),
            ],
        ),
        create_test_page("B", vec![Block::new("b1", "groceries")]),
        create_test_page("C", vec![Block::new("c1", "see")]),
    ]);
    let mut session = Session::new(store);
    session.navigate_to(&page("A")).await.unwrap();
    session.store().clear_calls();
    session
}

#[tokio::test]
async fn test_navigation_flushes_staged_edit_before_fetch() {
    // Given an edit being typed on page A
    let mut session = session().await;
    session.stage_edit(&p(&[1]), "Buy oat milk [[B]]").unwrap();

    // When navigating to B
    session.navigate_to(&page("B")).await.unwrap();

    // Then the edit is committed before B is requested
    assert_eq!(
        session.store().calls(),
        vec!["update A 1 Buy oat milk [[B]]".to_string(), "fetch B".to_string()]
    );
    assert_eq!(stored_content(&session, "A", &[1]), "Buy oat milk [[B]]");
    assert_eq!(session.current_page(), Some(&page("B")));
    assert_eq!(session.staged(), None);
    assert_eq!(session.phase(), NavPhase::Idle);
}

#[tokio::test]
async fn test_failed_flush_cancels_navigation_and_keeps_edit() {
    let mut session = session().await;
    session.stage_edit(&p(&[0]), "first, edited").unwrap();
    session.store().fail_commits(true);

    let result = session.navigate_to(&page("B")).await;

    assert!(matches!(result, Err(SessionError::StoreUnavailable(_))));
    assert_eq!(session.current_page(), Some(&page("A")));
    assert!(session.history().is_empty());
    assert_eq!(session.staged().map(|s| s.content.as_str()), Some("first, edited"));
    assert!(!session.store().calls().contains(&"fetch B".to_string()));
    assert_eq!(session.phase(), NavPhase::Idle);

    // Once the store is back the same navigation goes through
    session.store().fail_commits(false);
    session.navigate_to(&page("B")).await.unwrap();
    assert_eq!(stored_content(&session, "A", &[0]), "first, edited");
}

#[tokio::test]
async fn test_history_and_go_back() {
    let mut session = session().await;

    session.navigate_to(&page("B")).await.unwrap();
    session.navigate_to(&page("B")).await.unwrap();
    session.navigate_to(&page("C")).await.unwrap();
    assert_eq!(session.history().len(), 2);

    assert!(session.go_back().await.unwrap());
    assert_eq!(session.current_page(), Some(&page("B")));
    assert!(session.go_back().await.unwrap());
    assert_eq!(session.current_page(), Some(&page("A")));

    assert!(!session.go_back().await.unwrap());
    assert_eq!(session.current_page(), Some(&page("A")));
}

#[tokio::test]
async fn test_go_back_on_fresh_session_is_noop() {
    let mut session = Session::new(MemoryPageStore::new());

    assert!(!session.go_back().await.unwrap());
    assert_eq!(session.current_page(), None);
}

#[tokio::test]
async fn test_loaded_page_has_backlinks() {
    let mut session = session().await;

    session.navigate_to(&page("B")).await.unwrap();

    let loaded = session.page().unwrap();
    assert_eq!(loaded.backlinks.len(), 1);
    assert_eq!(loaded.backlinks[0].block_id.as_str(), "a3");
}

#[tokio::test]
async fn test_save_block_commits_and_rederives() {
    let mut session = session().await;

    let patch = session.save_block(&p(&[0, 0]), "DONE child").await.unwrap();

    assert_eq!(patch.deltas[0].block.todo_state(), Some(crate::parsing::TodoState::Done));
    assert_eq!(stored_content(&session, "A", &[0, 0]), "DONE child");
    assert_eq!(session.store().calls(), vec!["update A 0.0 DONE child".to_string()]);
}

#[tokio::test]
async fn test_failed_save_reverts_to_last_confirmed() {
    let mut session = session().await;
    session.store().fail_commits(true);

    let result = session.save_block(&p(&[1]), "lost").await;

    assert!(matches!(result, Err(SessionError::StoreUnavailable(_))));
    assert_eq!(content_at(&session, &[1]), "Buy milk [[B]]");
}

#[tokio::test]
async fn test_second_save_waits_for_first_and_stale_response_is_ignored() {
    let mut session = session().await;

    // Two edits to the same block before the first save returns
    let (_, first) = session.begin_save(&p(&[1]), "one").unwrap();
    let first = first.unwrap();
    let (_, second) = session.begin_save(&p(&[1]), "two").unwrap();
    assert!(second.is_none());
    assert_eq!(content_at(&session, &[1]), "two");

    // The first answer is stale: it must not overwrite "two"
    let result = session.send(&first).await;
    let follow_up = session.complete_save(first, result).await.unwrap().unwrap();
    assert_eq!(content_at(&session, &[1]), "two");
    assert_eq!(follow_up.content, "two");

    let result = session.send(&follow_up).await;
    assert!(session.complete_save(follow_up, result).await.unwrap().is_none());
    assert_eq!(stored_content(&session, "A", &[1]), "two");
    assert_eq!(
        session.store().calls(),
        vec!["update A 1 one".to_string(), "update A 1 two".to_string()]
    );
}

#[tokio::test]
async fn test_response_after_reload_is_stale() {
    let mut session = session().await;
    let (_, pending) = session.begin_save(&p(&[0]), "edited").unwrap();
    let pending = pending.unwrap();

    session.reload().await.unwrap();
    let result = session.send(&pending).await;
    let outcome = session.complete_save(pending, result).await;

    assert!(matches!(outcome, Err(SessionError::StaleResponse(_))));
    // The reload fetched the old content; the late answer did not touch it
    assert_eq!(content_at(&session, &[0]), "first");
}

#[tokio::test]
async fn test_save_follows_block_moved_before_send() {
    let mut session = session().await;
    let (_, pending) = session.begin_save(&p(&[1]), "Buy oat milk [[B]]").unwrap();
    let pending = pending.unwrap();

    // A block lands in front of the edited one before the save goes out
    session.insert_block(&p(&[1]), "inserted").await.unwrap();
    let result = session.send(&pending).await;
    assert!(session.complete_save(pending, result).await.unwrap().is_none());

    assert_eq!(stored_content(&session, "A", &[1]), "inserted");
    assert_eq!(stored_content(&session, "A", &[2]), "Buy oat milk [[B]]");
    assert_eq!(content_at(&session, &[1]), "inserted");
    assert_eq!(content_at(&session, &[2]), "Buy oat milk [[B]]");
}

#[tokio::test]
async fn test_save_for_removed_block_is_not_sent() {
    let mut session = session().await;
    let (_, pending) = session.begin_save(&p(&[1]), "gone soon").unwrap();
    let pending = pending.unwrap();
    session.remove(&p(&[1])).await.unwrap().unwrap();
    session.store().clear_calls();

    let result = session.send(&pending).await;

    assert!(matches!(result, Err(StoreError::MissingBlock { .. })));
    assert!(session.store().calls().is_empty());
}

#[tokio::test]
async fn test_structural_edits_persist_blocks() {
    let mut session = session().await;

    let patch = session.split(&p(&[1]), 3).await.unwrap().unwrap();
    assert_eq!(patch.deltas[1].path, p(&[2]));
    session.indent(&p(&[2])).await.unwrap().unwrap();

    let data = session.store().inner.snapshot(&page("A")).unwrap().unwrap();
    let stored = BlockTree::new(data.blocks);
    assert_eq!(stored.resolve(&p(&[1])).unwrap().content(), "Buy");
    assert_eq!(stored.resolve(&p(&[1, 0])).unwrap().content(), " milk [[B]]");
    assert_eq!(
        session.store().calls(),
        vec!["blocks A".to_string(), "blocks A".to_string()]
    );
}

#[tokio::test]
async fn test_noop_structural_edit_does_not_commit() {
    let mut session = session().await;

    assert!(session.merge(&p(&[0])).await.unwrap().is_none());
    assert!(session.outdent(&p(&[1])).await.unwrap().is_none());
    assert!(session.store().calls().is_empty());
}

#[tokio::test]
async fn test_failed_structural_commit_reloads() {
    let mut session = session().await;
    session.store().fail_commits(true);

    let result = session.merge(&p(&[1])).await;

    assert!(matches!(result, Err(SessionError::StoreUnavailable(_))));
    assert_eq!(session.tree().unwrap().len(), 3);
    assert_eq!(content_at(&session, &[1]), "Buy milk [[B]]");
    assert_eq!(session.store().calls(), vec!["blocks A".to_string(), "fetch A".to_string()]);
}

#[tokio::test]
async fn test_insert_block_uses_store_id() {
    let mut session = session().await;

    let patch = session.insert_block(&p(&[0, 1]), "second child").await.unwrap();

    let id = patch.deltas[0].block.id().clone();
    assert_eq!(session.tree().unwrap().locate(&id), Some(&p(&[0, 1])));
    assert_eq!(stored_content(&session, "A", &[0, 1]), "second child");
}

#[tokio::test]
async fn test_collapse_is_per_page_and_recursive() {
    let mut session = session().await;

    session.set_collapsed_recursive(&p(&[0]), true).unwrap();
    assert!(session.is_collapsed(&BlockId::new("a1")));
    assert!(session.is_collapsed(&BlockId::new("a2")));
    assert!(!session.is_collapsed(&BlockId::new("a3")));

    assert!(!session.toggle_collapsed(&p(&[0, 0])).unwrap());
    assert!(!session.is_collapsed(&BlockId::new("a2")));

    session.navigate_to(&page("B")).await.unwrap();
    assert!(!session.is_collapsed(&BlockId::new("a1")));
    assert!(session.store().calls().iter().all(|call| !call.starts_with("blocks")));
}

#[tokio::test]
async fn test_edits_without_page_fail_cleanly() {
    let mut session = Session::new(MemoryPageStore::new());

    assert!(matches!(
        session.save_block(&p(&[0]), "x").await,
        Err(SessionError::NoPageLoaded)
    ));
    assert!(matches!(session.stage_edit(&p(&[0]), "x"), Err(SessionError::NoPageLoaded)));
    assert!(matches!(session.split(&p(&[0]), 0).await, Err(SessionError::NoPageLoaded)));
}

#[tokio::test]
async fn test_stale_path_is_not_found() {
    let mut session = session().await;

    assert!(matches!(
        session.save_block(&p(&[7]), "x").await,
        Err(SessionError::NotFound(_))
    ));
}
