use std::sync::Arc;

use linkshare_gate::{Draft, LikeGate};
use linkshare_remote::{RemoteError, RemoteStore};
use linkshare_replica::{
    FeedTab, IngestReport, LocalStore, MalformedRecord, ProjectionEngine, ReplicaIngestor, Upsert,
};
use linkshare_types::{Clock, PostId, Record, SystemClock};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::error::SdkResult;
use crate::share::{base_link, build_link, ViewMode};
use crate::writer::WriteCoordinator;

/// Where a session is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    /// Waiting for the shared post to arrive.
    Loading,
    Ready,
    /// The shared post does not exist.
    NotFound,
    /// The remote store refused to serve reads.
    Offline,
}

/// One client session.
///
/// Owns the local store, the like gate, the draft and the ingest feed, and
/// mutates them only through `&mut self`. The view mode is fixed when the
/// session opens.
pub struct Session {
    config: SessionConfig,
    mode: ViewMode,
    status: SessionStatus,
    store: LocalStore,
    gate: LikeGate,
    draft: Draft,
    writer: WriteCoordinator,
    ingestor: Option<ReplicaIngestor>,
}

impl Session {
    /// Open a session using the system clock.
    pub fn open(remote: Arc<dyn RemoteStore>, config: SessionConfig, mode: ViewMode) -> SdkResult<Self> {
        Self::with_clock(remote, Arc::new(SystemClock), config, mode)
    }

    /// Open a session for a request query such as `?post=abc`.
    pub fn from_query(remote: Arc<dyn RemoteStore>, config: SessionConfig, query: &str) -> SdkResult<Self> {
        Self::open(remote, config, ViewMode::from_query(query))
    }

    pub fn with_clock(
        remote: Arc<dyn RemoteStore>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
        mode: ViewMode,
    ) -> SdkResult<Self> {
        config.validate()?;

        let (store, started) = match &mode {
            ViewMode::LiveFeed => (
                LocalStore::live(config.retention_cap),
                ReplicaIngestor::start_live(remote.as_ref(), &config.namespace),
            ),
            ViewMode::SingleShared(id) => (
                LocalStore::singleton(),
                ReplicaIngestor::fetch_once(remote.as_ref(), &config.namespace, id.as_str()),
            ),
        };

        let (status, ingestor) = match started {
            Ok(ingestor) if mode.is_live() => (SessionStatus::Ready, Some(ingestor)),
            Ok(ingestor) => (SessionStatus::Loading, Some(ingestor)),
            Err(RemoteError::Unavailable) => {
                warn!(namespace = %config.namespace, "remote unavailable; session offline");
                (SessionStatus::Offline, None)
            }
            Err(e) => return Err(e.into()),
        };

        info!(%mode, ?status, namespace = %config.namespace, "session opened");
        let writer = WriteCoordinator::new(remote, config.namespace.clone(), clock);
        Ok(Self {
            config,
            mode,
            status,
            store,
            gate: LikeGate::new(),
            draft: Draft::default(),
            writer,
            ingestor,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn mode(&self) -> &ViewMode {
        &self.mode
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    /// Post the draft. On success the content is cleared and the author kept.
    pub fn submit_draft(&mut self) -> SdkResult<Record> {
        let record = self
            .writer
            .create_post(&mut self.store, &self.draft.content, &self.draft.author)?;
        self.draft.clear_content();
        Ok(record)
    }

    pub fn create_post(&mut self, content: &str, author: &str) -> SdkResult<Record> {
        Ok(self.writer.create_post(&mut self.store, content, author)?)
    }

    pub fn like_post(&mut self, id: &PostId) -> SdkResult<u64> {
        Ok(self.writer.like_post(&mut self.store, &mut self.gate, id)?)
    }

    pub fn has_liked(&self, id: &PostId) -> bool {
        self.gate.contains(id)
    }

    pub fn projections(&self) -> ProjectionEngine<'_> {
        ProjectionEngine::over(&self.store, self.config.projection)
    }

    pub fn view(&self, tab: FeedTab, query: &str) -> Vec<Record> {
        self.projections().view(tab, query)
    }

    pub fn home(&self) -> Vec<Record> {
        self.projections().home()
    }

    pub fn recent(&self) -> Vec<Record> {
        self.projections().recent()
    }

    pub fn trending(&self) -> Vec<Record> {
        self.projections().trending()
    }

    pub fn search(&self, query: &str) -> Vec<Record> {
        self.projections().search(query)
    }

    pub fn share_link(&self, id: &PostId) -> String {
        build_link(&self.config.share, id)
    }

    /// Link back to the full feed.
    pub fn exit_link(&self) -> String {
        base_link(&self.config.share)
    }

    /// Apply every delivery already waiting.
    pub fn pump(&mut self) -> IngestReport {
        let report = match self.ingestor.as_mut() {
            Some(ingestor) => ingestor.poll(&mut self.store),
            None => IngestReport::default(),
        };
        self.settle();
        report
    }

    /// Wait for the next delivery and apply it. `None` once the feed ends.
    pub async fn next_event(&mut self) -> Option<Result<Upsert, MalformedRecord>> {
        let event = match self.ingestor.as_mut() {
            Some(ingestor) => ingestor.next(&mut self.store).await,
            None => None,
        };
        self.settle();
        event
    }

    /// Stop receiving updates. Returns `false` if already stopped.
    pub fn shutdown(&mut self) -> bool {
        let stopped = self.ingestor.as_mut().is_some_and(ReplicaIngestor::shutdown);
        if stopped {
            info!(mode = %self.mode, "session shut down");
        }
        stopped
    }

    /// Resolve a loading single-post view once its fetch has answered.
    fn settle(&mut self) {
        if self.status != SessionStatus::Loading {
            return;
        }
        let finished = self.ingestor.as_ref().map_or(true, ReplicaIngestor::is_finished);
        if finished {
            self.status = if self.store.is_empty() {
                SessionStatus::NotFound
            } else {
                SessionStatus::Ready
            };
            info!(mode = %self.mode, status = ?self.status, "shared post resolved");
        }
    }
}

#[cfg(test)]
mod tests {
    use linkshare_gate::GateError;
    use linkshare_remote::MemoryRemote;
    use linkshare_types::{ManualClock, Millis};

    use super::*;
    use crate::error::SdkError;

    fn session(remote: &Arc<MemoryRemote>, mode: ViewMode) -> Session {
        let clock = Arc::new(ManualClock::new(Millis::new(1000)));
        Session::with_clock(remote.clone(), clock, SessionConfig::default(), mode).unwrap()
    }

    #[test]
    fn create_like_and_read_back() {
        let remote = Arc::new(MemoryRemote::new());
        let mut s = session(&remote, ViewMode::LiveFeed);
        assert_eq!(s.status(), SessionStatus::Ready);

        let record = s.create_post("hi", "alice").unwrap();
        assert_eq!(s.like_post(&record.id).unwrap(), 1);
        assert!(matches!(
            s.like_post(&record.id),
            Err(SdkError::Gate(GateError::AlreadyLiked { .. }))
        ));
        assert!(s.has_liked(&record.id));

        let recent = s.recent();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, record.id);
        assert_eq!(recent[0].content, "hi");
        assert_eq!(recent[0].author, "alice");
        assert_eq!(recent[0].created_at, Millis::new(1000));
        assert_eq!(recent[0].like_count, 1);

        // The echoes of both writes change nothing.
        s.pump();
        assert_eq!(s.recent(), recent);
    }

    #[test]
    fn submit_draft_clears_content_only() {
        let remote = Arc::new(MemoryRemote::new());
        let mut s = session(&remote, ViewMode::LiveFeed);
        s.draft_mut().set_author("alice");
        assert!(matches!(s.submit_draft(), Err(SdkError::Validation(_))));

        s.draft_mut().set_content("hello");
        s.submit_draft().unwrap();
        assert_eq!(s.draft().content, "");
        assert_eq!(s.draft().author, "alice");
        assert_eq!(s.home().len(), 1);
    }

    #[test]
    fn sessions_see_each_other() {
        let remote = Arc::new(MemoryRemote::new());
        let mut a = session(&remote, ViewMode::LiveFeed);
        let mut b = session(&remote, ViewMode::LiveFeed);

        let record = a.create_post("from a", "amy").unwrap();
        b.pump();
        assert_eq!(b.home(), vec![record.clone()]);

        b.like_post(&record.id).unwrap();
        a.pump();
        assert_eq!(a.home()[0].like_count, 1);
        assert!(!a.has_liked(&record.id));
    }

    #[test]
    fn shared_post_resolves_to_ready() {
        let remote = Arc::new(MemoryRemote::new());
        let mut writer = session(&remote, ViewMode::LiveFeed);
        let record = writer.create_post("shared", "sam").unwrap();
        writer.create_post("other", "sam").unwrap();

        let link = writer.share_link(&record.id);
        let mut reader = session(&remote, ViewMode::from_link(&link));
        assert_eq!(reader.status(), SessionStatus::Loading);

        reader.pump();
        assert_eq!(reader.status(), SessionStatus::Ready);
        assert_eq!(reader.home(), vec![record.clone()]);
        assert_eq!(reader.exit_link(), "http://localhost:8080/");

        // Single-post views are never subscribed.
        writer.like_post(&record.id).unwrap();
        reader.pump();
        assert_eq!(reader.home()[0].like_count, 0);
    }

    #[test]
    fn missing_shared_post_is_not_found() {
        let remote = Arc::new(MemoryRemote::new());
        let mut s = Session::from_query(remote, SessionConfig::default(), "?post=nope").unwrap();
        s.pump();
        assert_eq!(s.status(), SessionStatus::NotFound);
        assert!(s.home().is_empty());
        assert!(matches!(
            s.like_post(&PostId::parse("nope").unwrap()),
            Err(SdkError::Gate(GateError::NotFound { .. }))
        ));
    }

    #[test]
    fn liking_the_shared_post_works() {
        let remote = Arc::new(MemoryRemote::new());
        let record = session(&remote, ViewMode::LiveFeed).create_post("x", "y").unwrap();

        let mut reader = session(&remote, ViewMode::SingleShared(record.id.clone()));
        reader.pump();
        assert_eq!(reader.like_post(&record.id).unwrap(), 1);
        assert_eq!(reader.home()[0].like_count, 1);
    }

    #[test]
    fn offline_remote_opens_offline() {
        let remote = Arc::new(MemoryRemote::new());
        remote.set_connected(false);
        let mut s = session(&remote, ViewMode::LiveFeed);
        assert_eq!(s.status(), SessionStatus::Offline);
        assert!(s.pump().is_empty());

        // Writes still land locally.
        let record = s.create_post("hi", "alice").unwrap();
        assert_eq!(s.home(), vec![record]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let remote = Arc::new(MemoryRemote::new());
        let config = SessionConfig {
            retention_cap: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            Session::open(remote, config, ViewMode::LiveFeed),
            Err(SdkError::Config(_))
        ));
    }

    #[test]
    fn shutdown_unsubscribes_once() {
        let remote = Arc::new(MemoryRemote::new());
        let mut s = session(&remote, ViewMode::LiveFeed);
        assert_eq!(remote.subscriber_count(), 1);
        assert!(s.shutdown());
        assert!(!s.shutdown());
        assert_eq!(remote.subscriber_count(), 0);

        session(&remote, ViewMode::LiveFeed).create_post("late", "x").unwrap();
        s.pump();
        assert!(s.home().is_empty());
    }

    #[test]
    fn retention_cap_applies_to_live_view() {
        let remote = Arc::new(MemoryRemote::new());
        let clock = Arc::new(ManualClock::new(Millis::new(1)));
        let config = SessionConfig {
            retention_cap: 3,
            ..SessionConfig::default()
        };
        let mut s = Session::with_clock(remote, clock.clone(), config, ViewMode::LiveFeed).unwrap();
        for i in 0..5 {
            clock.advance(10);
            s.create_post(&format!("post {i}"), "a").unwrap();
        }
        s.pump();
        let contents: Vec<String> = s.home().into_iter().map(|r| r.content).collect();
        assert_eq!(contents, vec!["post 4", "post 3", "post 2"]);
    }

    #[tokio::test]
    async fn next_event_settles_shared_view() {
        let remote = Arc::new(MemoryRemote::new());
        let record = session(&remote, ViewMode::LiveFeed).create_post("x", "y").unwrap();

        let mut reader = session(&remote, ViewMode::SingleShared(record.id.clone()));
        assert_eq!(reader.next_event().await, Some(Ok(Upsert::Inserted)));
        assert_eq!(reader.status(), SessionStatus::Ready);
        assert_eq!(reader.next_event().await, None);
    }
}
