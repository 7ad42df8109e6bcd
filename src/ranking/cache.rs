use crate::errors::{self, Result};
use crate::ranking::contest::ContestSource;
use crate::ranking::view::{RankingView, TaskView};
use anyhow::Context;
use arc_swap::ArcSwap;
use axum::body::Bytes;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Holds the published [`RankingView`].
///
/// Readers take the current snapshot without waiting on refreshes; a refresh builds a complete
/// new snapshot and swaps it in, so a reader sees either the old or the new one, never a mix.
pub struct ContestViewCache {
    source: Arc<dyn ContestSource>,
    current: ArcSwap<RankingView>,
    /// Serialises refreshes, so at most one is in flight.
    refreshing: tokio::sync::Mutex<()>,
    /// Statements by (task name, locator).
    statements: Mutex<HashMap<(String, String), Bytes>>,
}

impl ContestViewCache {
    pub fn new(source: Arc<dyn ContestSource>) -> Self {
        Self {
            source,
            current: ArcSwap::from_pointee(RankingView::empty()),
            refreshing: tokio::sync::Mutex::new(()),
            statements: Mutex::new(HashMap::new()),
        }
    }

    pub fn current(&self) -> Arc<RankingView> {
        self.current.load_full()
    }

    /// Rebuilds the snapshot from the contest source and publishes it. On failure the previous
    /// snapshot stays published.
    pub async fn refresh(&self) -> anyhow::Result<Arc<RankingView>> {
        let _refreshing = self.refreshing.lock().await;

        let state = self
            .source
            .load()
            .await
            .context("Failed to load contest state")?;

        let previous = self.current.load_full();
        let mut now = Utc::now();
        if now <= previous.last_refreshed {
            now = previous.last_refreshed + Duration::microseconds(1);
        }

        let view = Arc::new(RankingView::build(state, previous.generation + 1, now));
        self.current.store(view.clone());

        self.forget_stale_statements(&view);

        debug!(
            generation = view.generation,
            participants = view.rows.len(),
            tasks = view.tasks.len(),
            "Published ranking"
        );
        Ok(view)
    }

    pub fn get_task(&self, name: &str) -> Result<TaskView> {
        self.current
            .load()
            .task(name)
            .cloned()
            .ok_or_else(|| errors::TaskNotFound(name.to_string()))
    }

    /// Returns the statement of `task`, fetching it on first use. Fetch failures are logged and
    /// reported as a missing statement.
    pub async fn get_task_statement(&self, task: &TaskView) -> Option<Bytes> {
        let locator = task.statement.as_ref()?;
        let key = (task.name.clone(), locator.clone());

        let cached = self.lock_statements().get(&key).cloned();
        if cached.is_some() {
            return cached;
        }

        match self.source.statement(locator).await {
            Ok(Some(statement)) => {
                let statement = Bytes::from(statement);
                self.lock_statements().insert(key, statement.clone());
                Some(statement)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(task = %task.name, "Failed to fetch statement: {e:#}");
                None
            }
        }
    }

    fn forget_stale_statements(&self, view: &RankingView) {
        self.lock_statements().retain(|(name, locator), _| {
            view.task(name)
                .map_or(false, |task| task.statement.as_deref() == Some(locator.as_str()))
        });
    }

    fn lock_statements(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), Bytes>> {
        // The map is always left consistent, so a poisoned lock is still usable
        self.statements
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ranking::contest::{ContestState, ParticipantScores, TaskInfo};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    pub(crate) struct FakeContest {
        pub(crate) state: Mutex<anyhow::Result<ContestState>>,
        pub(crate) statement_fetches: AtomicUsize,
        /// When set, the next load reports that it started and waits for the release signal.
        pub(crate) gate: Mutex<Option<(oneshot::Sender<()>, oneshot::Receiver<()>)>>,
    }

    impl FakeContest {
        pub(crate) fn new(state: ContestState) -> Arc<Self> {
            Arc::new(Self {
                state: Mutex::new(Ok(state)),
                statement_fetches: AtomicUsize::new(0),
                gate: Mutex::new(None),
            })
        }

        pub(crate) fn set(&self, state: anyhow::Result<ContestState>) {
            *self.state.lock().unwrap() = state;
        }
    }

    #[async_trait]
    impl ContestSource for FakeContest {
        async fn load(&self) -> anyhow::Result<ContestState> {
            let gate = self.gate.lock().unwrap().take();
            if let Some((started, release)) = gate {
                let _ = started.send(());
                let _ = release.await;
            }
            match &*self.state.lock().unwrap() {
                Ok(state) => Ok(state.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }

        async fn statement(&self, locator: &str) -> anyhow::Result<Option<Vec<u8>>> {
            self.statement_fetches.fetch_add(1, Ordering::SeqCst);
            match locator {
                "broken.pdf" => anyhow::bail!("storage is down"),
                "gone.pdf" => Ok(None),
                _ => Ok(Some(format!("statement at {locator}").into_bytes())),
            }
        }
    }

    pub(crate) fn contest(score: f64) -> ContestState {
        let task = |name: &str, statement: Option<&str>| TaskInfo {
            name: name.to_string(),
            title: String::new(),
            max_score: 100.0,
            statement: statement.map(String::from),
        };
        ContestState {
            name: "round".to_string(),
            tasks: vec![
                task("sum", Some("sum.pdf")),
                task("graph", None),
                task("flaky", Some("broken.pdf")),
                task("lost", Some("gone.pdf")),
            ],
            participants: ["alice", "bob", "carol"]
                .into_iter()
                .map(|username| ParticipantScores {
                    username: username.to_string(),
                    scores: [("sum".to_string(), score), ("graph".to_string(), score)]
                        .into_iter()
                        .collect(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn refresh_publishes_increasing_snapshots() {
        let cache = ContestViewCache::new(FakeContest::new(contest(10.0)));
        assert_eq!(cache.current().generation, 0);

        let first = cache.refresh().await.unwrap();
        let second = cache.refresh().await.unwrap();
        assert_eq!(first.generation, 1);
        assert_eq!(second.generation, 2);
        assert!(second.last_refreshed > first.last_refreshed);
        assert!(Arc::ptr_eq(&cache.current(), &second));
    }

    #[tokio::test]
    async fn refresh_time_advances_even_if_the_clock_does_not() {
        let cache = ContestViewCache::new(FakeContest::new(contest(10.0)));
        let ahead = Utc::now() + Duration::hours(1);
        cache.current.store(Arc::new(RankingView {
            generation: 7,
            last_refreshed: ahead,
            ..RankingView::empty()
        }));

        let view = cache.refresh().await.unwrap();
        assert_eq!(view.generation, 8);
        assert_eq!(view.last_refreshed, ahead + Duration::microseconds(1));
    }

    #[tokio::test]
    async fn readers_never_see_a_partial_refresh() {
        let source = FakeContest::new(contest(10.0));
        let cache = Arc::new(ContestViewCache::new(source.clone()));
        cache.refresh().await.unwrap();

        source.set(Ok(contest(90.0)));
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *source.gate.lock().unwrap() = Some((started_tx, release_rx));

        let refresh = tokio::spawn({
            let cache = cache.clone();
            async move { cache.refresh().await.map(|view| view.generation) }
        });
        started_rx.await.unwrap();

        let during = cache.current();
        assert_eq!(during.generation, 1);
        assert!(during.rows.iter().all(|row| row.total == 20.0));

        release_tx.send(()).unwrap();
        assert_eq!(refresh.await.unwrap().unwrap(), 2);

        let after = cache.current();
        assert!(after.rows.iter().all(|row| row.total == 180.0));
        // The snapshot taken earlier is untouched
        assert!(during.rows.iter().all(|row| row.total == 20.0));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_previous_snapshot() {
        let source = FakeContest::new(contest(10.0));
        let cache = ContestViewCache::new(source.clone());
        let published = cache.refresh().await.unwrap();

        source.set(Err(anyhow::anyhow!("database unavailable")));
        assert!(cache.refresh().await.is_err());
        assert!(Arc::ptr_eq(&cache.current(), &published));

        source.set(Ok(contest(10.0)));
        assert_eq!(cache.refresh().await.unwrap().generation, 2);
    }

    #[tokio::test]
    async fn task_lookup() {
        let cache = ContestViewCache::new(FakeContest::new(contest(10.0)));
        assert_eq!(
            cache.get_task("sum").unwrap_err(),
            errors::TaskNotFound("sum".to_string())
        );
        cache.refresh().await.unwrap();
        assert_eq!(cache.get_task("sum").unwrap().name, "sum");
        assert_eq!(
            cache.get_task("doesnotexist").unwrap_err(),
            errors::TaskNotFound("doesnotexist".to_string())
        );
    }

    #[tokio::test]
    async fn statements_are_cached_and_failures_masked() {
        let source = FakeContest::new(contest(10.0));
        let cache = ContestViewCache::new(source.clone());
        cache.refresh().await.unwrap();

        let sum = cache.get_task("sum").unwrap();
        assert_eq!(
            cache.get_task_statement(&sum).await,
            Some(Bytes::from_static(b"statement at sum.pdf"))
        );
        assert!(cache.get_task_statement(&sum).await.is_some());
        assert_eq!(source.statement_fetches.load(Ordering::SeqCst), 1);

        for name in ["graph", "flaky", "lost"] {
            let task = cache.get_task(name).unwrap();
            assert_eq!(cache.get_task_statement(&task).await, None, "{name}");
        }
    }

    #[tokio::test]
    async fn statements_of_removed_tasks_are_dropped() {
        let source = FakeContest::new(contest(10.0));
        let cache = ContestViewCache::new(source.clone());
        cache.refresh().await.unwrap();
        let sum = cache.get_task("sum").unwrap();
        cache.get_task_statement(&sum).await.unwrap();

        let mut without_sum = contest(10.0);
        without_sum.tasks.retain(|task| task.name != "sum");
        source.set(Ok(without_sum));
        cache.refresh().await.unwrap();
        assert!(cache.lock_statements().is_empty());
    }
}
