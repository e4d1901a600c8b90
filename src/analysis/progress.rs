//! Progress reporting.
//!
//! Producers (the provider streams and the pipeline stages) never touch the
//! board directly: each gets a [`ProgressFn`] that sends a [`ProgressEvent`]
//! over a channel, and a single owner task folds events into the
//! [`ProgressBoard`] and forwards the merged view to the external sink.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Callback handed to producers: `(current, total, message)`.
pub type ProgressFn = Arc<dyn Fn(u64, u64, &str) + Send + Sync>;

/// A progress callback that discards everything.
#[must_use]
pub fn silent() -> ProgressFn {
    Arc::new(|_: u64, _: u64, _: &str| {})
}

/// External receiver of progress, e.g. a terminal or a UI.
pub trait ProgressSink: Send + Sync {
    fn report(&self, current: u64, total: u64, message: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(u64, u64, &str) + Send + Sync,
{
    fn report(&self, current: u64, total: u64, message: &str) {
        self(current, total, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    Repository,
    Commits,
    PullRequests,
    Issues,
    Comments,
    CodeQuality,
    Persist,
}

impl SourceKind {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Repository => "repository",
            SourceKind::Commits => "commits",
            SourceKind::PullRequests => "pull requests",
            SourceKind::Issues => "issues",
            SourceKind::Comments => "comments",
            SourceKind::CodeQuality => "code quality",
            SourceKind::Persist => "persist",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub source: SourceKind,
    pub current: u64,
    pub total: u64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceProgress {
    pub current: u64,
    pub total: u64,
    pub message: String,
}

/// Merged view over every source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressBoard {
    sources: BTreeMap<SourceKind, SourceProgress>,
}

impl ProgressBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event in. `current` never moves backwards and `total` never
    /// drops below `current`, whatever order events arrive in.
    pub fn apply(&mut self, event: &ProgressEvent) {
        let entry = self.sources.entry(event.source).or_default();
        entry.current = entry.current.max(event.current);
        entry.total = event.total.max(entry.current);
        entry.message = event.message.clone();
    }

    #[must_use]
    pub fn get(&self, source: SourceKind) -> Option<&SourceProgress> {
        self.sources.get(&source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SourceKind, &SourceProgress)> {
        self.sources.iter()
    }

    /// Summed `(current, total)` across sources.
    #[must_use]
    pub fn overall(&self) -> (u64, u64) {
        self.sources
            .values()
            .fold((0, 0), |(c, t), s| (c + s.current, t + s.total))
    }
}

/// Sending side handed to producers. Cloning is cheap.
#[derive(Clone)]
pub struct ProgressHandle {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ProgressHandle {
    pub fn send(&self, source: SourceKind, current: u64, total: u64, message: impl Into<String>) {
        // The owner only stops after every handle is gone.
        let _ = self.tx.send(ProgressEvent {
            source,
            current,
            total,
            message: message.into(),
        });
    }

    /// A [`ProgressFn`] bound to one source.
    #[must_use]
    pub fn for_source(&self, source: SourceKind) -> ProgressFn {
        let handle = self.clone();
        Arc::new(move |current: u64, total: u64, message: &str| {
            handle.send(source, current, total, message)
        })
    }
}

/// Spawn the board owner. It forwards each merged update for the event's
/// source to `sink` and returns the final board once every handle is dropped.
pub fn spawn_board(sink: Arc<dyn ProgressSink>) -> (ProgressHandle, JoinHandle<ProgressBoard>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let owner = tokio::spawn(async move {
        let mut board = ProgressBoard::new();
        while let Some(event) = rx.recv().await {
            board.apply(&event);
            if let Some(merged) = board.get(event.source) {
                let message = format!("{}: {}", event.source.label(), merged.message);
                sink.report(merged.current, merged.total, &message);
            }
        }
        board
    });
    (ProgressHandle { tx }, owner)
}
