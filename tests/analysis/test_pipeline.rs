//! End-to-end pipeline runs against mock collaborators.

use crate::common::{
    CountingStore, MockBackend, MockProvider, Tail, comment, commit, issue, merged, pull_request,
    scorer,
};
use repo_insights::analysis::code_quality::{
    CodeAnalysisConfig, CodeAnalysisError, CodeQualitySnapshot, CodeQualitySource,
    MemoryTreeSource,
};
use repo_insights::analysis::types::{CommentParent, RepositoryRef};
use repo_insights::analysis::{AnalysisConfig, CodeQualityOutcome, Pipeline, PipelineError};
use repo_insights::llm::QualityScorer;
use repo_insights::runtime::AsyncTask;
use repo_insights::store::{MemoryStore, PersistenceGateway, RepoId};
use std::sync::{Arc, Mutex};

const GOOD_REPLY: &str = r#"{"score": 8, "feedback": "Clear", "summary": "Tidy code.", "suggestions": ["Add tests"]}"#;

fn example_provider() -> MockProvider {
    MockProvider::new()
        .with_commits(vec![
            commit("a1", "alice", "feat: add parser", 10, 2),
            commit("b2", "bob", "fix: off by one", 1, 1),
            commit("c3", "alice", "docs: usage", 4, 0),
        ])
        .with_pull_requests(vec![
            merged(pull_request(1, "alice", "Add parser", "Fixes #3"), "bob"),
            pull_request(2, "bob", "Tidy imports", ""),
        ])
        .with_issues(vec![issue(3, "carol", "Parser missing", "We need one")])
        .with_comments(
            CommentParent::PullRequest(1),
            vec![comment(11, CommentParent::PullRequest(1), "bob")],
        )
        .with_comments(
            CommentParent::Issue(3),
            vec![comment(31, CommentParent::Issue(3), "alice")],
        )
}

fn pipeline(provider: MockProvider, backend: MockBackend, store: Arc<dyn PersistenceGateway>) -> Pipeline {
    Pipeline::new(
        Arc::new(provider),
        scorer(backend),
        store,
        AnalysisConfig::default(),
    )
}

fn python_tree() -> Arc<MemoryTreeSource> {
    Arc::new(
        MemoryTreeSource::from_files(
            vec![("widgets/core.py", "def spin(x):\n    \"\"\"Spin.\"\"\"\n    return x\n")],
            CodeAnalysisConfig::default(),
        )
        .with_head("abc123"),
    )
}

struct BrokenClone;

impl CodeQualitySource for BrokenClone {
    fn analyze(
        &self,
        _repo: &RepositoryRef,
    ) -> AsyncTask<Result<CodeQualitySnapshot, CodeAnalysisError>> {
        AsyncTask::ready(Err(CodeAnalysisError::SourceUnavailable(
            "clone timed out after 300s".to_string(),
        )))
    }
}

#[tokio::test]
async fn test_example_run() {
    let store = Arc::new(MemoryStore::new());
    let summary = pipeline(example_provider(), MockBackend::constant(GOOD_REPLY), store.clone())
        .analyze_url("https://github.com/octo/widgets")
        .await
        .unwrap();

    assert_eq!(summary.repo_id.as_str(), "octo/widgets");
    assert_eq!(summary.commits, 3);
    assert_eq!(summary.pull_requests, 2);
    assert_eq!(summary.issues, 1);
    assert_eq!(summary.comments, 2);
    assert_eq!(summary.comments_unavailable, 0);
    assert_eq!(summary.scoring_fallbacks, 0);
    assert_eq!(summary.code_quality, CodeQualityOutcome::Skipped);

    let logins: Vec<&str> = summary
        .contributors
        .iter()
        .map(|c| c.contributor.login.as_str())
        .collect();
    assert_eq!(logins, vec!["alice", "bob", "carol"]);

    let alice = &summary.contributors[0];
    assert_eq!(alice.commit_count, 2);
    assert_eq!(alice.additions, 14);
    assert_eq!(alice.deletions, 2);
    assert_eq!(alice.pr_count, 1);
    assert_eq!(alice.merged_pr_count, 1);
    assert_eq!(alice.issue_comment_count, 1);
    assert_eq!(alice.avg_commit_quality(), Some(8.0));

    let stored = store.load(&RepoId::new("octo", "widgets")).unwrap().unwrap();
    let shas: Vec<&str> = stored.commits.iter().map(|c| c.sha.as_str()).collect();
    assert_eq!(shas, vec!["a1", "b2", "c3"]);
    assert!(stored.pull_requests[0].linked_to_issue);
    assert!(!stored.pull_requests[1].linked_to_issue);
    assert_eq!(stored.issues[0].quality.value, 8.0);
    assert_eq!(stored.comments.len(), 2);
    assert!(stored.code_quality.is_none());

    let rendered = summary.render();
    assert!(rendered.contains("https://github.com/octo/widgets"));
    let alice = rendered.lines().find(|l| l.trim_start().starts_with("alice")).unwrap();
    let columns: Vec<&str> = alice.split_whitespace().collect();
    assert_eq!(columns[1..3], ["2", "8.0"]);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let store = Arc::new(CountingStore::new());
    let run = || pipeline(example_provider(), MockBackend::constant(GOOD_REPLY), store.clone());

    run().analyze("octo", "widgets").await.unwrap();
    let first = store.load(&RepoId::new("octo", "widgets")).unwrap().unwrap();
    let writes = store.writes();

    run().analyze("octo", "widgets").await.unwrap();
    let second = store.load(&RepoId::new("octo", "widgets")).unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(writes, 5);
    assert_eq!(store.writes(), 10);
}

#[tokio::test]
async fn test_rate_limit_writes_nothing() {
    let store = Arc::new(CountingStore::new());
    let provider = example_provider().with_commit_tail(Tail::RateLimited);

    let err = pipeline(provider, MockBackend::constant(GOOD_REPLY), store.clone())
        .analyze("octo", "widgets")
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::RateLimit { .. }));
    assert!(err.to_string().contains("rate limit"));
    assert_eq!(store.writes(), 0);
    assert!(store.get_repository_by_owner_name("octo", "widgets").unwrap().is_none());
}

#[tokio::test]
async fn test_bad_credentials() {
    let store = Arc::new(CountingStore::new());
    let provider = example_provider().with_commit_tail(Tail::Unauthorized);

    let err = pipeline(provider, MockBackend::constant(GOOD_REPLY), store.clone())
        .analyze("octo", "widgets")
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Auth(_)));
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_missing_repository() {
    let store = Arc::new(CountingStore::new());
    let err = pipeline(
        MockProvider::new().missing(),
        MockBackend::constant(GOOD_REPLY),
        store.clone(),
    )
    .analyze("octo", "widgets")
    .await
    .unwrap_err();

    assert!(matches!(err, PipelineError::NotFound(_)));
    assert!(err.to_string().contains("octo/widgets"));
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_invalid_url() {
    let store = Arc::new(MemoryStore::new());
    let err = pipeline(example_provider(), MockBackend::constant(GOOD_REPLY), store)
        .analyze_url("https://gitlab.com/octo/widgets")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Provider(_)));
}

#[tokio::test]
async fn test_malformed_scores_fall_back() {
    let store = Arc::new(MemoryStore::new());
    let summary = pipeline(
        example_provider(),
        MockBackend::malformed_for_pull_requests(8.0),
        store.clone(),
    )
    .analyze("octo", "widgets")
    .await
    .unwrap();

    assert_eq!(summary.scoring_fallbacks, 2);
    let bob = summary
        .contributors
        .iter()
        .find(|c| c.contributor.login == "bob")
        .unwrap();
    assert_eq!(bob.avg_pr_quality(), None);
    assert_eq!(bob.pr_quality.fallbacks, 1);
    assert_eq!(bob.avg_commit_quality(), Some(8.0));

    let stored = store.load(&summary.repo_id).unwrap().unwrap();
    assert!(stored.pull_requests.iter().all(|pr| pr.quality.is_fallback));
    assert!(stored.pull_requests.iter().all(|pr| pr.quality.value == 5.0));
}

#[tokio::test]
async fn test_fallbacks_averaged_when_included() {
    let config = AnalysisConfig {
        exclude_fallback_scores: false,
        ..AnalysisConfig::default()
    };
    let summary = Pipeline::new(
        Arc::new(example_provider()),
        scorer(MockBackend::malformed_for_pull_requests(8.0)),
        Arc::new(MemoryStore::new()),
        config,
    )
    .analyze("octo", "widgets")
    .await
    .unwrap();

    let bob = summary
        .contributors
        .iter()
        .find(|c| c.contributor.login == "bob")
        .unwrap();
    assert_eq!(bob.avg_pr_quality(), Some(5.0));
}

#[tokio::test]
async fn test_unavailable_comments_do_not_fail_run() {
    let store = Arc::new(MemoryStore::new());
    let provider = example_provider().with_broken_thread(CommentParent::Issue(3));

    let summary = pipeline(provider, MockBackend::constant(GOOD_REPLY), store)
        .analyze("octo", "widgets")
        .await
        .unwrap();

    assert_eq!(summary.comments_unavailable, 1);
    assert_eq!(summary.comments, 1);
}

#[tokio::test]
async fn test_code_quality_snapshot_stored() {
    let store = Arc::new(MemoryStore::new());
    let summary = pipeline(example_provider(), MockBackend::constant(GOOD_REPLY), store.clone())
        .with_code_source(python_tree())
        .analyze("octo", "widgets")
        .await
        .unwrap();

    assert!(matches!(
        summary.code_quality,
        CodeQualityOutcome::Analyzed {
            files_analyzed: 1,
            files_failed: 0,
            ..
        }
    ));
    let stored = store.load(&summary.repo_id).unwrap().unwrap();
    let snapshot = stored.code_quality.unwrap();
    assert_eq!(snapshot.head_commit(), Some("abc123"));
    assert!(snapshot.report().unwrap().insights.is_none());
}

#[tokio::test]
async fn test_code_insights_attached() {
    let config = AnalysisConfig {
        code_insights: true,
        ..AnalysisConfig::default()
    };
    let store = Arc::new(MemoryStore::new());
    let summary = Pipeline::new(
        Arc::new(example_provider()),
        scorer(MockBackend::constant(GOOD_REPLY)),
        store.clone(),
        config,
    )
    .with_code_source(python_tree())
    .analyze("octo", "widgets")
    .await
    .unwrap();

    let stored = store.load(&summary.repo_id).unwrap().unwrap();
    let snapshot = stored.code_quality.unwrap();
    let insights = snapshot.report().unwrap().insights.clone().unwrap();
    assert_eq!(insights.summary, "Tidy code.");
    assert_eq!(insights.suggestions, vec!["Add tests".to_string()]);
    assert_eq!(insights.best_practices.value, 8.0);
}

#[tokio::test]
async fn test_tree_with_no_analyzable_python_reports_no_score() {
    let config = AnalysisConfig {
        code_insights: true,
        ..AnalysisConfig::default()
    };
    let backend = Arc::new(MockBackend::constant(GOOD_REPLY));
    let store = Arc::new(MemoryStore::new());
    let summary = Pipeline::new(
        Arc::new(example_provider()),
        QualityScorer::new(backend.clone()),
        store.clone(),
        config,
    )
    .with_code_source(Arc::new(MemoryTreeSource::from_files(
        vec![("widgets/broken.py", "x = (\n")],
        CodeAnalysisConfig::default(),
    )))
    .analyze("octo", "widgets")
    .await
    .unwrap();

    assert_eq!(
        summary.code_quality,
        CodeQualityOutcome::Analyzed {
            score: None,
            files_analyzed: 0,
            files_failed: 1,
            complexity_grade: None,
            maintainability_grade: None,
        }
    );
    assert!(summary.render().contains("Code quality: no analyzable files"));
    // Three commits, two pull requests and one issue; no insight request.
    assert_eq!(backend.calls(), 6);

    let stored = store.load(&summary.repo_id).unwrap().unwrap();
    let report = stored.code_quality.unwrap().report().cloned().unwrap();
    assert!(report.averages.is_none());
    assert!(report.insights.is_none());
}

#[tokio::test]
async fn test_tree_without_python_stores_empty_snapshot() {
    let store = Arc::new(MemoryStore::new());
    let docs_only = Arc::new(MemoryTreeSource::from_files(
        vec![("README.md", "# Widgets\n")],
        CodeAnalysisConfig::default(),
    ));
    let summary = pipeline(example_provider(), MockBackend::constant(GOOD_REPLY), store.clone())
        .with_code_source(docs_only)
        .analyze("octo", "widgets")
        .await
        .unwrap();

    assert_eq!(
        summary.code_quality,
        CodeQualityOutcome::Empty {
            language: "Python".to_string()
        }
    );
    let stored = store.load(&summary.repo_id).unwrap().unwrap();
    assert!(stored.code_quality.unwrap().is_empty());
}

#[tokio::test]
async fn test_unavailable_source_keeps_previous_snapshot() {
    let store = Arc::new(MemoryStore::new());
    pipeline(example_provider(), MockBackend::constant(GOOD_REPLY), store.clone())
        .with_code_source(python_tree())
        .analyze("octo", "widgets")
        .await
        .unwrap();

    let summary = pipeline(example_provider(), MockBackend::constant(GOOD_REPLY), store.clone())
        .with_code_source(Arc::new(BrokenClone))
        .analyze("octo", "widgets")
        .await
        .unwrap();

    assert!(matches!(
        summary.code_quality,
        CodeQualityOutcome::Unavailable { ref reason } if reason.contains("timed out")
    ));
    let stored = store.load(&summary.repo_id).unwrap().unwrap();
    assert_eq!(stored.code_quality.unwrap().head_commit(), Some("abc123"));
}

#[tokio::test]
async fn test_progress_reaches_sink() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);

    pipeline(
        example_provider(),
        MockBackend::constant(GOOD_REPLY),
        Arc::new(MemoryStore::new()),
    )
    .with_progress_sink(Arc::new(move |_: u64, _: u64, message: &str| {
        sink_seen.lock().unwrap().push(message.to_string());
    }))
    .analyze("octo", "widgets")
    .await
    .unwrap();

    let seen = seen.lock().unwrap();
    for label in ["repository:", "commits:", "pull requests:", "issues:", "comments:", "persist:"] {
        assert!(
            seen.iter().any(|m| m.starts_with(label)),
            "no progress for {label}"
        );
    }
}
