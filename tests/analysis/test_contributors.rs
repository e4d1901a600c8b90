//! Tests for contributor aggregation.

use crate::common::at;
use repo_insights::analysis::ContributorLedger;
use repo_insights::analysis::types::{
    CommentKind, CommentParent, CommentRecord, CommitRecord, ContributorRef, IssueRecord,
    IssueState, PullRequestRecord, PullRequestState, QualityScore,
};

fn commit(login: &str, additions: u64, deletions: u64, quality: QualityScore) -> CommitRecord {
    CommitRecord {
        sha: format!("{login}-{additions}"),
        author: ContributorRef::new(login),
        message: "fix: handle empty input".to_string(),
        additions,
        deletions,
        files_changed: 1,
        committed_at: at(1),
        quality,
    }
}

fn pull_request(login: &str, state: PullRequestState, quality: QualityScore) -> PullRequestRecord {
    PullRequestRecord {
        number: 1,
        author: ContributorRef::new(login),
        title: "Add parser".to_string(),
        body: String::new(),
        state,
        created_at: at(2),
        closed_at: None,
        merged_at: None,
        additions: 0,
        deletions: 0,
        changed_files: 0,
        comments: 0,
        review_comments: 0,
        merged_by: None,
        approvers: Vec::new(),
        linked_to_issue: false,
        quality,
    }
}

fn issue(login: &str, quality: QualityScore) -> IssueRecord {
    IssueRecord {
        number: 3,
        author: ContributorRef::new(login),
        title: "Crash".to_string(),
        body: String::new(),
        state: IssueState::Open,
        created_at: at(3),
        closed_at: None,
        comments: 0,
        assignees: Vec::new(),
        labels: Vec::new(),
        quality,
    }
}

fn comment(login: &str, parent: CommentParent) -> CommentRecord {
    CommentRecord {
        id: 1,
        parent,
        kind: CommentKind::IssueComment,
        author: ContributorRef::new(login),
        body: "+1".to_string(),
        created_at: at(4),
    }
}

fn scored(value: f64) -> QualityScore {
    QualityScore::new(value, "ok")
}

#[test]
fn test_commit_totals_and_average() {
    let mut ledger = ContributorLedger::new(true);
    ledger.record_commit(&commit("alice", 10, 2, scored(8.0)));
    ledger.record_commit(&commit("alice", 5, 5, scored(6.0)));

    let alice = ledger.get("alice").unwrap();
    assert_eq!(alice.commit_count, 2);
    assert_eq!(alice.additions, 15);
    assert_eq!(alice.deletions, 7);
    assert_eq!(alice.lines_changed(), 22);
    assert_eq!(alice.avg_commit_size(), Some(11.0));
    assert_eq!(alice.avg_commit_quality(), Some(7.0));
    assert_eq!(alice.avg_pr_quality(), None);
}

#[test]
fn test_merged_pull_requests_counted() {
    let mut ledger = ContributorLedger::new(true);
    ledger.record_pull_request(&pull_request("bob", PullRequestState::Merged, scored(9.0)));
    ledger.record_pull_request(&pull_request("bob", PullRequestState::Closed, scored(3.0)));
    ledger.record_pull_request(&pull_request("bob", PullRequestState::Open, scored(6.0)));

    let bob = ledger.get("bob").unwrap();
    assert_eq!(bob.pr_count, 3);
    assert_eq!(bob.merged_pr_count, 1);
    assert_eq!(bob.avg_commit_size(), None);
    assert_eq!(bob.avg_pr_quality(), Some(6.0));
}

#[test]
fn test_fallbacks_excluded_from_average() {
    let mut ledger = ContributorLedger::new(true);
    ledger.record_issue(&issue("carol", scored(9.0)));
    ledger.record_issue(&issue("carol", QualityScore::fallback("unparseable")));

    let carol = ledger.get("carol").unwrap();
    assert_eq!(carol.issue_count, 2);
    assert_eq!(carol.avg_issue_quality(), Some(9.0));
    assert_eq!(carol.issue_quality.fallbacks, 1);
}

#[test]
fn test_fallbacks_included_when_configured() {
    let mut ledger = ContributorLedger::new(false);
    ledger.record_issue(&issue("carol", scored(9.0)));
    ledger.record_issue(&issue("carol", QualityScore::fallback("unparseable")));

    assert_eq!(ledger.get("carol").unwrap().avg_issue_quality(), Some(7.0));
}

#[test]
fn test_only_fallbacks_means_no_average() {
    let mut ledger = ContributorLedger::new(true);
    ledger.record_commit(&commit("dave", 1, 0, QualityScore::fallback("timeout")));
    assert_eq!(ledger.get("dave").unwrap().avg_commit_quality(), None);
}

#[test]
fn test_comments_split_by_parent() {
    let mut ledger = ContributorLedger::new(true);
    ledger.record_comment(&comment("erin", CommentParent::PullRequest(1)));
    ledger.record_comment(&comment("erin", CommentParent::PullRequest(2)));
    ledger.record_comment(&comment("erin", CommentParent::Issue(1)));

    let erin = ledger.get("erin").unwrap();
    assert_eq!(erin.pr_comment_count, 2);
    assert_eq!(erin.issue_comment_count, 1);
    assert_eq!(erin.total_contributions(), 3);
}

#[test]
fn test_merge_sums_deltas() {
    let mut commits = ContributorLedger::new(true);
    commits.record_commit(&commit("alice", 10, 0, scored(8.0)));

    let mut prs = ContributorLedger::new(true);
    prs.record_pull_request(&pull_request("alice", PullRequestState::Merged, scored(4.0)));
    prs.record_pull_request(&pull_request("bob", PullRequestState::Open, scored(5.0)));

    let mut issues = ContributorLedger::new(true);
    issues.record_issue(&issue("alice", scored(7.0)));

    commits.merge(prs);
    commits.merge(issues);

    assert_eq!(commits.len(), 2);
    let alice = commits.get("alice").unwrap();
    assert_eq!(alice.commit_count, 1);
    assert_eq!(alice.pr_count, 1);
    assert_eq!(alice.issue_count, 1);
    assert_eq!(alice.avg_commit_quality(), Some(8.0));
    assert_eq!(alice.avg_pr_quality(), Some(4.0));
    assert_eq!(alice.avg_issue_quality(), Some(7.0));
}

#[test]
fn test_aggregates_ordered_by_activity() {
    let mut ledger = ContributorLedger::new(true);
    ledger.record_issue(&issue("zoe", scored(5.0)));
    ledger.record_issue(&issue("amy", scored(5.0)));
    ledger.record_commit(&commit("max", 1, 1, scored(5.0)));
    ledger.record_commit(&commit("max", 2, 2, scored(5.0)));

    let logins: Vec<String> = ledger
        .into_aggregates()
        .into_iter()
        .map(|a| a.contributor.login)
        .collect();
    assert_eq!(logins, vec!["max", "amy", "zoe"]);
}

#[test]
fn test_display_name_filled_from_later_record() {
    let mut ledger = ContributorLedger::new(true);
    ledger.record_commit(&commit("alice", 1, 0, scored(5.0)));
    let mut named = commit("alice", 2, 0, scored(5.0));
    named.author = ContributorRef::from_login(Some("alice"), Some("Alice Liddell"));
    ledger.record_commit(&named);

    let alice = ledger.get("alice").unwrap();
    assert_eq!(alice.contributor.display_name.as_deref(), Some("Alice Liddell"));
    assert_eq!(alice.commit_count, 2);
}
