//! Tests for source tree traversal and snapshot building.

use crate::common::repo;
use repo_insights::analysis::code_quality::languages::{extension, is_ignored_dir, is_test_file};
use repo_insights::analysis::code_quality::types::Grade;
use repo_insights::analysis::code_quality::{
    CodeAnalysisConfig, CodeQualitySnapshot, CodeQualitySource, MemoryObjectStore,
    MemoryTreeSource, analyze_tree,
};

const APP: &str = "\
\"\"\"Application entry point.\"\"\"


def main(argv):
    \"\"\"Run the app.\"\"\"
    if argv:
        return 1
    return 0
";

const TEST_APP: &str = "\
def test_main():
    \"\"\"main returns zero without arguments.\"\"\"
    assert main([]) == 0
";

fn analyze(files: Vec<(&str, &str)>) -> CodeQualitySnapshot {
    let (store, root) = MemoryObjectStore::from_files(files);
    analyze_tree(&store, &root, Some("abc123".to_string()), &CodeAnalysisConfig::default()).unwrap()
}

#[test]
fn test_path_classification() {
    assert_eq!(extension("Main.PY"), ".py");
    assert_eq!(extension("Makefile"), "");
    assert!(is_ignored_dir("node_modules"));
    assert!(is_ignored_dir("widgets.egg-info"));
    assert!(!is_ignored_dir("src"));
    assert!(is_test_file("tests/helpers.py"));
    assert!(is_test_file("src/test_app.py"));
    assert!(is_test_file("web/app.spec.js"));
    assert!(!is_test_file("src/app.py"));
}

#[test]
fn test_tree_without_python_is_empty() {
    let snapshot = analyze(vec![
        ("README.md", "# Widgets\n"),
        ("web/index.js", "console.log('hi');\n"),
    ]);

    let CodeQualitySnapshot::Empty(empty) = &snapshot else {
        panic!("expected an empty snapshot, got {snapshot:?}");
    };
    assert_eq!(empty.language, "Python");
    assert_eq!(empty.head_commit.as_deref(), Some("abc123"));
    assert_eq!(empty.content.total_files, 2);
    assert_eq!(empty.content.languages["JavaScript"].files, 1);
}

#[test]
fn test_analyzed_tree() {
    let snapshot = analyze(vec![
        ("README.md", "# Widgets\n\nUsage notes.\n"),
        ("src/app.py", APP),
        ("tests/test_app.py", TEST_APP),
        ("src/broken.py", "x = (\n"),
        ("node_modules/lib/index.js", "module.exports = 1;\n"),
        ("logo.png", "\u{1}PNG"),
        ("LICENSE", "MIT\n"),
    ]);

    let report = snapshot.report().unwrap();
    assert_eq!(report.language, "Python");
    assert_eq!(report.files.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, "src/broken.py");

    let content = &report.content;
    assert_eq!(content.total_files, 5);
    assert_eq!(content.test_files, 1);
    assert_eq!(content.file_types[".py"], 3);
    assert_eq!(content.file_types[".md"], 1);
    assert_eq!(content.file_types["no_extension"], 1);
    assert_eq!(content.languages["Python"].files, 3);
    assert!(!content.languages.contains_key("JavaScript"));
    assert_eq!(content.largest_files[0].path, "src/app.py");

    assert_eq!(report.total_functions, 2);
    assert_eq!(report.high_complexity_functions, 0);
    let averages = report.averages.unwrap();
    assert!((averages.avg_complexity - 2.0).abs() < 1e-9);
    assert_eq!(averages.complexity_grade, Grade::A);
    assert_eq!(averages.maintainability_grade, Grade::A);
    assert!(report.lint.is_some());
    assert!((0.0..=10.0).contains(&averages.score));
    assert_eq!(report.score(), Some(averages.score));
    assert!(report.insights.is_none());
}

#[test]
fn test_tree_where_every_python_file_fails() {
    let snapshot = analyze(vec![
        ("broken.py", "x = \"abc\n"),
        ("also.py", "def f(:\n  y = (\n"),
        ("README.md", "# Widgets\n"),
    ]);

    let report = snapshot.report().unwrap();
    assert!(report.files.is_empty());
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.total_functions, 0);
    assert!(report.averages.is_none());
    assert_eq!(report.score(), None);
    assert!(report.lint.is_none());
    assert_eq!(report.content.total_files, 3);
}

#[test]
fn test_oversized_file_is_a_failure() {
    let (store, root) = MemoryObjectStore::from_files(vec![
        ("big.py", "x = 1\n".repeat(100)),
        ("small.py", "y = 2\n".to_string()),
    ]);
    let config = CodeAnalysisConfig {
        max_file_size: 64,
        ..CodeAnalysisConfig::default()
    };
    let snapshot = analyze_tree(&store, &root, None, &config).unwrap();
    let report = snapshot.report().unwrap();
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.failures[0].path, "big.py");
}

#[test]
fn test_lint_disabled() {
    let (store, root) = MemoryObjectStore::from_files(vec![("app.py", APP)]);
    let config = CodeAnalysisConfig {
        lint: false,
        ..CodeAnalysisConfig::default()
    };
    let report = analyze_tree(&store, &root, None, &config)
        .unwrap()
        .report()
        .cloned()
        .unwrap();
    assert!(report.lint.is_none());
}

#[tokio::test]
async fn test_memory_tree_source() {
    let source = MemoryTreeSource::from_files(
        vec![("pkg/__init__.py", ""), ("pkg/core.py", APP)],
        CodeAnalysisConfig::default(),
    )
    .with_head("feedbeef");

    let snapshot = source.analyze(&repo()).join().await.unwrap();
    assert_eq!(snapshot.head_commit(), Some("feedbeef"));
    assert_eq!(snapshot.report().unwrap().files.len(), 2);
}
