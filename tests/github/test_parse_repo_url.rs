//! Tests for repository URL parsing.

use repo_insights::{GitHubError, parse_repo_url};

fn parsed(url: &str) -> (String, String) {
    parse_repo_url(url).unwrap()
}

#[test]
fn test_accepted_forms() {
    let expected = ("octo".to_string(), "widgets".to_string());
    for url in [
        "https://github.com/octo/widgets",
        "https://github.com/octo/widgets.git",
        "http://github.com/octo/widgets/",
        "https://www.github.com/octo/widgets/tree/main/src",
        "git@github.com:octo/widgets.git",
        "github.com/octo/widgets/",
        "octo/widgets",
        "  octo/widgets  ",
    ] {
        assert_eq!(parsed(url), expected, "for {url}");
    }
}

#[test]
fn test_names_with_dots_and_dashes() {
    assert_eq!(
        parsed("https://github.com/some-org/my.repo_name"),
        ("some-org".to_string(), "my.repo_name".to_string())
    );
}

#[test]
fn test_rejected_forms() {
    for url in [
        "https://gitlab.com/a/b",
        "widgets",
        "https://github.com/octo",
        "github.com/octo",
        "",
    ] {
        let err = parse_repo_url(url).unwrap_err();
        assert!(matches!(err, GitHubError::InvalidInput(_)), "for {url}: {err}");
    }
}
