//! Path classification: language buckets, ignore lists and test files.

/// Lowercase extension including the dot, or `""` when the name has none.
#[must_use]
pub fn extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => format!(".{}", ext.to_ascii_lowercase()),
        None => String::new(),
    }
}

/// Language bucket for an extension as returned by [`extension`].
#[must_use]
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let lang = match ext {
        ".py" => "Python",
        ".js" | ".jsx" => "JavaScript",
        ".ts" | ".tsx" => "TypeScript",
        ".java" => "Java",
        ".cpp" => "C++",
        ".c" => "C",
        ".h" => "C/C++ Header",
        ".hpp" => "C++ Header",
        ".cs" => "C#",
        ".go" => "Go",
        ".rb" => "Ruby",
        ".php" => "PHP",
        ".swift" => "Swift",
        ".kt" => "Kotlin",
        ".rs" => "Rust",
        ".scala" => "Scala",
        ".sql" => "SQL",
        ".html" => "HTML",
        ".css" => "CSS",
        ".scss" => "SCSS",
        ".sass" => "Sass",
        ".less" => "Less",
        ".md" => "Markdown",
        ".json" => "JSON",
        ".xml" => "XML",
        ".yaml" | ".yml" => "YAML",
        ".toml" => "TOML",
        ".sh" => "Shell",
        ".bash" => "Bash",
        ".r" => "R",
        ".m" => "MATLAB",
        ".vim" => "Vimscript",
        _ => return None,
    };
    Some(lang)
}

const IGNORED_EXTENSIONS: &[&str] = &[
    ".pyc", ".pyo", ".pyd", ".so", ".dll", ".dylib", ".exe", // binaries
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".ico", ".bmp", // images
    ".mp3", ".mp4", ".avi", ".mov", ".wav", // media
    ".zip", ".tar", ".gz", ".rar", ".7z", // archives
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", // documents
    ".lock", ".log", ".tmp", ".cache",
];

const IGNORED_DIRS: &[&str] = &[
    "__pycache__",
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "venv",
    "env",
    "ENV",
    ".venv",
    "virtualenv",
    "build",
    "dist",
    ".egg-info",
    "target",
    ".pytest_cache",
    ".mypy_cache",
    ".tox",
    "coverage",
    ".coverage",
    "htmlcov",
];

#[must_use]
pub fn is_ignored_extension(ext: &str) -> bool {
    IGNORED_EXTENSIONS.contains(&ext)
}

/// Directory names never descended into. `*.egg-info` counts as well.
#[must_use]
pub fn is_ignored_dir(name: &str) -> bool {
    IGNORED_DIRS.contains(&name) || name.ends_with(".egg-info")
}

const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec", "e2e"];

/// Test file by naming convention or by living under a test directory.
#[must_use]
pub fn is_test_file(path: &str) -> bool {
    let mut parts = path.split('/').collect::<Vec<_>>();
    let Some(file_name) = parts.pop() else {
        return false;
    };
    file_name.contains("_test.")
        || file_name.contains("_spec.")
        || file_name.starts_with("test_")
        || file_name.contains(".test.")
        || file_name.contains(".spec.")
        || parts.iter().any(|dir| TEST_DIRS.contains(dir))
}
