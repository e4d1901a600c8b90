//! Walk a tree out of an [`ObjectStore`] and build the snapshot.

use super::CodeAnalysisConfig;
use super::error::CodeAnalysisError;
use super::languages::{
    extension, is_ignored_dir, is_ignored_extension, is_test_file, language_for_extension,
};
use super::object_store::{EntryKind, ObjectId, ObjectStore};
use super::python;
use super::types::{
    CodeQualityReport, CodeQualitySnapshot, ContentSummary, EmptySnapshot, FileAnalysisError,
    FileMetrics, Grade, HIGH_COMPLEXITY, LargestFile, LintCategory, LintMessage, LintSummary,
    QualityAverages,
};
use log::{debug, warn};

const LARGEST_FILES: usize = 10;

/// Lines as a text editor counts them: a final line without newline counts.
fn count_lines(text: &str) -> u64 {
    let newlines = text.bytes().filter(|&b| b == b'\n').count() as u64;
    newlines + u64::from(!text.is_empty() && !text.ends_with('\n'))
}

fn decode_lossless(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        // latin-1: every byte is a code point
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

#[derive(Default)]
struct Collected {
    content: ContentSummary,
    largest: Vec<LargestFile>,
    target_files: usize,
    analyzed: Vec<python::PythonFile>,
    failures: Vec<FileAnalysisError>,
}

/// Analyze the tree rooted at `root`. `head` is recorded on the snapshot.
pub fn analyze_tree(
    store: &dyn ObjectStore,
    root: &ObjectId,
    head: Option<String>,
    config: &CodeAnalysisConfig,
) -> Result<CodeQualitySnapshot, CodeAnalysisError> {
    let mut acc = Collected::default();
    let mut pending: Vec<(String, ObjectId)> = vec![(String::new(), root.clone())];

    while let Some((prefix, tree_id)) = pending.pop() {
        let mut entries = store
            .tree(&tree_id)
            .map_err(|e| CodeAnalysisError::Traversal(format!("{prefix}/: {e}")))?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        for entry in entries {
            let path = if prefix.is_empty() {
                entry.name.clone()
            } else {
                format!("{prefix}/{}", entry.name)
            };
            match entry.kind {
                EntryKind::Tree if is_ignored_dir(&entry.name) => {
                    debug!("Skipping ignored directory {path}");
                }
                EntryKind::Tree => pending.push((path, entry.id)),
                EntryKind::Blob => visit_blob(store, &entry.name, path, &entry.id, config, &mut acc),
                EntryKind::Other => {}
            }
        }
    }

    acc.largest
        .sort_by(|a, b| b.lines.cmp(&a.lines).then_with(|| a.path.cmp(&b.path)));
    acc.largest.truncate(LARGEST_FILES);
    acc.content.largest_files = acc.largest;

    if acc.target_files == 0 {
        return Ok(CodeQualitySnapshot::Empty(EmptySnapshot {
            language: config.target_language.clone(),
            head_commit: head,
            content: acc.content,
        }));
    }

    Ok(CodeQualitySnapshot::Analyzed(Box::new(build_report(
        acc.content,
        acc.analyzed,
        acc.failures,
        head,
        config,
    ))))
}

fn visit_blob(
    store: &dyn ObjectStore,
    name: &str,
    path: String,
    id: &ObjectId,
    config: &CodeAnalysisConfig,
    acc: &mut Collected,
) {
    let ext = extension(name);
    if is_ignored_extension(&ext) {
        return;
    }

    acc.content.total_files += 1;
    let key = if ext.is_empty() {
        "no_extension".to_string()
    } else {
        ext.clone()
    };
    *acc.content.file_types.entry(key).or_insert(0) += 1;
    if is_test_file(&path) {
        acc.content.test_files += 1;
    }

    let Some(language) = language_for_extension(&ext) else {
        return;
    };
    let is_target = language.eq_ignore_ascii_case(&config.target_language);
    if is_target {
        acc.target_files += 1;
    }

    let fail = |acc: &mut Collected, path: &str, message: String| {
        warn!("Skipping {path}: {message}");
        acc.failures.push(FileAnalysisError {
            path: path.to_string(),
            message,
        });
    };

    let stats = acc.content.languages.entry(language.to_string()).or_default();
    stats.files += 1;

    let bytes = match store.blob(id) {
        Ok(bytes) => bytes,
        Err(e) => {
            if is_target {
                fail(acc, &path, e.to_string());
            }
            return;
        }
    };
    if bytes.len() > config.max_file_size {
        if is_target {
            fail(
                acc,
                &path,
                format!("file is {} bytes, limit is {}", bytes.len(), config.max_file_size),
            );
        }
        return;
    }

    let text = decode_lossless(&bytes);
    let lines = count_lines(&text);
    stats.lines += lines;
    acc.content.total_lines += lines;
    acc.largest.push(LargestFile {
        path: path.clone(),
        lines,
        size: bytes.len() as u64,
        language: language.to_string(),
    });

    if !is_target {
        return;
    }
    if std::str::from_utf8(&bytes).is_err() {
        fail(acc, &path, "file is not valid UTF-8".to_string());
        return;
    }
    match python::analyze_source(&path, &text, config.lint) {
        Ok(file) => acc.analyzed.push(file),
        Err(e) => fail(acc, &path, e.to_string()),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

fn summarize_lint(files: usize, messages: Vec<LintMessage>) -> LintSummary {
    let count = |cat: LintCategory| messages.iter().filter(|m| m.category == cat).count();
    let errors = count(LintCategory::Error);
    let warnings = count(LintCategory::Warning);
    let conventions = count(LintCategory::Convention);
    let refactors = count(LintCategory::Refactor);
    LintSummary {
        files,
        errors,
        warnings,
        conventions,
        refactors,
        score: python::lint::lint_score(files, errors, warnings, conventions, refactors),
        messages,
    }
}

/// `0.5 * MI/10 + 0.3 * cc + 0.2 * lint`, or `0.6 * MI/10 + 0.4 * cc` without
/// lint, where `cc = clamp(11 - avg_complexity)`.
#[must_use]
pub fn aggregate_score(avg_maintainability: f64, avg_complexity: f64, lint: Option<f64>) -> f64 {
    let mi = (avg_maintainability / 10.0).clamp(0.0, 10.0);
    let cc = (11.0 - avg_complexity).clamp(0.0, 10.0);
    let score = match lint {
        Some(lint) => 0.5 * mi + 0.3 * cc + 0.2 * lint.clamp(0.0, 10.0),
        None => 0.6 * mi + 0.4 * cc,
    };
    score.clamp(0.0, 10.0)
}

fn build_report(
    content: ContentSummary,
    analyzed: Vec<python::PythonFile>,
    failures: Vec<FileAnalysisError>,
    head: Option<String>,
    config: &CodeAnalysisConfig,
) -> CodeQualityReport {
    let mut files: Vec<FileMetrics> = Vec::with_capacity(analyzed.len());
    let mut messages = Vec::new();
    for file in analyzed {
        files.push(file.metrics);
        messages.extend(file.lint);
    }

    let complexities: Vec<u32> = files
        .iter()
        .flat_map(|f| f.functions.iter().map(|func| func.complexity))
        .collect();

    // Failed files are left out, so with no analyzed file there is nothing to
    // average.
    let (averages, lint) = if files.is_empty() {
        (None, None)
    } else {
        let avg_complexity = mean(complexities.iter().map(|&c| f64::from(c)));
        let avg_maintainability = mean(files.iter().map(|f| f.maintainability));
        let lint = config
            .lint
            .then(|| summarize_lint(files.len(), messages));
        let averages = QualityAverages {
            avg_complexity,
            complexity_grade: Grade::for_complexity(avg_complexity),
            avg_maintainability,
            maintainability_grade: Grade::for_maintainability(avg_maintainability),
            score: aggregate_score(
                avg_maintainability,
                avg_complexity,
                lint.as_ref().map(|l| l.score),
            ),
        };
        (Some(averages), lint)
    };

    CodeQualityReport {
        language: config.target_language.clone(),
        head_commit: head,
        content,
        total_functions: complexities.len(),
        high_complexity_functions: complexities.iter().filter(|&&c| c > HIGH_COMPLEXITY).count(),
        averages,
        lint,
        files,
        failures,
        insights: None,
    }
}
