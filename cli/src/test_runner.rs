use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use confdoc::parser::Parser;
use overlay::{apply_overlays, extract_cli_options};
use serde::Deserialize;

use crate::config;

const SUFFIX: &str = ".test.conf";

/// Front matter of a `.test.conf` file.
#[derive(Debug, Default, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub description: Option<String>,

    /// Overlay options, exactly as they would appear on the command line.
    #[serde(default)]
    pub args: Vec<String>,

    /// Expected output of a successful decode (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Substring of the rendered diagnostics; the case must produce an error.
    #[serde(default)]
    pub expect_error: Option<String>,

    #[serde(default)]
    pub expect_parse_error: bool,
}

/// Split a test file into its TOML front matter and the document after it.
fn split_front_matter(content: &str) -> Result<(TestCase, &str), String> {
    let content = content.trim_start_matches('\u{feff}');
    let body = content
        .strip_prefix("---")
        .ok_or("missing opening --- delimiter")?;
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);

    let (header, rest) = match body.strip_prefix("---") {
        Some(rest) => ("", rest),
        None => {
            let close = body.find("\n---").ok_or("missing closing --- delimiter")?;
            (
                body[..close].trim_end_matches('\r'),
                &body[close + "\n---".len()..],
            )
        }
    };
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let case = toml::from_str(header).map_err(|e| format!("TOML parse error: {}", e))?;
    Ok((case, source))
}

/// Run one case against its document. `Err` carries the failure reason.
fn check_case(case: &TestCase, source: &str) -> Result<(), String> {
    let parsed = Parser::new(source.to_string(), 0).parse();
    if case.expect_parse_error {
        return match parsed {
            Err(_) => Ok(()),
            Ok(_) => Err("expected parse error, but parsing succeeded".into()),
        };
    }
    let document = parsed.map_err(|errors| {
        let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
        format!("unexpected parse error: {}", messages.join("; "))
    })?;

    let extracted = extract_cli_options(&case.args, &config::root_schema());
    if !extracted.remaining.is_empty() {
        return Err(format!(
            "arguments not taken as overlays: {}",
            extracted.remaining.join(" ")
        ));
    }
    let body = apply_overlays(Rc::new(document), extracted.overlays);
    let (decoded, more) = config::decode(body.as_ref());
    let mut diags = extracted.diagnostics;
    diags.extend(more);

    if let Some(expected) = &case.expect_error {
        let text = diags.to_string();
        return if !diags.has_errors() {
            Err(format!(
                "expected error containing \"{}\", but decoding succeeded",
                expected
            ))
        } else if text.contains(expected.as_str()) {
            Ok(())
        } else {
            Err(format!(
                "expected error containing \"{}\", got:\n{}",
                expected, text
            ))
        };
    }
    if diags.has_errors() {
        return Err(format!("unexpected error:\n{}", diags));
    }

    if let Some(expected) = &case.expect_output {
        let mut out = Vec::new();
        config::write_config(&decoded, &mut out)
            .map_err(|e| format!("cannot render output: {}", e))?;
        let actual = String::from_utf8_lossy(&out);
        if actual.trim() != expected.trim() {
            return Err(format!(
                "output mismatch\n  expected: {}\n  actual:   {}",
                expected.trim(),
                actual.trim()
            ));
        }
    }
    Ok(())
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub failure: Option<String>,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(SUFFIX))
                .unwrap_or("?")
        })
    }
}

pub fn run_single_test(path: &Path) -> TestResult {
    let mut result = TestResult {
        path: path.to_path_buf(),
        description: None,
        failure: None,
    };
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            result.failure = Some(format!("cannot read file: {}", e));
            return result;
        }
    };
    match split_front_matter(&content) {
        Ok((case, source)) => {
            result.description = case.description.clone();
            result.failure = check_case(&case, source).err();
        }
        Err(e) => result.failure = Some(format!("front matter error: {}", e)),
    }
    result
}

/// Test files under `root` keyed by their directory relative to `root`.
/// A single file is its own uncategorized suite.
fn discover(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut found: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    if root.is_file() {
        found.entry(String::new()).or_default().push(root.to_path_buf());
        return found;
    }
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for path in entries.flatten().map(|e| e.path()) {
            if path.is_dir() {
                pending.push(path);
            } else if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(SUFFIX))
            {
                let category = dir
                    .strip_prefix(root)
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                found.entry(category).or_default().push(path);
            }
        }
    }
    for files in found.values_mut() {
        files.sort();
    }
    found
}

fn category_name(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }
    let found = discover(path);
    if found.is_empty() {
        eprintln!("no {} files found in {}", SUFFIX, path.display());
        return;
    }
    eprintln!("available categories:");
    for (category, files) in &found {
        eprintln!("  {} ({} tests)", category_name(category), files.len());
    }
}

/// ANSI styling for the report, or none of it.
#[derive(Clone, Copy)]
struct Palette {
    color: bool,
}

impl Palette {
    fn paint(self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    fn pass(self) -> String {
        self.paint("32", "PASS")
    }

    fn fail(self) -> String {
        self.paint("31", "FAIL")
    }

    fn heading(self, text: &str) -> String {
        self.paint("1", text)
    }
}

/// Keep only the categories named in `wanted`, or a category nested under
/// one of them. Unknown names are warned about.
fn select<'a>(
    found: &'a BTreeMap<String, Vec<PathBuf>>,
    wanted: &[String],
) -> Vec<(&'a str, &'a [PathBuf])> {
    if wanted.is_empty() {
        return found.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }
    let mut selected = BTreeMap::new();
    for requested in wanted {
        let req = requested.trim_matches('/');
        let before = selected.len();
        for (category, files) in found {
            let nested = category
                .strip_prefix(req)
                .is_some_and(|rest| rest.starts_with('/'));
            if category == req || nested {
                selected.insert(category.as_str(), files.as_slice());
            }
        }
        if selected.len() == before {
            let available: Vec<&str> = found.keys().map(|k| category_name(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                available.join(", ")
            );
        }
    }
    selected.into_iter().collect()
}

/// Run every test case under `path` and print a report to stderr.
/// Returns the process exit code.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let palette = Palette { color: !no_color };
    let found = discover(path);
    if found.is_empty() {
        eprintln!("no {} files found in {}", SUFFIX, path.display());
        return 1;
    }
    let suites = if path.is_file() {
        select(&found, &[])
    } else {
        select(&found, categories)
    };
    if suites.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures = Vec::new();
    for (category, files) in suites {
        if !path.is_file() {
            eprintln!();
            eprintln!("{}", palette.heading(category_name(category)));
        }
        for file in files {
            let result = run_single_test(file);
            if result.failure.is_none() {
                passed += 1;
                eprintln!("  {}  {}", palette.pass(), result.label());
            } else {
                eprintln!("  {}  {}", palette.fail(), result.label());
                failures.push(result);
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for result in &failures {
            eprintln!();
            eprintln!("  --- {} ---", result.path.display());
            for line in result.failure.iter().flat_map(|f| f.lines()) {
                eprintln!("  {}", line);
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", palette.paint("32", "ok"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            palette.paint("31", "FAILED"),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}
