//! Hygiene: coding standards enforced at test time.
//!
//! Scans the production sources under `src/` (test files excluded) for
//! patterns the project doesn't allow. Each pattern has a budget. Budgets
//! only ever go down.
#![allow(clippy::absurd_extreme_comparisons)]

use std::fs;
use std::path::Path;

struct SourceFile {
    path: String,
    content: String,
}

struct Budget {
    pattern: &'static str,
    max: usize,
    /// Files the pattern is allowed in regardless of the budget.
    exempt: &'static [&'static str],
}

// Panics.
const UNWRAP: Budget = Budget { pattern: ".unwrap()", max: 0, exempt: &[] };
const EXPECT: Budget = Budget { pattern: ".expect(", max: 0, exempt: &[] };
const PANIC: Budget = Budget { pattern: "panic!(", max: 0, exempt: &[] };
const UNREACHABLE: Budget = Budget { pattern: "unreachable!(", max: 0, exempt: &[] };
const TODO: Budget = Budget { pattern: "todo!(", max: 0, exempt: &[] };
const UNIMPLEMENTED: Budget = Budget { pattern: "unimplemented!(", max: 0, exempt: &[] };

// Silently dropped errors.
const SILENT_DISCARD: Budget = Budget { pattern: "let _ =", max: 0, exempt: &[] };
const DOT_OK: Budget = Budget { pattern: ".ok()", max: 0, exempt: &[] };

// Leftovers.
const ALLOW_DEAD_CODE: Budget = Budget { pattern: "#[allow(dead_code)]", max: 0, exempt: &[] };
const DBG: Budget = Budget { pattern: "dbg!(", max: 0, exempt: &[] };
const PRINTLN: Budget = Budget { pattern: "println!(", max: 0, exempt: &["main.rs"] };

fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        if !path_str.ends_with(".rs") || path_str.ends_with("_test.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
        }
    }
}

fn hits(files: &[SourceFile], budget: &Budget) -> Vec<(String, usize)> {
    files
        .iter()
        .filter(|file| !budget.exempt.iter().any(|name| file.path.ends_with(name)))
        .map(|file| (file.path.clone(), file.content.lines().filter(|line| line.contains(budget.pattern)).count()))
        .filter(|(_, count)| *count > 0)
        .collect()
}

fn assert_within(budget: &Budget) {
    let files = source_files();
    assert!(!files.is_empty(), "no sources found under src/");
    let found = hits(&files, budget);
    let count: usize = found.iter().map(|(_, c)| c).sum();
    let listing = found.iter().map(|(path, c)| format!("  {path}: {c}")).collect::<Vec<_>>().join("\n");
    assert!(count <= budget.max, "`{}` budget exceeded: found {count}, max {}.\n{listing}", budget.pattern, budget.max);
}

#[test]
fn unwrap_budget() {
    assert_within(&UNWRAP);
}

#[test]
fn expect_budget() {
    assert_within(&EXPECT);
}

#[test]
fn panic_budget() {
    assert_within(&PANIC);
}

#[test]
fn unreachable_budget() {
    assert_within(&UNREACHABLE);
}

#[test]
fn todo_budget() {
    assert_within(&TODO);
}

#[test]
fn unimplemented_budget() {
    assert_within(&UNIMPLEMENTED);
}

#[test]
fn silent_discard_budget() {
    assert_within(&SILENT_DISCARD);
}

#[test]
fn dot_ok_budget() {
    assert_within(&DOT_OK);
}

#[test]
fn allow_dead_code_budget() {
    assert_within(&ALLOW_DEAD_CODE);
}

#[test]
fn dbg_budget() {
    assert_within(&DBG);
}

#[test]
fn println_outside_binary_budget() {
    assert_within(&PRINTLN);
}
