//! End-to-end dependency scenarios over small hand-written series.

use patchdeps_core::{AnalysisMode, DependencyKind, PatchdepsError, RawRevision};
use patchdeps_lineage::{analyze, AnalysisOptions};

fn raw(id: &str, diff: &str) -> RawRevision {
    RawRevision {
        id: id.into(),
        message: format!("{id} change"),
        diff: diff.into(),
    }
}

#[test]
fn hard_dependency_on_the_line_author() {
    let raws = vec![
        raw("r1", "--- a/x\n+++ b/x\n@@ -4,0 +5 @@\n+foo\n"),
        raw("r2", "--- a/x\n+++ b/x\n@@ -5 +4,0 @@\n-foo\n"),
    ];
    let map = analyze(&raws, &AnalysisOptions::new(AnalysisMode::Line, 0)).unwrap();

    let edge = map.edge(1, 0).unwrap();
    assert_eq!(edge.kind, DependencyKind::Hard);
    assert_eq!(edge.reason.as_deref(), Some("foo"));
    assert!(map.edges().all(|e| e.kind == DependencyKind::Hard));
    assert_eq!(map.edge_count(), 1);
}

#[test]
fn proximity_dependency_within_the_window() {
    let raws = vec![
        raw(
            "r1",
            "--- a/x\n+++ b/x\n@@ -7,6 +7,7 @@\n l7\n l8\n l9\n+new\n l10\n l11\n l12\n",
        ),
        raw("r2", "--- a/x\n+++ b/x\n@@ -11,2 +11,2 @@\n l10\n-l11\n+L11\n"),
    ];
    let map = analyze(&raws, &AnalysisOptions::new(AnalysisMode::Line, 2)).unwrap();

    let edge = map.edge(1, 0).unwrap();
    assert_eq!(edge.kind, DependencyKind::Proximity);
    assert!(edge.reason.is_none());
}

#[test]
fn pure_insertion_is_independent_without_a_window() {
    let raws = vec![
        raw("r1", "--- /dev/null\n+++ b/x\n@@ -0,0 +1,2 @@\n+a\n+b\n"),
        raw("r2", "--- a/x\n+++ b/x\n@@ -1,0 +2 @@\n+mid\n"),
    ];
    let hard_only = analyze(&raws, &AnalysisOptions::new(AnalysisMode::Line, 0)).unwrap();
    assert_eq!(hard_only.edge_count(), 0);

    let windowed = analyze(&raws, &AnalysisOptions::new(AnalysisMode::Line, 1)).unwrap();
    assert_eq!(windowed.edge(1, 0).unwrap().kind, DependencyKind::Proximity);
}

#[test]
fn proximity_needs_the_window() {
    let raws = vec![
        raw(
            "r1",
            "--- a/x\n+++ b/x\n@@ -7,6 +7,7 @@\n l7\n l8\n l9\n+new\n l10\n l11\n l12\n",
        ),
        raw("r2", "--- a/x\n+++ b/x\n@@ -11,2 +11,2 @@\n l10\n-l11\n+L11\n"),
    ];
    let narrow = analyze(&raws, &AnalysisOptions::new(AnalysisMode::Line, 1)).unwrap();
    assert!(!narrow.depends_on(1, 0));
    let hard_only = analyze(&raws, &AnalysisOptions::new(AnalysisMode::Line, 0)).unwrap();
    assert_eq!(hard_only.edge_count(), 0);
}

#[test]
fn recreated_file_depends_on_its_deletion_at_file_level() {
    let raws = vec![
        raw("r1", "--- a/x\n+++ /dev/null\n@@ -1,2 +0,0 @@\n-a\n-b\n"),
        raw("r2", "--- /dev/null\n+++ b/x\n@@ -0,0 +1 @@\n+c\n"),
    ];
    let map = analyze(&raws, &AnalysisOptions::new(AnalysisMode::File, 0)).unwrap();
    assert_eq!(map.edge(1, 0).unwrap().kind, DependencyKind::Hard);
}

#[test]
fn conflicting_context_halts_the_run() {
    let raws = vec![
        raw("r1", "--- /dev/null\n+++ b/x\n@@ -0,0 +1,2 @@\n+foo\n+baz\n"),
        raw("r2", "--- a/x\n+++ b/x\n@@ -2 +2,2 @@\n bar\n+more\n"),
        raw("r3", "--- a/y\n+++ b/y\n@@ -1 +1 @@\n-1\n+2\n"),
    ];
    let err = analyze(&raws, &AnalysisOptions::default()).unwrap_err();
    match &err {
        PatchdepsError::Consistency {
            revision,
            path,
            line,
            expected,
            found,
        } => {
            assert_eq!(revision, "r2");
            assert_eq!(path, "x");
            assert_eq!(*line, 2);
            assert_eq!(expected, "baz");
            assert_eq!(found, "bar");
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("bar") && message.contains("baz"));
}

#[test]
fn replacing_a_line_is_hard_not_proximity() {
    let raws = vec![
        raw("r1", "--- /dev/null\n+++ b/x\n@@ -0,0 +1,3 @@\n+a\n+b\n+c\n"),
        raw("r2", "--- a/x\n+++ b/x\n@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n"),
    ];
    let map = analyze(&raws, &AnalysisOptions::new(AnalysisMode::Line, 3)).unwrap();
    let edge = map.edge(1, 0).unwrap();
    assert_eq!(edge.kind, DependencyKind::Hard);
    assert_eq!(edge.reason.as_deref(), Some("b"));
}

#[test]
fn independent_edits_far_apart_stay_independent() {
    let raws = vec![
        raw("r1", "--- a/x\n+++ b/x\n@@ -10 +10 @@\n-ten\n+TEN\n"),
        raw("r2", "--- a/x\n+++ b/x\n@@ -40 +40 @@\n-forty\n+FORTY\n"),
        raw("r3", "--- a/x\n+++ b/x\n@@ -10 +10 @@\n-TEN\n+10\n"),
    ];
    let map = analyze(&raws, &AnalysisOptions::default()).unwrap();
    assert!(!map.depends_on(1, 0));
    assert!(!map.depends_on(2, 1));
    assert_eq!(map.edge(2, 0).unwrap().kind, DependencyKind::Hard);
}

#[test]
fn reruns_are_identical() {
    let raws = vec![
        raw("r1", "--- /dev/null\n+++ b/x\n@@ -0,0 +1,4 @@\n+1\n+2\n+3\n+4\n\
                   --- /dev/null\n+++ b/y\n@@ -0,0 +1,2 @@\n+a\n+b\n"),
        raw("r2", "--- a/y\n+++ b/y\n@@ -1 +1 @@\n-a\n+A\n\
                   --- a/x\n+++ b/x\n@@ -2,0 +3 @@\n+2.5\n"),
        raw("r3", "--- a/x\n+++ b/x\n@@ -2,2 +2 @@\n-2\n-2.5\n+two\n\
                   --- a/y\n+++ b/y\n@@ -2 +1,0 @@\n-b\n"),
    ];
    let options = AnalysisOptions::default();
    let first = analyze(&raws, &options).unwrap();
    let second = analyze(&raws, &options).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.edge(2, 0).unwrap().reason.as_deref(), Some("2"));
    assert_eq!(first.edge(2, 1).unwrap().kind, DependencyKind::Hard);
}
