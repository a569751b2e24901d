//! Mining revisions from scratch repositories built with git2.

use std::path::Path;

use git2::{Commit, Oid, Repository, Signature};
use patchdeps_core::{DependencyKind, PatchdepsError};
use patchdeps_gitpulse::mining::{collect_revisions, MiningOptions};
use patchdeps_lineage::{analyze, AnalysisOptions};

struct Scratch {
    dir: tempfile::TempDir,
    repo: Repository,
}

impl Scratch {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self { dir, repo }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, path: &str, content: &str) -> &Self {
        std::fs::write(self.path().join(path), content).unwrap();
        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(path)).unwrap();
        index.write().unwrap();
        self
    }

    fn remove(&self, path: &str) -> &Self {
        std::fs::remove_file(self.path().join(path)).unwrap();
        let mut index = self.repo.index().unwrap();
        index.remove_path(Path::new(path)).unwrap();
        index.write().unwrap();
        self
    }

    fn commit(&self, message: &str) -> Oid {
        let mut index = self.repo.index().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let parents: Vec<Commit> = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&Commit> = parents.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }
}

fn short(oid: Oid) -> String {
    oid.to_string()[..8].to_string()
}

fn three_commits() -> (Scratch, [Oid; 3]) {
    let scratch = Scratch::new();
    let first = scratch
        .write("greeting.txt", "hello\nworld\n")
        .commit("add greeting\n\nlonger body");
    let second = scratch.write("other.txt", "unrelated\n").commit("add other");
    let third = scratch
        .write("greeting.txt", "hello\nthere\n")
        .commit("change greeting");
    (scratch, [first, second, third])
}

#[test]
fn head_history_is_oldest_first() {
    let (scratch, oids) = three_commits();
    let revisions = collect_revisions(scratch.path(), &[], &MiningOptions::default()).unwrap();

    let ids: Vec<_> = revisions.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, oids.map(short).to_vec());
    assert_eq!(revisions[0].message, "add greeting");
    assert!(revisions[0].diff.contains("--- /dev/null"));
    assert!(revisions[0].diff.contains("+++ b/greeting.txt"));
    assert!(revisions[2].diff.contains("-world\n+there\n"));
}

#[test]
fn ranges_and_exclusions_limit_the_walk() {
    let (scratch, oids) = three_commits();
    let opts = MiningOptions::default();

    let range = format!("{}..HEAD", oids[0]);
    let revisions = collect_revisions(scratch.path(), &[range], &opts).unwrap();
    assert_eq!(revisions.len(), 2);
    assert_eq!(revisions[0].id, short(oids[1]));

    let specs = vec!["HEAD".to_string(), format!("^{}", oids[1])];
    let revisions = collect_revisions(scratch.path(), &specs, &opts).unwrap();
    assert_eq!(revisions.len(), 1);
    assert_eq!(revisions[0].message, "change greeting");
}

#[test]
fn unknown_spec_is_a_git_error() {
    let (scratch, _) = three_commits();
    let err = collect_revisions(
        scratch.path(),
        &["no-such-branch".to_string()],
        &MiningOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PatchdepsError::Git(_)));
}

#[test]
fn context_lines_follow_the_options() {
    let scratch = Scratch::new();
    scratch.write("f", "1\n2\n3\n4\n5\n6\n7\n").commit("base");
    scratch.write("f", "1\n2\n3\nfour\n5\n6\n7\n").commit("edit");

    let narrow = MiningOptions {
        context_lines: 0,
        ..MiningOptions::default()
    };
    let revisions = collect_revisions(scratch.path(), &[], &narrow).unwrap();
    assert!(revisions[1].diff.contains("@@ -4 +4 @@"));
    assert!(!revisions[1].diff.contains(" 3\n"));

    let wide = MiningOptions {
        context_lines: 3,
        ..MiningOptions::default()
    };
    let revisions = collect_revisions(scratch.path(), &[], &wide).unwrap();
    assert!(revisions[1].diff.contains(" 1\n 2\n 3\n-4\n+four\n 5\n 6\n 7\n"));
}

#[test]
fn pure_rename_still_links_the_paths() {
    let scratch = Scratch::new();
    scratch.write("old.txt", "one\ntwo\nthree\n").commit("create");
    scratch.remove("old.txt").write("new.txt", "one\ntwo\nthree\n").commit("rename");
    scratch.write("new.txt", "one\n2\nthree\n").commit("edit renamed");

    let revisions = collect_revisions(scratch.path(), &[], &MiningOptions::default()).unwrap();
    assert!(revisions[1].diff.contains("--- a/old.txt\n+++ b/new.txt\n"));

    let map = analyze(&revisions, &AnalysisOptions::default()).unwrap();
    assert_eq!(map.edge(2, 0).unwrap().kind, DependencyKind::Hard);
    assert_eq!(map.edge(2, 0).unwrap().reason.as_deref(), Some("two"));
}

#[test]
fn mined_history_analyzes_end_to_end() {
    let (scratch, _) = three_commits();
    let revisions = collect_revisions(scratch.path(), &[], &MiningOptions::default()).unwrap();
    let map = analyze(&revisions, &AnalysisOptions::default()).unwrap();

    let edge = map.edge(2, 0).unwrap();
    assert_eq!(edge.kind, DependencyKind::Hard);
    assert_eq!(edge.reason.as_deref(), Some("world"));
    assert!(!map.depends_on(2, 1));
    assert!(!map.depends_on(1, 0));
}
