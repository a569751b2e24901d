//! Property-based tests for the unified diff parser.

use proptest::prelude::*;

use patchdeps_difflens::parser::{parse_patch, LineAction};

fn action_strategy() -> impl Strategy<Value = LineAction> {
    prop::sample::select(vec![LineAction::Context, LineAction::Add, LineAction::Delete])
}

/// Line content that never looks like a header once prefixed.
fn text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9_(){};= ]{0,30}").expect("valid regex")
}

fn body_strategy() -> impl Strategy<Value = Vec<(LineAction, String)>> {
    prop::collection::vec((action_strategy(), text_strategy()), 1..40)
}

fn render(start: u32, body: &[(LineAction, String)]) -> (String, u32, u32) {
    let source_len = body
        .iter()
        .filter(|(a, _)| *a != LineAction::Add)
        .count() as u32;
    let target_len = body
        .iter()
        .filter(|(a, _)| *a != LineAction::Delete)
        .count() as u32;
    let source_start = if source_len == 0 { start - 1 } else { start };
    let target_start = if target_len == 0 { start - 1 } else { start };

    let mut diff = format!(
        "--- a/src/gen.rs\n+++ b/src/gen.rs\n@@ -{source_start},{source_len} +{target_start},{target_len} @@\n"
    );
    for (action, text) in body {
        let marker = match action {
            LineAction::Context => ' ',
            LineAction::Add => '+',
            LineAction::Delete => '-',
        };
        diff.push(marker);
        diff.push_str(text);
        diff.push('\n');
    }
    (diff, source_len, target_len)
}

proptest! {
    #[test]
    fn counted_lengths_match_header(start in 1u32..500, body in body_strategy()) {
        let (diff, source_len, target_len) = render(start, &body);
        let files = parse_patch(&diff).unwrap();
        prop_assert_eq!(files.len(), 1);
        let hunk = &files[0].hunks[0];
        prop_assert_eq!(hunk.counted_lengths(), (source_len, target_len));
        prop_assert_eq!((hunk.source_len, hunk.target_len), (source_len, target_len));
        prop_assert_eq!(hunk.changes.len(), body.len());
    }

    #[test]
    fn line_numbers_are_consecutive(start in 1u32..500, body in body_strategy()) {
        let (diff, _, _) = render(start, &body);
        let files = parse_patch(&diff).unwrap();
        let hunk = &files[0].hunks[0];

        let sources: Vec<u32> = hunk.changes.iter().filter_map(|c| c.source_line).collect();
        let targets: Vec<u32> = hunk.changes.iter().filter_map(|c| c.target_line).collect();
        let expected_sources: Vec<u32> = (start..start + sources.len() as u32).collect();
        let expected_targets: Vec<u32> = (start..start + targets.len() as u32).collect();
        prop_assert_eq!(sources, expected_sources);
        prop_assert_eq!(targets, expected_targets);
    }

    #[test]
    fn anchors_stay_inside_the_old_range(start in 1u32..500, body in body_strategy()) {
        let (diff, source_len, _) = render(start, &body);
        let files = parse_patch(&diff).unwrap();
        for change in &files[0].hunks[0].changes {
            prop_assert!(change.anchor >= start);
            prop_assert!(change.anchor <= start + source_len);
            if change.action != LineAction::Add {
                prop_assert_eq!(Some(change.anchor), change.source_line);
            }
        }
    }

    #[test]
    fn extra_body_line_is_rejected(
        start in 1u32..500,
        body in body_strategy(),
        extra in action_strategy(),
    ) {
        let (mut diff, _, _) = render(start, &body);
        diff.push_str(match extra {
            LineAction::Context => " surplus\n",
            LineAction::Add => "+surplus\n",
            LineAction::Delete => "-surplus\n",
        });
        prop_assert!(parse_patch(&diff).is_err());
    }

    #[test]
    fn missing_body_line_is_rejected(start in 1u32..500, body in body_strategy()) {
        let (diff, _, _) = render(start, &body);
        let truncated: String = diff
            .lines()
            .take(diff.lines().count() - 1)
            .map(|l| format!("{l}\n"))
            .collect();
        prop_assert!(parse_patch(&truncated).is_err());
    }
}
