//! Import invariants over generated snapshots.

use consul_sync_core::{RecordOutcome, RewriteDecision};
use consul_sync_testkit::{records_strategy, rewrite_strategy, TestEnv, FIXED_TIME};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn import_writes_only_selected_keys_under_destination(
        records in records_strategy(12),
        rewrite in rewrite_strategy(),
    ) {
        let env = TestEnv::new();
        env.write_export(&records);

        let report = env.memory_orchestrator().import_at(&rewrite, FIXED_TIME).unwrap();

        let selected = records.iter().filter(|r| rewrite.selects(&r.key)).count();
        prop_assert_eq!(report.selected(), selected);
        prop_assert_eq!(report.written() + report.skipped(), selected);
        prop_assert_eq!(report.failed(), 0);

        let to = rewrite.to_prefix().trim_start_matches('/');
        for (key, _) in env.local.writes() {
            prop_assert!(!key.is_empty());
            prop_assert!(!key.starts_with('/'), "{}", key);
            prop_assert!(key.starts_with(to), "{} outside {}", key, to);
        }
    }

    #[test]
    fn outcomes_follow_rewrite_decisions(
        records in records_strategy(12),
        rewrite in rewrite_strategy(),
    ) {
        let env = TestEnv::new();
        env.write_export(&records);

        let report = env.memory_orchestrator().import_at(&rewrite, FIXED_TIME).unwrap();

        let expected: Vec<_> = records
            .iter()
            .filter(|r| rewrite.selects(&r.key))
            .map(|r| (r.key.clone(), rewrite.rewrite(&r.key)))
            .collect();
        prop_assert_eq!(report.outcomes.len(), expected.len());
        for (outcome, (key, decision)) in report.outcomes.iter().zip(expected) {
            match (outcome, decision) {
                (RecordOutcome::Written { key: k, destination }, RewriteDecision::Selected(d)) => {
                    prop_assert_eq!(k, &key);
                    prop_assert_eq!(destination, &d);
                }
                (RecordOutcome::Skipped { key: k, reason }, RewriteDecision::Skipped(r)) => {
                    prop_assert_eq!(k, &key);
                    prop_assert_eq!(reason, &r);
                }
                (outcome, decision) => {
                    prop_assert!(false, "{:?} does not match {:?}", outcome, decision);
                }
            }
        }
    }
}
