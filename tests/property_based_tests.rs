mod common;

use chrono::Utc;
use cloudsweep_core::models::ResourceStatus;
use cloudsweep_core::policy::{glob_matches, matches};
use cloudsweep_core::reporting::{
    spawn_aggregator, CleanupReport, CleanupResult, InventorySummary, PositionedResult,
};
use common::strategies::*;
use proptest::prelude::*;
use uuid::Uuid;

proptest! {
    /// Property: evaluation depends only on its inputs
    #[test]
    fn condition_matching_is_deterministic(
        resource in resource_strategy(),
        conditions in conditions_strategy(),
    ) {
        let now = Utc::now();
        prop_assert_eq!(
            matches(&resource, &conditions, now),
            matches(&resource, &conditions, now)
        );
    }

    /// Property: a matching excluded tag vetoes every other condition
    #[test]
    fn excluded_tags_always_win(
        resource in resource_strategy(),
        mut conditions in conditions_strategy(),
    ) {
        if let Some((key, value)) = resource.tags.iter().next() {
            conditions.excluded_tags.insert(key.clone(), value.clone());
            prop_assert!(!matches(&resource, &conditions, Utc::now()));
        }
    }

    /// Property: empty conditions accept everything
    #[test]
    fn empty_conditions_match_any_resource(resource in resource_strategy()) {
        prop_assert!(matches(&resource, &Default::default(), Utc::now()));
    }

    /// Property: unused_days only ever selects unused resources
    #[test]
    fn unused_days_requires_unused_status(
        resource in resource_strategy(),
        mut conditions in conditions_strategy(),
        days in 0u32..30,
    ) {
        conditions.unused_days = Some(days);
        if matches(&resource, &conditions, Utc::now()) {
            prop_assert_eq!(resource.status, ResourceStatus::Unused);
        }
    }

    /// Property: a pattern without wildcards matches exactly its own text
    #[test]
    fn literal_patterns_match_themselves(name in "[a-z0-9.+()-]{1,16}") {
        prop_assert!(glob_matches(&name, &name));
        let longer = format!("{name}x");
        prop_assert!(!glob_matches(&name, &longer));
    }

    /// Property: every result is counted exactly once and only successes save money
    #[test]
    fn report_counts_and_totals_are_consistent(
        results in prop::collection::vec(cleanup_result_strategy(), 0..40),
    ) {
        let expected_cost: f64 = results.iter().filter(|r| r.success).map(|r| r.cost_saved).sum();
        let report = CleanupReport::from_results(results.clone());

        prop_assert_eq!(report.success_count + report.failure_count, results.len());
        prop_assert!((report.total_cost_saved - expected_cost).abs() < 1e-9);
        prop_assert_eq!(report.results, results);
    }

    /// Property: the aggregator restores request order whatever the arrival order
    #[test]
    fn aggregator_restores_request_order(
        order in Just((0..12usize).collect::<Vec<_>>()).prop_shuffle(),
    ) {
        let ids: Vec<Uuid> = (0..order.len()).map(|_| Uuid::new_v4()).collect();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let report = runtime.block_on(async {
            let (sender, handle) = spawn_aggregator(ids.len());
            for &position in &order {
                let result = CleanupResult::succeeded(ids[position], "delete", 1.0, 0.1);
                sender.send(PositionedResult::new(position, result)).await.unwrap();
            }
            drop(sender);
            handle.await.unwrap()
        });

        let reported: Vec<Uuid> = report.results.iter().map(|r| r.resource_id).collect();
        prop_assert_eq!(reported, ids);
        prop_assert_eq!(report.success_count, order.len());
    }

    /// Property: savings never exceed spend and the type breakdown stays bounded
    #[test]
    fn inventory_savings_are_bounded(
        resources in prop::collection::vec(resource_strategy(), 0..30),
    ) {
        let summary = InventorySummary::from_resources(&resources);

        prop_assert!(summary.unused_resources <= summary.total_resources);
        prop_assert!(summary.potential_monthly_savings <= summary.total_monthly_cost + 1e-9);
        prop_assert!(summary.potential_carbon_savings_kg <= summary.total_carbon_kg + 1e-9);
        prop_assert!(summary.by_resource_type.len() <= 10);
        let by_provider_unused: usize = summary.by_provider.iter().map(|b| b.unused_count).sum();
        prop_assert_eq!(by_provider_unused, summary.unused_resources);
    }
}
