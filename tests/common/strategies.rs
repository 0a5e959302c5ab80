use cloudsweep_core::models::{
    CloudProvider, PolicyConditions, Resource, ResourceStatus, ResourceType, Tags,
};
use cloudsweep_core::reporting::CleanupResult;
use proptest::prelude::*;
use uuid::Uuid;

pub const REGIONS: [&str; 3] = ["us-east-1", "eu-west-1", "ap-south-1"];

pub fn region_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(REGIONS.to_vec()).prop_map(str::to_string)
}

/// Small tag maps over a narrow vocabulary so required/excluded tags collide often
pub fn tags_strategy() -> impl Strategy<Value = Tags> {
    prop::collection::btree_map(
        prop::sample::select(vec!["env", "team", "keep"]).prop_map(str::to_string),
        prop::sample::select(vec!["prod", "dev", "true"]).prop_map(str::to_string),
        0..3,
    )
}

pub fn status_strategy() -> impl Strategy<Value = ResourceStatus> {
    prop_oneof![
        Just(ResourceStatus::Active),
        Just(ResourceStatus::Unused),
        Just(ResourceStatus::Excluded),
    ]
}

pub fn resource_strategy() -> impl Strategy<Value = Resource> {
    (
        "[a-z]{1,6}-[0-9]{1,4}",
        region_strategy(),
        tags_strategy(),
        status_strategy(),
        0.0f64..500.0,
        0u32..60,
    )
        .prop_map(|(name, region, tags, status, cost, idle_days)| {
            let mut r = Resource::new(
                CloudProvider::Aws,
                ResourceType::EbsVolume,
                format!("vol-{name}"),
                region,
                name,
            );
            r.tags = tags;
            r.status = status;
            r.monthly_cost = cost;
            r.carbon_footprint = cost / 4.0;
            r.last_seen_at -= chrono::Duration::days(i64::from(idle_days));
            r
        })
}

pub fn conditions_strategy() -> impl Strategy<Value = PolicyConditions> {
    (
        prop::option::of(0u32..45),
        prop::option::of(0.0f64..250.0),
        prop::option::of(250.0f64..500.0),
        tags_strategy(),
        tags_strategy(),
        prop::collection::vec(region_strategy(), 0..2),
        prop::option::of(prop::sample::select(vec!["*", "a*", "*-1*", "?b*"]).prop_map(str::to_string)),
    )
        .prop_map(
            |(unused_days, min_monthly_cost, max_monthly_cost, required_tags, excluded_tags, regions, name_pattern)| {
                PolicyConditions {
                    unused_days,
                    min_monthly_cost,
                    max_monthly_cost,
                    required_tags,
                    excluded_tags,
                    regions,
                    name_pattern,
                }
            },
        )
}

pub fn cleanup_result_strategy() -> impl Strategy<Value = CleanupResult> {
    (any::<bool>(), 0.0f64..100.0, 0.0f64..25.0).prop_map(|(success, cost, carbon)| {
        if success {
            CleanupResult::succeeded(Uuid::new_v4(), "delete", cost, carbon)
        } else {
            CleanupResult::failed(Uuid::new_v4(), "delete", "access denied")
        }
    })
}
