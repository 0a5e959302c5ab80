//! Inventory and savings summaries over an organization's resources.

use crate::constants::TOP_RESOURCE_TYPES;
use crate::models::{CloudProvider, Resource, ResourceStatus, ResourceType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::Hash;

/// Unused-resource totals for one group (provider, type or region)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsBreakdown<K> {
    pub key: K,
    pub unused_count: usize,
    pub monthly_cost: f64,
    pub carbon_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_resources: usize,
    pub unused_resources: usize,
    pub total_monthly_cost: f64,
    pub potential_monthly_savings: f64,
    pub total_carbon_kg: f64,
    pub potential_carbon_savings_kg: f64,
    pub by_provider: Vec<SavingsBreakdown<CloudProvider>>,
    /// Highest-cost types first, truncated
    pub by_resource_type: Vec<SavingsBreakdown<ResourceType>>,
    /// Highest-carbon regions first
    pub by_region: Vec<SavingsBreakdown<String>>,
}

impl InventorySummary {
    pub fn from_resources<'a, I>(resources: I) -> Self
    where
        I: IntoIterator<Item = &'a Resource>,
    {
        let mut summary = Self {
            total_resources: 0,
            unused_resources: 0,
            total_monthly_cost: 0.0,
            potential_monthly_savings: 0.0,
            total_carbon_kg: 0.0,
            potential_carbon_savings_kg: 0.0,
            by_provider: Vec::new(),
            by_resource_type: Vec::new(),
            by_region: Vec::new(),
        };

        let mut by_provider = BTreeMap::new();
        let mut by_type = BTreeMap::new();
        let mut by_region = BTreeMap::new();

        for resource in resources {
            if resource.status == ResourceStatus::Deleted {
                continue;
            }
            summary.total_resources += 1;
            summary.total_monthly_cost += resource.monthly_cost;
            summary.total_carbon_kg += resource.carbon_footprint;

            if resource.status != ResourceStatus::Unused {
                continue;
            }
            summary.unused_resources += 1;
            summary.potential_monthly_savings += resource.monthly_cost;
            summary.potential_carbon_savings_kg += resource.carbon_footprint;

            accumulate(&mut by_provider, resource.provider, resource);
            accumulate(&mut by_type, resource.resource_type, resource);
            accumulate(&mut by_region, resource.region.clone(), resource);
        }

        summary.by_provider = by_provider.into_values().collect();

        let mut types: Vec<_> = by_type.into_values().collect();
        types.sort_by(|a, b| b.monthly_cost.total_cmp(&a.monthly_cost));
        types.truncate(TOP_RESOURCE_TYPES);
        summary.by_resource_type = types;

        let mut regions: Vec<_> = by_region.into_values().collect();
        regions.sort_by(|a, b| b.carbon_kg.total_cmp(&a.carbon_kg));
        summary.by_region = regions;

        summary
    }
}

fn accumulate<K: Ord + Hash + Clone>(
    groups: &mut BTreeMap<K, SavingsBreakdown<K>>,
    key: K,
    resource: &Resource,
) {
    let entry = groups
        .entry(key.clone())
        .or_insert_with(|| SavingsBreakdown {
            key,
            unused_count: 0,
            monthly_cost: 0.0,
            carbon_kg: 0.0,
        });
    entry.unused_count += 1;
    entry.monthly_cost += resource.monthly_cost;
    entry.carbon_kg += resource.carbon_footprint;
}
