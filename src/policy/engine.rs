//! # Policy Condition Engine
//!
//! Pure evaluation of resources against declarative policy conditions. The
//! clock is an argument so results are reproducible.

use super::pattern::glob_to_regex;
use crate::models::{Policy, PolicyAction, PolicyConditions, Resource, ResourceStatus};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;

/// Conditions with the name glob compiled once, for evaluating many resources
#[derive(Debug, Clone)]
pub struct ConditionMatcher<'a> {
    conditions: &'a PolicyConditions,
    name: NameMatch,
}

#[derive(Debug, Clone)]
enum NameMatch {
    Any,
    Pattern(Regex),
    Nothing,
}

impl<'a> ConditionMatcher<'a> {
    pub fn new(conditions: &'a PolicyConditions) -> Self {
        let name = match &conditions.name_pattern {
            None => NameMatch::Any,
            Some(pattern) => match glob_to_regex(pattern) {
                Ok(re) => NameMatch::Pattern(re),
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "Ignoring uncompilable name pattern");
                    NameMatch::Nothing
                }
            },
        };
        Self { conditions, name }
    }

    /// Conjunction of every present condition. `excluded_tags` is checked first and vetoes the rest.
    pub fn matches(&self, resource: &Resource, now: DateTime<Utc>) -> bool {
        let conditions = self.conditions;
        let excluded = conditions
            .excluded_tags
            .iter()
            .any(|(key, value)| resource.tags.get(key) == Some(value));
        if excluded {
            return false;
        }

        if let Some(days) = conditions.unused_days {
            if resource.status != ResourceStatus::Unused {
                return false;
            }
            if now - resource.last_seen_at < Duration::days(i64::from(days)) {
                return false;
            }
        }

        if let Some(min) = conditions.min_monthly_cost {
            if resource.monthly_cost < min {
                return false;
            }
        }

        if let Some(max) = conditions.max_monthly_cost {
            if resource.monthly_cost > max {
                return false;
            }
        }

        let has_required = conditions
            .required_tags
            .iter()
            .all(|(key, value)| resource.tags.get(key) == Some(value));
        if !has_required {
            return false;
        }

        if !conditions.regions.is_empty() && !conditions.regions.contains(&resource.region) {
            return false;
        }

        match &self.name {
            NameMatch::Any => true,
            NameMatch::Pattern(re) => re.is_match(&resource.name),
            NameMatch::Nothing => false,
        }
    }
}

/// A policy prepared for evaluation over an inventory
#[derive(Debug, Clone)]
pub struct PolicyMatcher<'a> {
    policy: &'a Policy,
    conditions: ConditionMatcher<'a>,
}

impl<'a> PolicyMatcher<'a> {
    pub fn new(policy: &'a Policy) -> Self {
        Self {
            policy,
            conditions: ConditionMatcher::new(&policy.conditions),
        }
    }

    pub fn applies(&self, resource: &Resource, now: DateTime<Utc>) -> bool {
        self.policy.is_enabled
            && self.policy.applies_to(resource.provider, resource.resource_type)
            && self.conditions.matches(resource, now)
    }
}

/// Single-resource form of [`ConditionMatcher::matches`]
pub fn matches(resource: &Resource, conditions: &PolicyConditions, now: DateTime<Utc>) -> bool {
    ConditionMatcher::new(conditions).matches(resource, now)
}

/// Enabled, same provider, type in scope, and conditions satisfied
pub fn applies(policy: &Policy, resource: &Resource, now: DateTime<Utc>) -> bool {
    PolicyMatcher::new(policy).applies(resource, now)
}

/// Union of the actions of every applicable policy, deduplicated in first-seen order
pub fn applicable_actions(
    policies: &[Policy],
    resource: &Resource,
    now: DateTime<Utc>,
) -> Vec<PolicyAction> {
    let mut actions = Vec::new();
    for policy in policies.iter().filter(|p| applies(p, resource, now)) {
        for action in &policy.actions {
            if !actions.contains(action) {
                actions.push(*action);
            }
        }
    }
    actions
}

/// The first policy, in the given order, that applies
pub fn first_match<'a>(
    policies: &'a [Policy],
    resource: &Resource,
    now: DateTime<Utc>,
) -> Option<&'a Policy> {
    policies.iter().find(|p| applies(p, resource, now))
}
