//! Diversity rebalancing across assessment categories.
//!
//! Vector search alone tends to return one category for mixed queries
//! ("Java developer who can collaborate" retrieves ten knowledge tests).
//! When the query signals that multiple skill types matter, this stage
//! redistributes the over-fetched candidate set across the categories
//! present, by quota, before the final score sort.
//!
//! ## Algorithm
//! 1. Group candidates by test type, preserving per-group score order
//! 2. Detect the balance signal from trigger phrases in the query
//! 3. If balanced and more than one category is present:
//!    a. Order categories by the priority table, then first-encounter order
//!    b. Split `k` slots evenly; the first `k % n` categories get one extra
//!    c. Take each category's top candidates up to its quota (no backfill)
//!    d. Re-sort the selection by score descending and truncate to `k`
//! 4. Otherwise return the top `k` of the already-sorted input

use catalog::TestType;
use embedding::Candidate;
use tracing::debug;

/// Candidates are over-fetched at `3k` so every category has enough
/// depth to fill its quota.
pub const OVERFETCH_FACTOR: usize = 3;

/// Phrases whose presence in the lower-cased query marks it as spanning
/// multiple skill types. Substring matches, exactly as detected by the
/// product ("sand" contains "and"); tightening this is a product call.
pub const BALANCE_TRIGGERS: &[&str] = &[
    "and",
    "also",
    "both",
    "along with",
    "as well as",
    "good communication",
    "soft skill",
    "collaborate",
    "team",
];

/// One row of the category priority table.
struct PriorityRule {
    test_type: TestType,
    /// Include this category only while fewer than this many categories
    /// have been chosen. `None` means always include when present.
    only_while_fewer_than: Option<usize>,
}

/// Hand-tuned inclusion order for balanced queries: knowledge and
/// personality first (the technical + soft-skill case), cognitive and
/// situational only as second picks. Kept as data so the ordering can be
/// tuned without touching the algorithm; categories not listed here join
/// in first-encounter order.
const CATEGORY_PRIORITY: &[PriorityRule] = &[
    PriorityRule {
        test_type: TestType::Knowledge,
        only_while_fewer_than: None,
    },
    PriorityRule {
        test_type: TestType::Personality,
        only_while_fewer_than: None,
    },
    PriorityRule {
        test_type: TestType::Cognitive,
        only_while_fewer_than: Some(2),
    },
    PriorityRule {
        test_type: TestType::Situational,
        only_while_fewer_than: Some(2),
    },
];

/// Rebalances an over-fetched candidate set across test types.
#[derive(Debug, Default, Clone)]
pub struct DiversityReranker;

impl DiversityReranker {
    pub fn new() -> Self {
        Self
    }

    /// True iff the query contains at least one balance trigger phrase.
    pub fn requires_balance(&self, query: &str) -> bool {
        let lowered = query.to_lowercase();
        BALANCE_TRIGGERS.iter().any(|t| lowered.contains(t))
    }

    /// Reduce `candidates` (sorted by score descending) to at most `k`,
    /// balanced across categories when the query asks for it.
    pub fn rebalance(&self, candidates: Vec<Candidate>, k: usize, query: &str) -> Vec<Candidate> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let groups = group_by_type(&candidates);
        let balance = self.requires_balance(query);

        if !balance || groups.len() < 2 {
            debug!(
                "Diversity pass-through: balance={}, categories={}",
                balance,
                groups.len()
            );
            let mut top = candidates;
            top.truncate(k);
            return top;
        }

        let ordered = priority_order(&groups);
        let per_type = k / ordered.len();
        let remainder = k % ordered.len();
        debug!(
            "Balancing {} candidates over {:?}: per_type={}, remainder={}",
            candidates.len(),
            ordered,
            per_type,
            remainder
        );

        let mut selected: Vec<Candidate> = Vec::with_capacity(k);
        for (i, test_type) in ordered.iter().enumerate() {
            let quota = per_type + usize::from(i < remainder);
            let group = groups
                .iter()
                .find(|(tt, _)| tt == test_type)
                .map(|(_, members)| members.as_slice())
                .unwrap_or(&[]);
            // A short group simply under-fills its quota; no backfill
            selected.extend(group.iter().take(quota).map(|&c| c.clone()));
        }

        // Stable sort keeps the priority-order concatenation for ties
        selected.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        selected.truncate(k);
        selected
    }
}

/// Group candidates by test type, first-encounter group order, each
/// group keeping the input's descending score order.
fn group_by_type(candidates: &[Candidate]) -> Vec<(TestType, Vec<&Candidate>)> {
    let mut groups: Vec<(TestType, Vec<&Candidate>)> = Vec::new();
    for candidate in candidates {
        let test_type = candidate.assessment.test_type;
        match groups.iter_mut().find(|(tt, _)| *tt == test_type) {
            Some((_, members)) => members.push(candidate),
            None => groups.push((test_type, vec![candidate])),
        }
    }
    groups
}

/// Categories to include, in quota-assignment order: the priority table
/// first, then any remaining present categories as first encountered.
fn priority_order(groups: &[(TestType, Vec<&Candidate>)]) -> Vec<TestType> {
    let present = |tt: TestType| groups.iter().any(|(g, _)| *g == tt);

    let mut ordered: Vec<TestType> = Vec::new();
    for rule in CATEGORY_PRIORITY {
        if let Some(limit) = rule.only_while_fewer_than {
            if ordered.len() >= limit {
                continue;
            }
        }
        if present(rule.test_type) && !ordered.contains(&rule.test_type) {
            ordered.push(rule.test_type);
        }
    }
    for (test_type, _) in groups {
        if !ordered.contains(test_type) {
            ordered.push(*test_type);
        }
    }
    ordered
}
