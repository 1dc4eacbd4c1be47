//! Set-merge combinators over weighted result lists
//!
//! Within one operand a repeated id counts once, with its weights summed.
//! Output order follows first appearance across the operands.

use std::hash::Hash;

use indexmap::IndexMap;

use crate::query::Hit;

fn weights<Id: Eq + Hash + Clone>(hits: &[Hit<Id>]) -> IndexMap<Id, f64> {
    let mut map = IndexMap::with_capacity(hits.len());
    for hit in hits {
        *map.entry(hit.id.clone()).or_insert(0.0) += hit.weight;
    }
    map
}

fn into_hits<Id>(map: IndexMap<Id, f64>) -> Vec<Hit<Id>> {
    map.into_iter().map(|(id, weight)| Hit { id, weight }).collect()
}

/// Ids present in every operand, weighted by the sum across operands
pub fn intersection<Id: Eq + Hash + Clone>(operands: &[Vec<Hit<Id>>]) -> Vec<Hit<Id>> {
    let Some((first, others)) = operands.split_first() else {
        return Vec::new();
    };
    let others: Vec<IndexMap<Id, f64>> = others.iter().map(|hits| weights(hits)).collect();
    let mut merged = weights(first);
    merged.retain(|id, weight| {
        for other in &others {
            match other.get(id) {
                Some(w) => *weight += w,
                None => return false,
            }
        }
        true
    });
    into_hits(merged)
}

/// Every id from any operand, weighted by the sum across operands
pub fn union<Id: Eq + Hash + Clone>(operands: &[Vec<Hit<Id>>]) -> Vec<Hit<Id>> {
    let mut merged = IndexMap::new();
    for hits in operands {
        for hit in hits {
            *merged.entry(hit.id.clone()).or_insert(0.0) += hit.weight;
        }
    }
    into_hits(merged)
}

/// Entries of `left` whose id does not occur in `right`, weights untouched
pub fn exclude<Id: Eq + Hash>(left: Vec<Hit<Id>>, right: &[Hit<Id>]) -> Vec<Hit<Id>> {
    let removed: std::collections::HashSet<&Id> = right.iter().map(|hit| &hit.id).collect();
    left.into_iter()
        .filter(|hit| !removed.contains(&hit.id))
        .collect()
}
