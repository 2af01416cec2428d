//! Deterministic roster partitioning
//!
//! Splits the persona roster into disjoint groups of a target size. The
//! remainder (fewer personas than a full group) is distributed round-robin
//! across the existing groups instead of forming an undersized group.
//! The result is a pure function of roster order and `group_size`, so
//! identical inputs always produce identical groups.

use crate::core::error::DomainError;
use crate::group::entities::{DiscussionGroup, GroupId};
use crate::lesson::PlanId;
use crate::persona::Persona;

/// Partition `personas` into groups of `group_size` for `plan_id`.
///
/// Group ids are assigned 1..n in creation order. With fewer personas than
/// `group_size`, a single smaller group is formed rather than failing.
pub fn partition_roster(
    personas: &[Persona],
    group_size: usize,
    plan_id: &PlanId,
) -> Result<Vec<DiscussionGroup>, DomainError> {
    if personas.is_empty() {
        return Err(DomainError::EmptyRoster);
    }
    if group_size == 0 {
        return Err(DomainError::InvalidGroupSize);
    }

    let full_groups = personas.len() / group_size;
    if full_groups == 0 {
        // Not enough personas for one full group: one undersized group.
        let members = personas.iter().map(|p| p.id.clone()).collect();
        return Ok(vec![DiscussionGroup::new(
            GroupId::new(1),
            plan_id.clone(),
            members,
        )]);
    }

    let mut buckets: Vec<Vec<_>> = personas
        .chunks(group_size)
        .take(full_groups)
        .map(|chunk| chunk.iter().map(|p| p.id.clone()).collect())
        .collect();

    // Remainder personas join existing groups round-robin.
    let remainder = &personas[full_groups * group_size..];
    for (i, persona) in remainder.iter().enumerate() {
        buckets[i % full_groups].push(persona.id.clone());
    }

    Ok(buckets
        .into_iter()
        .enumerate()
        .map(|(i, members)| {
            DiscussionGroup::new(GroupId::new(i as i64 + 1), plan_id.clone(), members)
        })
        .collect())
}
