// src/services/core/ledger/presence.rs

use crate::types::MemberId;
use std::collections::HashSet;

/// Whether a stored member is still in the guild. Records are never deleted,
/// so name lookups must skip members who have left.
pub trait Presence {
    fn is_present(&self, member_id: MemberId) -> bool;
}

/// Treats every stored member as present.
#[derive(Debug, Clone, Copy, Default)]
pub struct Everyone;

impl Presence for Everyone {
    fn is_present(&self, _member_id: MemberId) -> bool {
        true
    }
}

impl Presence for HashSet<MemberId> {
    fn is_present(&self, member_id: MemberId) -> bool {
        self.contains(&member_id)
    }
}

/// Adapts a predicate, typically a lookup into the platform's member cache.
#[derive(Debug, Clone, Copy)]
pub struct PresentIf<F>(pub F);

impl<F> Presence for PresentIf<F>
where
    F: Fn(MemberId) -> bool,
{
    fn is_present(&self, member_id: MemberId) -> bool {
        (self.0)(member_id)
    }
}
