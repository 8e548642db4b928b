//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Host records (purchases, lines, ledger lines) are identified by id; two
/// snapshots with the same id describe the same row at different times.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

