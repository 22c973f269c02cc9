//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// `ENTITY_TYPE` is the stable tag written into audit entries for this kind of
/// resource (e.g. `"user"`).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Stable resource-kind tag.
    const ENTITY_TYPE: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// An entity whose state can be captured into the audit trail.
///
/// The snapshot is a dedicated type rather than the entity itself so that
/// secrets (password hashes, tokens) are excluded by construction.
pub trait Auditable: Entity {
    type Snapshot: serde::Serialize;

    fn snapshot(&self) -> Self::Snapshot;
}
