//! Association Graph
//!
//! This module tracks relations between outside actors and the elements they
//! affect, for example which players contributed a buff to which frames.
//!
//! # Design Decisions
//!
//! 1. The relation is stored in both directions from the first insertion.
//!    Removing a sender or a target costs time proportional to its own
//!    associations, not to the size of the relation.
//!
//! 2. Both directions are updated inside the same call, so the two views
//!    agree at every point a caller can observe.
//!
//! 3. Entries are indexed with `indexmap` so iteration order is
//!    deterministic across runs.

mod index;

pub use index::AssociationIndex;
