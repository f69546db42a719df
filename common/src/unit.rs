//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing an entity modification.
#[derive(Clone, Copy, Debug)]
pub struct Modification;

/// Marker type describing an entity finalization.
#[derive(Clone, Copy, Debug)]
pub struct Finalization;

/// Marker type describing a signing act.
#[derive(Clone, Copy, Debug)]
pub struct Signing;

/// Marker type describing an entity deletion.
#[derive(Clone, Copy, Debug)]
pub struct Deletion;
