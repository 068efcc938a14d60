//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing an entity deletion.
#[derive(Clone, Copy, Debug)]
pub struct Deletion;

/// Marker type describing an entity start.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker type describing an entity ending.
#[derive(Clone, Copy, Debug)]
pub struct End;
