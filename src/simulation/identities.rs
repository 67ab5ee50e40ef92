//! Identity-only stand-ins for entities which are owned by the host simulation. The energy core
//! never sees links, persons or facilities. It only stores and forwards their ids, so these types
//! exist to give [`Id`](crate::simulation::id::Id) a distinct type parameter for each of them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Person;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Facility;
