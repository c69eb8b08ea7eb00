//! Domain model: groups, members, and the ports the engine talks through.

pub mod group;
pub mod member;
pub mod ports;
