//! Application layer containing the group rotation orchestration.
//!
//! This module defines the `RotationEngine`, the primary entry point for
//! creating groups and recording contributions. It serializes writers per
//! group and commits each transition through the `GroupStore` port.

pub mod engine;
pub mod retry;
