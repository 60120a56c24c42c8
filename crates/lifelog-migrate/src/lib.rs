//! # lifelog-migrate
//!
//! Transparent field-presence migrations for [`lifelog`] records.
//!
//! Old releases stored one goal per category as a lone string plus a lone
//! flag. Current releases store a list of goals plus a parallel list of
//! flags. Records in storage may be in either shape, and the reader must
//! never see the old one.
//!
//! ## How It Works
//!
//! 1. Each category is a [`FieldGroup`]: the names of its legacy and current fields.
//! 2. A record is classified per group into a [`GroupShape`]: `Current`, `Mixed`, `Legacy` or `Absent`.
//! 3. [`ScalarToList`] turns `Legacy` and `Mixed` into `Current` and deletes the legacy keys.
//! 4. The [`MigrationEngine`] runs the steps over a whole collection and
//!    reports whether anything changed, so the caller writes back at most once.
//!
//! ## Key Concepts
//!
//! - **Lazy migration**: records are migrated on read, not in a batch job.
//! - **Idempotent**: legacy keys are removed, so a migrated record is never migrated again.
//! - **Current wins**: when a record holds both shapes for a group, the lists are kept
//!   and the legacy keys are dropped.

mod engine;
mod shape;

pub use engine::{MigrationConfig, MigrationEngine, MigrationError, MigrationReport, MigrationStep, ScalarToList};
pub use shape::{FieldGroup, GroupShape, GOAL_GROUPS};
