//! Rule-driven editing engine for telemetry snapshots.
//!
//! This crate contains the fundamental types and logic for:
//! - Entries: data points and atomically captured data groups
//! - Namespace indexing: per-source grouping and timeline normalization
//! - Series operations: trim, span, scale, bound, insert, rename, copy
//! - Rules: parsing rule documents and interpreting them per source
//! - Coordination: merging processed sources into one ordered output

mod coordinator;
pub mod entry;
mod error;
pub mod index;
pub mod interpreter;
pub mod pattern;
pub mod rules;
mod series;
pub mod value;

pub use coordinator::MergeCoordinator;
pub use entry::{DataGroup, DataPoint, Entry};
pub use error::EditError;
pub use index::{InsertTime, NamespaceIndex, merge_entries};
pub use interpreter::{ApplyReport, SourcePlan, apply_source, plan_source};
pub use rules::{RuleDocument, RuleNode};
