//! vanguard-core — Domain model for the Vanguard visitor kiosk.
//!
//! Identities extracted from scanned documents, issued visitor passes,
//! and the static campus geography (destinations, purposes, premise map).
//! Pure data and logic; no I/O.

pub mod analytics;
pub mod campus;
pub mod identity;
pub mod visitor;

pub use identity::{DocType, ExtractedIdentity, ScanResult};
pub use visitor::{AccessType, PassStatus, Visitor, VisitorPersona};
