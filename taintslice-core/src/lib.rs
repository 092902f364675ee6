//! Taintslice core - pattern-driven cross-file taint slicing
//!
//! This crate locates the function enclosing a target file/line,
//! builds whole-project function-definition and call-site indices,
//! scans for configured source/sink patterns, resolves file-inclusion
//! dependencies, and stitches all of it into cross-file taint paths
//! and function call chains.
//!
//! Structural recovery is heuristic: function boundaries, call sites
//! and inclusion directives are recognized with regular expressions,
//! not a real parser. Matches inside strings or comments are counted;
//! this is a documented limitation of the approach, not a defect.
//! Taint transit is approximated via direct (one-hop) file-inclusion
//! adjacency rather than true data flow.
//!
//! Every invocation derives its indices fresh from the file tree; no
//! state survives a run.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::use_cases::{SliceAnalysisUseCase, SliceError, SliceRequest};
pub use domain::entities::{AnalysisReport, FunctionChain};
pub use domain::patterns::{PatternConfig, PatternSet};
