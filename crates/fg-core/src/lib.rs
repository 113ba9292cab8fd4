//! Exact inference over discrete factor graphs.
//!
//! This library provides:
//! - Random variables, edges and dense factor tables with their algebra
//!   (evidence reduction, product, sum- and max-marginalisation)
//! - Validated models that own their variables in an id-keyed arena
//! - Variable elimination with pluggable ordering heuristics
//! - Most probable explanation by max-product elimination
//! - JSON model documents, TOML engine configuration and logging setup
//!
//! The `fg` binary in `main.rs` wraps these for the command line.

pub mod assignment;
pub mod config;
pub mod document;
pub mod edge;
pub mod elimination;
pub mod error;
pub mod exit_codes;
pub mod factor;
pub mod id;
pub mod logging;
pub mod model;
pub mod mpe;
pub mod ordering;
pub mod value;
pub mod variable;

pub use assignment::Assignment;
pub use config::{ConfigSource, EngineConfig};
pub use document::ModelDocument;
pub use edge::{Edge, EdgeKind};
pub use elimination::{infer, Inference, Posterior, PosteriorRow, VariableElimination};
pub use error::{Error, ErrorCategory, ErrorReport, Result};
pub use factor::{Factor, MAX_TABLE_LEN};
pub use id::{FactorId, VarId};
pub use model::Model;
pub use mpe::{most_probable_explanation, Mpe};
pub use ordering::{EliminationOrdering, FixedOrder, InteractionGraph, OrderingHeuristic};
pub use value::Value;
pub use variable::RandomVariable;
