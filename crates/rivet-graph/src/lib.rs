//! Dependency graph for the Rivet container
//!
//! Every type registration adds an edge set to a [`Graph`]: the registered key
//! points at the keys of its constructor parameters, and every alias points at
//! the key it forwards to. A registration is only accepted when the graph stays
//! acyclic, which is checked with Tarjan's strongly-connected-components
//! algorithm.
//!
//! ## Quick Start
//!
//! ```rust
//! use rivet_graph::Graph;
//!
//! let mut graph = Graph::new();
//! graph.add_and_verify("Foo", ["Bar"]).unwrap();
//! graph.add_and_verify("Bar", ["Baz"]).unwrap();
//!
//! let err = graph.add_and_verify("Baz", ["Foo"]).unwrap_err();
//! assert!(err.to_string().starts_with("Detected 1 cycle:"));
//!
//! // the rejected edge was rolled back
//! assert!(!graph.has_cycle());
//! ```

pub mod error;
pub mod graph;
mod scc;

pub use error::{GraphError, GraphResult};
pub use graph::Graph;
