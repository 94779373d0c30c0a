//! Error types for graph operations

use thiserror::Error;

/// Errors raised while mutating the dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// One or more dependency cycles were detected.
    ///
    /// Each inner list holds the members of one strongly connected component,
    /// in the order they were popped off the Tarjan stack.
    #[error("{}", describe_cycles(.0))]
    Cycles(Vec<Vec<String>>),
}

impl GraphError {
    /// The cycles carried by this error
    pub fn cycles(&self) -> &[Vec<String>] {
        match self {
            GraphError::Cycles(cycles) => cycles,
        }
    }
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Renders cycles as `Detected 2 cycles:\n  a -> b -> a\n  c -> d -> c`
pub(crate) fn describe_cycles(cycles: &[Vec<String>]) -> String {
    let plural = if cycles.len() == 1 { "" } else { "s" };
    let lines = cycles
        .iter()
        .map(|members| {
            let first = members.first().map(String::as_str).unwrap_or_default();
            format!("  {} -> {}", members.join(" -> "), first)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("Detected {} cycle{}:\n{}", cycles.len(), plural, lines)
}
