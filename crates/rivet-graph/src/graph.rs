//! Arena-backed directed graph of component keys

use std::collections::HashMap;
use std::fmt::Write as _;

use tracing::{debug, trace};

use crate::error::{GraphError, GraphResult};
use crate::scc::strongly_connected_components;

/// A vertex in the arena; successors are indices into the same arena
#[derive(Debug, Clone)]
pub(crate) struct Vertex {
    pub(crate) key: String,
    pub(crate) successors: Vec<usize>,
}

/// State needed to undo a single `add`
struct Checkpoint {
    vertex_count: usize,
    index: usize,
    previous: Option<Vec<usize>>,
}

/// Directed graph of component keys.
///
/// Vertices live in a `Vec` in insertion order and edges are plain indices, so
/// cloning the graph produces a fully independent copy.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    vertices: Vec<Vertex>,
    index: HashMap<String, usize>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertices, placeholders included
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the graph has no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Whether a vertex exists for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Declared dependencies of `key`, in declaration order
    pub fn successors(&self, key: &str) -> Vec<String> {
        self.index
            .get(key)
            .map(|&i| {
                self.vertices[i]
                    .successors
                    .iter()
                    .map(|&w| self.vertices[w].key.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Iterate over all keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vertices.iter().map(|v| v.key.as_str())
    }

    fn vertex_index(&mut self, key: &str) -> usize {
        if let Some(&i) = self.index.get(key) {
            return i;
        }

        let i = self.vertices.len();
        self.vertices.push(Vertex {
            key: key.to_string(),
            successors: Vec::new(),
        });
        self.index.insert(key.to_string(), i);
        i
    }

    /// Upsert `key` with the given dependencies.
    ///
    /// Dependencies without a vertex get a placeholder. Re-adding a key replaces
    /// its successor list.
    pub fn add<I, S>(&mut self, key: &str, dependencies: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_inner(key, dependencies);
        self
    }

    fn add_inner<I, S>(&mut self, key: &str, dependencies: I) -> Checkpoint
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vertex_count = self.vertices.len();
        let successors: Vec<usize> = dependencies
            .into_iter()
            .map(|dep| self.vertex_index(dep.as_ref()))
            .collect();

        let previous = self.index.get(key).map(|&i| self.vertices[i].successors.clone());
        let index = self.vertex_index(key);

        trace!(key, dependencies = successors.len(), "graph: add vertex");
        self.vertices[index].successors = successors;

        Checkpoint {
            vertex_count,
            index,
            previous,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        if let Some(previous) = checkpoint.previous {
            self.vertices[checkpoint.index].successors = previous;
        }

        for removed in self.vertices.drain(checkpoint.vertex_count..) {
            self.index.remove(&removed.key);
        }
    }

    /// Add `key` and fail if the graph now contains any cycle.
    ///
    /// On failure the graph is restored to its state before the call.
    pub fn add_and_verify<I, S>(&mut self, key: &str, dependencies: I) -> GraphResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let checkpoint = self.add_inner(key, dependencies);
        let cycles = self.cycles();
        if !cycles.is_empty() {
            debug!(key, cycles = cycles.len(), "graph: rejecting cyclic edge set");
            self.restore(checkpoint);
            return Err(GraphError::Cycles(cycles));
        }

        Ok(self)
    }

    /// All strongly connected components, as lists of keys
    pub fn strongly_connected_components(&self) -> Vec<Vec<String>> {
        strongly_connected_components(&self.vertices)
            .into_iter()
            .map(|component| {
                component
                    .into_iter()
                    .map(|i| self.vertices[i].key.clone())
                    .collect()
            })
            .collect()
    }

    /// Components with more than one member
    pub fn cycles(&self) -> Vec<Vec<String>> {
        self.strongly_connected_components()
            .into_iter()
            .filter(|component| component.len() > 1)
            .collect()
    }

    pub fn has_cycle(&self) -> bool {
        !self.cycles().is_empty()
    }

    /// Pre-order depth-first walk from `key`, excluding `key` itself.
    ///
    /// Unknown keys have no descendants.
    pub fn descendants(&self, key: &str) -> Vec<String> {
        let Some(&start) = self.index.get(key) else {
            return Vec::new();
        };

        let mut visited = vec![false; self.vertices.len()];
        let mut stack = vec![start];
        let mut descendants = Vec::new();

        while let Some(v) = stack.pop() {
            if visited[v] {
                continue;
            }
            visited[v] = true;
            if v != start {
                descendants.push(self.vertices[v].key.clone());
            }

            // reversed so the first declared dependency is visited first
            stack.extend(self.vertices[v].successors.iter().rev());
        }

        descendants
    }

    /// Graphviz rendering; vertices taking part in a cycle are grouped in red clusters
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph {\n");

        for (i, cycle) in self.cycles().iter().enumerate() {
            let _ = writeln!(out, "  subgraph cluster{} {{", i);
            out.push_str("    color=red;\n");
            let _ = writeln!(out, "    {};", cycle.join("; "));
            out.push_str("  }\n");
        }

        for vertex in &self.vertices {
            for &w in vertex.successors.iter().rev() {
                let _ = writeln!(out, "  {} -> {}", vertex.key, self.vertices[w].key);
            }
        }

        out.push_str("}\n");
        out
    }
}
