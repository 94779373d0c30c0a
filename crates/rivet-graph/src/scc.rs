//! Tarjan's strongly-connected-components algorithm
//!
//! Iterative rendition: an explicit work stack replaces the recursion so deep
//! dependency chains cannot overflow the call stack.

use crate::graph::Vertex;

/// Per-vertex bookkeeping, fresh for every run
#[derive(Debug, Clone, Copy, Default)]
struct VisitState {
    index: Option<usize>,
    low_link: usize,
    on_stack: bool,
}

struct Frame {
    vertex: usize,
    cursor: usize,
}

/// Computes every strongly connected component of the graph.
///
/// Roots are taken in vertex insertion order and successors are explored
/// from the most recently declared one backwards, which keeps the output
/// (and therefore error messages) stable for a given registration sequence.
pub(crate) fn strongly_connected_components(vertices: &[Vertex]) -> Vec<Vec<usize>> {
    let mut state = vec![VisitState::default(); vertices.len()];
    let mut next_index = 0;
    let mut stack: Vec<usize> = Vec::new();
    let mut components = Vec::new();

    let mut begin = |v: usize, state: &mut [VisitState], stack: &mut Vec<usize>| {
        state[v].index = Some(next_index);
        state[v].low_link = next_index;
        state[v].on_stack = true;
        next_index += 1;
        stack.push(v);
    };

    for root in 0..vertices.len() {
        if state[root].index.is_some() {
            continue;
        }

        begin(root, &mut state, &mut stack);
        let mut work = vec![Frame {
            vertex: root,
            cursor: 0,
        }];

        while let Some(frame) = work.last_mut() {
            let v = frame.vertex;
            let successors = &vertices[v].successors;

            if frame.cursor < successors.len() {
                let w = successors[successors.len() - 1 - frame.cursor];
                frame.cursor += 1;

                match state[w].index {
                    None => {
                        begin(w, &mut state, &mut stack);
                        work.push(Frame {
                            vertex: w,
                            cursor: 0,
                        });
                    }
                    Some(w_index) if state[w].on_stack => {
                        state[v].low_link = state[v].low_link.min(w_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            work.pop();
            if let Some(parent) = work.last() {
                let p = parent.vertex;
                state[p].low_link = state[p].low_link.min(state[v].low_link);
            }

            if state[v].index == Some(state[v].low_link) {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    state[w].on_stack = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                components.push(component);
            }
        }
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertices(edges: &[&[usize]]) -> Vec<Vertex> {
        edges
            .iter()
            .enumerate()
            .map(|(i, succ)| Vertex {
                key: format!("v{}", i),
                successors: succ.to_vec(),
            })
            .collect()
    }

    #[test]
    fn test_acyclic_graph_yields_singletons() {
        let graph = vertices(&[&[1], &[2], &[]]);
        let components = strongly_connected_components(&graph);
        assert_eq!(components.len(), 3);
        assert!(components.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn test_three_cycle_is_one_component() {
        let graph = vertices(&[&[1], &[2], &[0]]);
        let components = strongly_connected_components(&graph);
        assert_eq!(components.len(), 1);
        let mut members = components[0].clone();
        members.sort();
        assert_eq!(members, vec![0, 1, 2]);
    }

    #[test]
    fn test_two_disjoint_cycles() {
        let graph = vertices(&[&[1], &[0], &[3], &[2], &[]]);
        let cycles: Vec<_> = strongly_connected_components(&graph)
            .into_iter()
            .filter(|c| c.len() > 1)
            .collect();
        assert_eq!(cycles.len(), 2);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let n = 50_000;
        let graph: Vec<Vertex> = (0..n)
            .map(|i| Vertex {
                key: i.to_string(),
                successors: if i + 1 < n { vec![i + 1] } else { vec![] },
            })
            .collect();
        let components = strongly_connected_components(&graph);
        assert_eq!(components.len(), n);
    }
}
