//! Cycle detection
//!
//! `find_cycles` runs an iterative depth-first search with white/gray/black
//! colouring. Every back edge into a gray node closes one cycle: the slice
//! of the DFS path from that node to the top of the stack. A cycle whose
//! closing edge lands on a black node is invisible to the DFS, so each
//! member of a tangle also gets a breadth-first search for its shortest
//! way back to itself. Start nodes and neighbours are visited in
//! lexicographic order, so the output is reproducible.

use petgraph::algo::tarjan_scc;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

use super::DependencyGraph;
use crate::error::AnalysisError;
use crate::pipeline::CancellationToken;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Gray,
    Black,
}

/// Rotate a cycle so it starts with its smallest member
pub fn normalize_cycle(cycle: &[String]) -> Vec<String> {
    if cycle.is_empty() {
        return vec![];
    }

    let min_idx = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| *v)
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut normalized = Vec::with_capacity(cycle.len());
    normalized.extend_from_slice(&cycle[min_idx..]);
    normalized.extend_from_slice(&cycle[..min_idx]);
    normalized
}

/// Find the cycles closed by back edges during a sorted DFS, followed by
/// the shortest cycle through each member of every tangle.
///
/// Cycles are normalised, de-duplicated and returned in discovery order.
/// The token is checked between search steps.
pub fn find_cycles(
    graph: &DependencyGraph,
    cancel: &CancellationToken,
) -> Result<Vec<Vec<String>>, AnalysisError> {
    let adjacency = graph.sorted_adjacency();
    let position: FxHashMap<&str, usize> = adjacency
        .iter()
        .enumerate()
        .map(|(i, (name, _))| (*name, i))
        .collect();
    let successors: Vec<Vec<usize>> = adjacency
        .iter()
        .map(|(_, targets)| targets.iter().filter_map(|t| position.get(t).copied()).collect())
        .collect();

    let mut colour = vec![Colour::White; adjacency.len()];
    let mut cycles = Vec::new();
    let mut seen: FxHashSet<Vec<String>> = FxHashSet::default();

    // (node, index of the next successor to explore)
    let mut stack: Vec<(usize, usize)> = Vec::new();
    // position of each gray node on the stack
    let mut on_stack: FxHashMap<usize, usize> = FxHashMap::default();

    for start in 0..adjacency.len() {
        if colour[start] != Colour::White {
            continue;
        }
        colour[start] = Colour::Gray;
        on_stack.insert(start, 0);
        stack.push((start, 0));

        while let Some(frame) = stack.last_mut() {
            cancel.check()?;
            let (node, next) = *frame;

            if next < successors[node].len() {
                frame.1 += 1;
                let succ = successors[node][next];
                match colour[succ] {
                    Colour::White => {
                        colour[succ] = Colour::Gray;
                        on_stack.insert(succ, stack.len());
                        stack.push((succ, 0));
                    }
                    Colour::Gray => {
                        let from = on_stack[&succ];
                        let cycle: Vec<String> = stack[from..]
                            .iter()
                            .map(|(n, _)| adjacency[*n].0.to_string())
                            .collect();
                        let normalized = normalize_cycle(&cycle);
                        if seen.insert(normalized.clone()) {
                            cycles.push(normalized);
                        }
                    }
                    Colour::Black => {}
                }
            } else {
                colour[node] = Colour::Black;
                on_stack.remove(&node);
                stack.pop();
            }
        }
    }

    for component in tangles(graph) {
        let members: FxHashSet<usize> = component
            .iter()
            .filter_map(|name| position.get(name.as_str()).copied())
            .collect();
        let mut sorted: Vec<usize> = members.iter().copied().collect();
        sorted.sort_unstable();
        for start in sorted {
            if let Some(path) = shortest_return(start, &successors, &members, cancel)? {
                let cycle: Vec<String> = path
                    .iter()
                    .map(|&n| adjacency[n].0.to_string())
                    .collect();
                let normalized = normalize_cycle(&cycle);
                if seen.insert(normalized.clone()) {
                    cycles.push(normalized);
                }
            }
        }
    }

    Ok(cycles)
}

/// Shortest path from `start` back to itself inside `members`, as the
/// list of nodes starting with `start`
fn shortest_return(
    start: usize,
    successors: &[Vec<usize>],
    members: &FxHashSet<usize>,
    cancel: &CancellationToken,
) -> Result<Option<Vec<usize>>, AnalysisError> {
    let mut parent: FxHashMap<usize, usize> = FxHashMap::default();
    let mut queue = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
        cancel.check()?;
        for &succ in &successors[node] {
            if succ == start {
                let mut path = vec![node];
                let mut current = node;
                while let Some(&prev) = parent.get(&current) {
                    path.push(prev);
                    current = prev;
                }
                path.reverse();
                return Ok(Some(path));
            }
            if members.contains(&succ) && !parent.contains_key(&succ) {
                parent.insert(succ, node);
                queue.push_back(succ);
            }
        }
    }
    Ok(None)
}

/// Strongly connected components with more than one node, each sorted,
/// ordered by their first member
pub fn tangles(graph: &DependencyGraph) -> Vec<Vec<String>> {
    let inner = graph.inner();
    let mut out: Vec<Vec<String>> = tarjan_scc(inner)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut names: Vec<String> = scc.iter().map(|&i| inner[i].name.clone()).collect();
            names.sort();
            names
        })
        .collect();
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::graph_of;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_three_node_ring() {
        let g = graph_of(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("C", "A")]);
        let cycles = find_cycles(&g, &CancellationToken::new()).unwrap();
        assert_eq!(cycles, vec![names(&["A", "B", "C"])]);
    }

    #[test]
    fn test_chord_yields_shorter_cycle() {
        // A->C closes on a node the DFS has already finished
        let g = graph_of(
            &["A", "B", "C"],
            &[("A", "B"), ("B", "C"), ("C", "A"), ("A", "C")],
        );
        let cycles = find_cycles(&g, &CancellationToken::new()).unwrap();
        assert_eq!(cycles, vec![names(&["A", "B", "C"]), names(&["A", "C"])]);
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let g = graph_of(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")],
        );
        assert!(find_cycles(&g, &CancellationToken::new()).unwrap().is_empty());
        assert!(tangles(&g).is_empty());
    }

    #[test]
    fn test_two_separate_cycles_in_discovery_order() {
        let g = graph_of(
            &["A", "B", "X", "Y", "Z"],
            &[("X", "Y"), ("Y", "X"), ("A", "B"), ("B", "A"), ("B", "Z")],
        );
        let cycles = find_cycles(&g, &CancellationToken::new()).unwrap();
        assert_eq!(cycles, vec![names(&["A", "B"]), names(&["X", "Y"])]);
    }

    #[test]
    fn test_cycle_rotation_is_normalised() {
        // DFS from A reaches C first via A->C, then C->B->C closes at C
        let g = graph_of(&["A", "B", "C"], &[("A", "C"), ("C", "B"), ("B", "C")]);
        let cycles = find_cycles(&g, &CancellationToken::new()).unwrap();
        assert_eq!(cycles, vec![names(&["B", "C"])]);
    }

    #[test]
    fn test_tangles_group_scc() {
        let g = graph_of(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("B", "C"), ("C", "A"), ("C", "D")],
        );
        assert_eq!(tangles(&g), vec![names(&["A", "B", "C"])]);
    }

    #[test]
    fn test_cancellation_stops_search() {
        let g = graph_of(&["A", "B"], &[("A", "B"), ("B", "A")]);
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(find_cycles(&g, &token), Err(AnalysisError::Cancelled)));
    }

    #[test]
    fn test_normalize_cycle() {
        assert_eq!(normalize_cycle(&names(&["C", "A", "B"])), names(&["A", "B", "C"]));
        assert!(normalize_cycle(&[]).is_empty());
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let names_owned: Vec<String> = (0..20_000).map(|i| format!("n{:05}", i)).collect();
        let refs: Vec<&str> = names_owned.iter().map(String::as_str).collect();
        let pairs: Vec<(&str, &str)> = refs.windows(2).map(|w| (w[0], w[1])).collect();
        let g = graph_of(&refs, &pairs);
        assert!(find_cycles(&g, &CancellationToken::new()).unwrap().is_empty());
    }
}
