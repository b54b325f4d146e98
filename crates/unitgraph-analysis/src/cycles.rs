//! Dependency cycle enumeration.
//!
//! # Algorithm
//!
//! Iterative depth-first search with three node colours:
//!
//! - **white**: not visited yet
//! - **grey**: on the current DFS stack
//! - **black**: finished
//!
//! Roots and neighbours are visited in identifier order. Whenever an edge
//! reaches a grey node, the stack suffix from that node to the current one
//! is a cycle. Each cycle is rotated to start at its lexicographically
//! smallest member, closed back to that member, and deduplicated by value.
//!
//! This reports every cycle closed by a DFS back edge, which covers every
//! strongly connected component but not every simple cycle inside a dense
//! component. Enumeration cost is bounded by `max_cycles`; hitting the cap
//! marks the search as truncated instead of running unbounded.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::{error::AnalysisError, topology::Topology};

const SECTION: &str = "cycles";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Grey,
    Black,
}

/// Outcome of a cycle search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSearch {
    /// Closed cycles (`[A, B, A]`), sorted.
    pub cycles: Vec<Vec<String>>,
    /// `true` when the search stopped at the cap with cycles left to report.
    pub truncated: bool,
}

/// Rotate a cycle to start at its smallest member and close it.
///
/// Accepts either the open body (`[B, C, A]`) or the closed form
/// (`[B, C, A, B]`) and always returns the closed form.
#[must_use]
pub fn canonicalize<T: Ord + Clone>(cycle: &[T]) -> Vec<T> {
    let body = match cycle {
        [first, .., last] if first == last => &cycle[..cycle.len() - 1],
        _ => cycle,
    };

    let Some(start) = body
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map(|(pos, _)| pos)
    else {
        return Vec::new();
    };

    let mut rotated: Vec<T> = Vec::with_capacity(body.len() + 1);
    rotated.extend_from_slice(&body[start..]);
    rotated.extend_from_slice(&body[..start]);
    rotated.push(body[start].clone());
    rotated
}

/// Enumerate distinct cycles, stopping after `max_cycles`.
///
/// # Errors
///
/// Returns [`AnalysisError::Invariant`] if a grey node is missing from the
/// DFS stack, which would mean the colour bookkeeping is corrupt.
#[instrument(skip(topo), fields(nodes = topo.len()))]
pub fn find_cycles(topo: &Topology<'_>, max_cycles: usize) -> Result<CycleSearch, AnalysisError> {
    let n = topo.len();
    let mut color = vec![Color::White; n];
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    let mut found: Vec<Vec<usize>> = Vec::new();
    let mut truncated = false;

    // Each frame: (node, index of the next successor to visit).
    let mut stack: Vec<(usize, usize)> = Vec::new();

    'roots: for root in 0..n {
        if color[root] != Color::White {
            continue;
        }
        color[root] = Color::Grey;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (node, pos) = *frame;
            let successors = topo.successors(node);

            let Some(&next) = successors.get(pos) else {
                stack.pop();
                color[node] = Color::Black;
                continue;
            };
            frame.1 += 1;

            match color[next] {
                Color::White => {
                    color[next] = Color::Grey;
                    stack.push((next, 0));
                }
                Color::Grey => {
                    let start = stack
                        .iter()
                        .rposition(|&(member, _)| member == next)
                        .ok_or_else(|| {
                            AnalysisError::invariant(
                                SECTION,
                                format!("grey node {} is not on the DFS stack", topo.id(next)),
                            )
                        })?;
                    let body: Vec<usize> = stack[start..].iter().map(|&(member, _)| member).collect();
                    let cycle = canonicalize(&body);

                    if seen.contains(&cycle) {
                        continue;
                    }
                    if found.len() >= max_cycles {
                        truncated = true;
                        break 'roots;
                    }
                    seen.insert(cycle.clone());
                    found.push(cycle);
                }
                Color::Black => {}
            }
        }
    }

    if truncated {
        warn!(max_cycles, "cycle enumeration stopped at cap");
    }

    // Interned ids follow identifier order, so sorting ids sorts names.
    found.sort_unstable();
    let cycles = found
        .into_iter()
        .map(|cycle| cycle.into_iter().map(|i| topo.id(i).to_string()).collect())
        .collect();

    Ok(CycleSearch { cycles, truncated })
}
