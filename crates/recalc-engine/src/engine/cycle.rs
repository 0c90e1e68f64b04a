//! Recalculation ordering with circular dependency detection.
//!
//! After a cell changes, every cell that transitively depends on it must be
//! re-evaluated, each one after everything it reads. This module walks the
//! "depends on me" relation depth-first from the changed cell; reaching a
//! cell that is still on the walk means the cell depends on itself. The walk
//! keeps its own stack, so chain length is bounded by memory, not call depth.

use std::collections::HashMap;
use thiserror::Error;

use super::graph::DependencyGraph;

/// A circular dependency, listed from the first repeated cell back to itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Circular dependency: {}", .path.join(" -> "))]
pub struct CycleError {
    pub path: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Visited,
}

/// Order the cells reachable from `start` through `dependents` so that each
/// cell comes after every cell it depends on. `start` is always first.
///
/// `dependents(n)` lists the cells that directly depend on `n`. Taking it as a
/// function lets callers ask about a graph with pending edits overlaid.
pub fn recalculation_order<F, I, S>(
    start: &str,
    mut dependents: F,
) -> Result<Vec<String>, CycleError>
where
    F: FnMut(&str) -> I,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut marks: HashMap<String, Mark> = HashMap::new();
    let mut finished: Vec<String> = Vec::new();
    // Explicit stack of (cell, its dependents, next dependent to visit); the
    // cells on it form the current path.
    let mut stack: Vec<(String, Vec<String>, usize)> = Vec::new();

    marks.insert(start.to_string(), Mark::Visiting);
    stack.push((start.to_string(), direct(&mut dependents, start), 0));

    while let Some((current, next, idx)) = stack.last_mut() {
        let Some(dep) = next.get(*idx).cloned() else {
            marks.insert(current.clone(), Mark::Visited);
            finished.push(current.clone());
            stack.pop();
            continue;
        };
        *idx += 1;

        match marks.get(dep.as_str()).copied() {
            Some(Mark::Visiting) => {
                let from = stack.iter().position(|(n, _, _)| *n == dep).unwrap_or(0);
                let mut path: Vec<String> =
                    stack[from..].iter().map(|(n, _, _)| n.clone()).collect();
                path.push(dep);
                return Err(CycleError { path });
            }
            Some(Mark::Visited) => {}
            None => {
                marks.insert(dep.clone(), Mark::Visiting);
                let children = direct(&mut dependents, &dep);
                stack.push((dep, children, 0));
            }
        }
    }

    finished.reverse();
    Ok(finished)
}

fn direct<F, I, S>(dependents: &mut F, name: &str) -> Vec<String>
where
    F: FnMut(&str) -> I,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    dependents(name)
        .into_iter()
        .map(|d| d.as_ref().to_string())
        .collect()
}

impl DependencyGraph {
    /// [`recalculation_order`] over this graph as it stands.
    pub fn recalculation_order(&self, start: &str) -> Result<Vec<String>, CycleError> {
        recalculation_order(start, |n| self.dependents(n))
    }
}
