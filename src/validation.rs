//! Circular dependency detection over the binding graph.
//!
//! The detector walks direct-dependency edges breadth first from one starting
//! binding. Reaching the start again means the start participates in a cycle;
//! the reported path runs from the start, through the chain of bindings that
//! led back to it, and ends at the start again.
//!
//! Cycles that do not pass through the starting binding are left alone here:
//! `validate` runs the check for every binding, so each cycle is reported from
//! one of its own members.

use std::collections::VecDeque;

use crate::error::{DiError, DiResult};
use crate::internal::cache::DirectDeps;
use crate::internal::{HashMap, HashSet};
use crate::registration::BindingId;

/// Fails with [`DiError::Circular`] if `start` can reach itself.
///
/// `edges` yields the direct dependency bindings of a node and may fail (a
/// missing binding aborts the scan). `name` labels nodes in the error path.
pub(crate) fn check_circular<E, N>(start: BindingId, mut edges: E, name: N) -> DiResult<()>
where
    E: FnMut(BindingId) -> DiResult<DirectDeps>,
    N: Fn(BindingId) -> &'static str,
{
    let mut queue = VecDeque::from([start]);
    let mut visited: HashSet<BindingId> = HashSet::default();
    let mut parent: HashMap<BindingId, BindingId> = HashMap::default();
    visited.insert(start);

    while let Some(node) = queue.pop_front() {
        for dep in edges(node)? {
            if dep == start {
                return Err(DiError::Circular(cycle_path(start, node, &parent, &name)));
            }
            if visited.insert(dep) {
                parent.insert(dep, node);
                queue.push_back(dep);
            }
        }
    }
    Ok(())
}

fn cycle_path<N>(
    start: BindingId,
    last: BindingId,
    parent: &HashMap<BindingId, BindingId>,
    name: &N,
) -> Vec<&'static str>
where
    N: Fn(BindingId) -> &'static str,
{
    let mut chain = vec![last];
    let mut cursor = last;
    while cursor != start {
        match parent.get(&cursor) {
            Some(&up) => {
                chain.push(up);
                cursor = up;
            }
            None => break,
        }
    }
    chain.reverse();
    let mut path: Vec<_> = chain.into_iter().map(name).collect();
    path.push(name(start));
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::SmallVec;

    const NAMES: [&str; 5] = ["A", "B", "C", "D", "E"];

    fn run(graph: &[&[usize]], start: usize) -> DiResult<()> {
        check_circular(
            BindingId(start),
            |node| Ok(graph[node.0].iter().map(|&i| BindingId(i)).collect::<SmallVec<_>>()),
            |node| NAMES[node.0],
        )
    }

    #[test]
    fn two_node_cycle() {
        let graph: &[&[usize]] = &[&[1], &[0]];
        assert_eq!(run(graph, 0), Err(DiError::Circular(vec!["A", "B", "A"])));
        assert_eq!(run(graph, 1), Err(DiError::Circular(vec!["B", "A", "B"])));
    }

    #[test]
    fn three_node_cycle() {
        let graph: &[&[usize]] = &[&[1], &[2], &[0]];
        assert_eq!(run(graph, 0), Err(DiError::Circular(vec!["A", "B", "C", "A"])));
    }

    #[test]
    fn self_dependency() {
        let graph: &[&[usize]] = &[&[0]];
        assert_eq!(run(graph, 0), Err(DiError::Circular(vec!["A", "A"])));
    }

    #[test]
    fn linear_chain_and_diamond_pass() {
        let chain: &[&[usize]] = &[&[1], &[2], &[]];
        assert!(run(chain, 0).is_ok());

        let diamond: &[&[usize]] = &[&[1, 2], &[3], &[3], &[]];
        assert!(run(diamond, 0).is_ok());
    }

    #[test]
    fn cycle_not_through_start_is_not_reported_from_start() {
        // A -> B -> C -> B
        let graph: &[&[usize]] = &[&[1], &[2], &[1]];
        assert!(run(graph, 0).is_ok());
        assert_eq!(run(graph, 1), Err(DiError::Circular(vec!["B", "C", "B"])));
    }

    #[test]
    fn edge_errors_propagate() {
        let result = check_circular(
            BindingId(0),
            |_| Err(DiError::MissingBinding { service: "A", dependency: "Z" }),
            |node| NAMES[node.0],
        );
        assert!(matches!(result, Err(DiError::MissingBinding { .. })));
    }
}
