//! Cycle detection over name graphs.

use indexmap::{IndexMap, IndexSet};

/// Find a cycle in a directed graph of names, if any.
///
/// Edges pointing at names that are not keys of the graph are ignored; those
/// targets are external and cannot participate in a cycle. The returned path
/// starts and ends on the same name, e.g. `[x, y, x]`.
pub(crate) fn detect_cycle(graph: &IndexMap<String, IndexSet<String>>) -> Option<Vec<String>> {
    let mut finished: IndexSet<&str> = IndexSet::new();

    for start in graph.keys() {
        if finished.contains(start.as_str()) {
            continue;
        }
        let mut path: Vec<&str> = Vec::new();
        if let Some(cycle) = visit(start, graph, &mut path, &mut finished) {
            return Some(cycle);
        }
    }
    None
}

fn visit<'a>(
    node: &'a str,
    graph: &'a IndexMap<String, IndexSet<String>>,
    path: &mut Vec<&'a str>,
    finished: &mut IndexSet<&'a str>,
) -> Option<Vec<String>> {
    if let Some(at) = path.iter().position(|&seen| seen == node) {
        let mut cycle: Vec<String> = path[at..].iter().map(|s| s.to_string()).collect();
        cycle.push(node.to_string());
        return Some(cycle);
    }
    if finished.contains(node) {
        return None;
    }

    path.push(node);
    if let Some(edges) = graph.get(node) {
        for target in edges {
            if graph.contains_key(target) {
                if let Some(cycle) = visit(target, graph, path, finished) {
                    return Some(cycle);
                }
            }
        }
    }
    path.pop();
    finished.insert(node);
    None
}
