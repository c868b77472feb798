//! Topological scheduling — run this before executing a workflow.
//!
//! Rules enforced:
//! 1. Node ids must be unique within the workflow.
//! 2. Every edge must reference nodes present in the workflow.
//! 3. The directed graph must be acyclic; a cycle means nothing executes.
//!
//! Returns the nodes in a legal execution order.  Isolated nodes (present in
//! no edge) are always included.  Ordering among mutually unconstrained
//! nodes is unspecified.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::{Edge, Node};
use crate::EngineError;

/// Produce an execution order for `nodes` that respects every edge.
///
/// # Errors
/// - [`EngineError::DuplicateNodeId`] if two nodes share an id.
/// - [`EngineError::UnknownNodeReference`] if an edge references a missing node.
/// - [`EngineError::Cycle`] if the graph is not acyclic.
pub fn topological_order(nodes: &[Node], edges: &[Edge]) -> Result<Vec<Node>, EngineError> {
    // Fast path: with no edges every order is legal; keep the given one.
    if edges.is_empty() {
        return Ok(nodes.to_vec());
    }

    let mut seen_ids: HashSet<&str> = HashSet::new();
    for node in nodes {
        if !seen_ids.insert(node.id.as_str()) {
            return Err(EngineError::DuplicateNodeId(node.id.clone()));
        }
    }

    for edge in edges {
        if !seen_ids.contains(edge.source.as_str()) {
            return Err(EngineError::UnknownNodeReference {
                node_id: edge.source.clone(),
                side: "source",
            });
        }
        if !seen_ids.contains(edge.target.as_str()) {
            return Err(EngineError::UnknownNodeReference {
                node_id: edge.target.clone(),
                side: "target",
            });
        }
    }

    // Kahn's algorithm.  Every node gets an adjacency entry, so isolated
    // nodes enter the queue with in-degree 0.
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut in_degree: HashMap<&str, usize> = HashMap::new();

    for node in nodes {
        adjacency.entry(node.id.as_str()).or_default();
        in_degree.entry(node.id.as_str()).or_insert(0);
    }

    for edge in edges {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
        *in_degree.entry(edge.target.as_str()).or_insert(0) += 1;
    }

    // Seed the queue in input order so unconstrained nodes keep a stable
    // relative position.
    let mut queue: VecDeque<&str> = nodes
        .iter()
        .filter(|node| in_degree[node.id.as_str()] == 0)
        .map(|node| node.id.as_str())
        .collect();

    let mut sorted_ids: Vec<&str> = Vec::with_capacity(nodes.len());

    while let Some(node_id) = queue.pop_front() {
        sorted_ids.push(node_id);

        if let Some(neighbours) = adjacency.get(node_id) {
            for &neighbour in neighbours {
                let degree = in_degree.entry(neighbour).or_insert(0);
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(neighbour);
                }
            }
        }
    }

    // Not visiting every node means a cycle kept some in-degrees above zero.
    if sorted_ids.len() != nodes.len() {
        return Err(EngineError::Cycle);
    }

    // Resolve ids back to owned nodes.  Ids with no corresponding input node
    // are discarded; with the validation above this never triggers.
    let by_id: HashMap<&str, &Node> = nodes.iter().map(|node| (node.id.as_str(), node)).collect();
    Ok(sorted_ids
        .into_iter()
        .filter_map(|id| by_id.get(id).map(|&node| node.clone()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeType, Position};
    use serde_json::json;

    fn make_node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            name: id.to_string(),
            node_type: NodeType::ManualTrigger,
            position: Position { x: 0.0, y: 0.0 },
            data: json!({}),
        }
    }

    fn make_edge(source: &str, target: &str) -> Edge {
        Edge {
            source: source.into(),
            target: target.into(),
            source_handle: "main".into(),
            target_handle: "main".into(),
        }
    }

    fn ids(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|node| node.id.as_str()).collect()
    }

    fn position_of(nodes: &[Node], id: &str) -> usize {
        nodes
            .iter()
            .position(|node| node.id == id)
            .unwrap_or_else(|| panic!("node '{id}' missing from order"))
    }

    #[test]
    fn linear_graph_sorts_in_chain_order() {
        let nodes = vec![make_node("a"), make_node("b"), make_node("c")];
        let edges = vec![make_edge("a", "b"), make_edge("b", "c")];

        let sorted = topological_order(&nodes, &edges).expect("should be valid");
        assert_eq!(ids(&sorted), vec!["a", "b", "c"]);
    }

    #[test]
    fn diamond_respects_edge_constraints() {
        //   t
        //  / \
        // a   b
        //  \ /
        //   c
        let nodes = vec![make_node("t"), make_node("a"), make_node("b"), make_node("c")];
        let edges = vec![
            make_edge("t", "a"),
            make_edge("t", "b"),
            make_edge("a", "c"),
            make_edge("b", "c"),
        ];

        let sorted = topological_order(&nodes, &edges).expect("should be valid");
        assert_eq!(sorted.len(), 4);
        assert_eq!(sorted.first().unwrap().id, "t");
        assert_eq!(sorted.last().unwrap().id, "c");
    }

    #[test]
    fn empty_edge_set_returns_nodes_as_given() {
        // Deliberately not alphabetical: the given order must survive.
        let nodes = vec![make_node("z"), make_node("a"), make_node("m")];
        let sorted = topological_order(&nodes, &[]).expect("should be valid");
        assert_eq!(ids(&sorted), vec!["z", "a", "m"]);
    }

    #[test]
    fn isolated_node_is_included() {
        let nodes = vec![make_node("a"), make_node("b"), make_node("c")];
        let edges = vec![make_edge("a", "b")];

        let sorted = topological_order(&nodes, &edges).expect("should be valid");
        assert_eq!(sorted.len(), 3);
        assert!(position_of(&sorted, "a") < position_of(&sorted, "b"));
        // 'c' appears exactly once, anywhere.
        assert_eq!(sorted.iter().filter(|node| node.id == "c").count(), 1);
    }

    #[test]
    fn output_is_a_permutation_of_the_input() {
        let nodes = vec![make_node("a"), make_node("b"), make_node("c"), make_node("d")];
        let edges = vec![make_edge("a", "c"), make_edge("b", "c")];

        let sorted = topological_order(&nodes, &edges).expect("should be valid");
        let mut sorted_ids = ids(&sorted);
        sorted_ids.sort_unstable();
        assert_eq!(sorted_ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let nodes = vec![make_node("a"), make_node("a"), make_node("b")];
        let edges = vec![make_edge("a", "b")];

        assert!(matches!(
            topological_order(&nodes, &edges),
            Err(EngineError::DuplicateNodeId(id)) if id == "a"
        ));
    }

    #[test]
    fn edge_referencing_missing_node_is_rejected() {
        let nodes = vec![make_node("a")];
        let edges = vec![make_edge("a", "ghost")];

        assert!(matches!(
            topological_order(&nodes, &edges),
            Err(EngineError::UnknownNodeReference { node_id, side: "target" }) if node_id == "ghost"
        ));
    }

    #[test]
    fn two_node_cycle_is_detected() {
        let nodes = vec![make_node("x"), make_node("y")];
        let edges = vec![make_edge("x", "y"), make_edge("y", "x")];

        assert!(matches!(
            topological_order(&nodes, &edges),
            Err(EngineError::Cycle)
        ));
    }

    #[test]
    fn self_edge_is_a_cycle() {
        let nodes = vec![make_node("solo")];
        let edges = vec![make_edge("solo", "solo")];

        assert!(matches!(
            topological_order(&nodes, &edges),
            Err(EngineError::Cycle)
        ));
    }

    #[test]
    fn single_node_no_edges_is_valid() {
        let nodes = vec![make_node("solo")];
        let sorted = topological_order(&nodes, &[]).expect("should be valid");
        assert_eq!(ids(&sorted), vec!["solo"]);
    }
}
