//! Debug visualization of the behavior graph.

use petgraph::dot::Dot;
use petgraph::graph::NodeIndex;
use petgraph::Graph;

use crate::graph::behavior::Footprint;
use crate::graph::variable::VariableId;

/// Trait that is implemented for the footprint to help with debugging and
/// visualizing the dependency graph.
pub trait GraphViz {
    /// Get the string representation of this graph in `dot` format.
    fn dot(&self) -> String;
}

impl GraphViz for Footprint {
    /// Behaviors become nodes, def-use relationships become edges: for every
    /// variable a behavior reads, an edge is drawn from the most recent
    /// writer of that variable.
    fn dot(&self) -> String {
        let mut graph: Graph<String, String> = Graph::new();
        // Last writer per variable while scanning in stream order.
        let mut defs: std::collections::HashMap<VariableId, NodeIndex> =
            std::collections::HashMap::new();

        for behavior in self.behaviors() {
            let mut name = format!(
                "{}{}",
                behavior.owner().command,
                behavior
                    .owner()
                    .sub
                    .map(|sub| format!(" {sub}"))
                    .unwrap_or_default()
            );
            if behavior.alive() {
                name.push_str(" (alive)");
            }
            if behavior.aborted() {
                name.push_str(" (aborted)");
            }
            let node = graph.add_node(name);

            for &var in behavior.reads() {
                if let Some(&def) = defs.get(&var) {
                    if def != node && graph.find_edge(def, node).is_none() {
                        graph.add_edge(def, node, String::new());
                    }
                }
            }
            for &var in behavior.writes() {
                defs.insert(var, node);
            }
        }

        format!("{}", Dot::with_config(&graph, &[petgraph::dot::Config::EdgeNoLabel]))
    }
}
