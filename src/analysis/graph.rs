use std::collections::HashMap;
use petgraph::Graph;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::error::Result;
use crate::registry::Registry;
use crate::sql::{DbObject, ObjectId, ObjectKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectNode {
    pub id: ObjectId,
    pub kind: ObjectKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceType {
    /// Definitional reference: owners, members, extensions, copied columns,
    /// the relations a schema lists
    Hard,

    /// A script mentions the object; nothing in the catalog depends on it
    Soft,
}

/// Who points at whom in a resolved catalog. Edges run from the referenced
/// object to the object holding the reference.
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    graph: Graph<ObjectNode, ReferenceType>,
    node_map: HashMap<ObjectId, NodeIndex>,
}

impl ReferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph of a resolved registry
    pub fn build_from_registry(registry: &Registry) -> Result<Self> {
        let mut graph = Self::new();

        debug!("Building reference graph from {} objects", registry.len());

        for object in registry.iter() {
            graph.add_node(node_of(object));
        }

        for object in registry.iter() {
            let ref_type = match object {
                DbObject::Script(_) => ReferenceType::Soft,
                _ => ReferenceType::Hard,
            };

            for referenced in object.references() {
                let target = registry.get(referenced)?;
                debug!("  Creating edge: {} -> {}", target.id(), object.id());
                graph.add_edge(node_of(target), node_of(object), ref_type);
            }
        }

        Ok(graph)
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: ObjectNode) -> NodeIndex {
        if let Some(&index) = self.node_map.get(&node.id) {
            index
        } else {
            let id = node.id.clone();
            let index = self.graph.add_node(node);
            self.node_map.insert(id, index);
            index
        }
    }

    /// Add an edge from a referenced object to the object referencing it.
    /// Repeated references between the same pair collapse into one edge.
    pub fn add_edge(&mut self, from: ObjectNode, to: ObjectNode, ref_type: ReferenceType) {
        let from_node = self.add_node(from);
        let to_node = self.add_node(to);

        if self.graph.find_edge(from_node, to_node).is_none() {
            self.graph.add_edge(from_node, to_node, ref_type);
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Output the reference graph in Graphviz DOT format
    pub fn to_graphviz(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph reference_graph {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box, style=rounded];\n\n");

        for index in self.graph.node_indices() {
            let node = &self.graph[index];

            let (color, shape) = match node.kind {
                ObjectKind::Group => ("lightpink", "ellipse"),
                ObjectKind::Role => ("lightgreen", "ellipse"),
                ObjectKind::Extension => ("lightgray", "component"),
                ObjectKind::Database => ("lightyellow", "cylinder"),
                ObjectKind::Table => ("lightcyan", "rect"),
                ObjectKind::View => ("lightblue", "box"),
                ObjectKind::Schema => ("lavender", "folder"),
                ObjectKind::Script => ("orange", "note"),
            };

            output.push_str(&format!(
                "  \"{}\" [label=\"{}\\n({})\", fillcolor={}, style=\"filled,rounded\", shape={}];\n",
                node.id,
                node.id.local_name(),
                node.kind.as_str().to_lowercase(),
                color,
                shape
            ));
        }

        output.push('\n');

        for edge in self.graph.edge_references() {
            let style = match edge.weight() {
                ReferenceType::Hard => "solid",
                ReferenceType::Soft => "dashed",
            };
            output.push_str(&format!(
                "  \"{}\" -> \"{}\" [style={}];\n",
                self.graph[edge.source()].id,
                self.graph[edge.target()].id,
                style
            ));
        }

        output.push_str("}\n");
        output
    }
}

fn node_of(object: &DbObject) -> ObjectNode {
    ObjectNode {
        id: object.id().clone(),
        kind: object.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn id(s: &str) -> ObjectId {
        ObjectId::parse(s).unwrap()
    }

    fn node(s: &str) -> ObjectNode {
        let id = id(s);
        let kind = id.kind().unwrap();
        ObjectNode { id, kind }
    }

    fn sample_registry() -> Registry {
        let catalog = serde_yaml::from_str(indoc! {"
            - id: Role::admin
              name: admin
            - id: Database::db1
              name: db1
              owner: Role::admin
            - id: Table::parcels
              name: parcels
              columns:
                - {name: gid, type: integer}
            - id: Schema::context
              name: context
              owner: Role::admin
              tables: [Table::parcels]
            - id: Script::setup
              name: setup
              content:
                - object: Schema::context
                  action: full_create
        "})
        .unwrap();
        Registry::build(&catalog).unwrap()
    }

    #[test]
    fn test_graph_from_registry() {
        let graph = ReferenceGraph::build_from_registry(&sample_registry()).unwrap();

        assert_eq!(graph.node_count(), 5);
        // admin->db1, admin->context, parcels->context, context->setup
        assert_eq!(graph.edge_count(), 4);

        let dot = graph.to_graphviz();
        assert!(dot.contains("\"Role::admin\" -> \"Schema::context\" [style=solid];"));
        assert!(dot.contains("\"Table::parcels\" -> \"Schema::context\" [style=solid];"));
        assert!(!dot.contains("\"Role::admin\" -> \"Script::setup\""));
    }

    #[test]
    fn test_repeated_edges_collapse() {
        let mut graph = ReferenceGraph::new();
        graph.add_edge(node("Role::a"), node("Database::d"), ReferenceType::Hard);
        graph.add_edge(node("Role::a"), node("Database::d"), ReferenceType::Hard);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_graphviz_output() {
        let graph = ReferenceGraph::build_from_registry(&sample_registry()).unwrap();
        let dot = graph.to_graphviz();

        assert!(dot.starts_with("digraph reference_graph {"));
        assert!(dot.contains("\"Role::admin\" [label=\"admin\\n(role)\""));
        assert!(dot.contains("\"Role::admin\" -> \"Database::db1\" [style=solid];"));
        assert!(dot.contains("\"Schema::context\" -> \"Script::setup\" [style=dashed];"));
        assert!(dot.ends_with("}\n"));
    }
}
