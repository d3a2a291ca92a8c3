//! Resource dependency graph.
//!
//! Built from the provisioning tool's DOT-like graph export. An edge
//! `source -> destination` means the destination must exist before the
//! source. A synthetic `root` node is always present and is the default
//! start of every path query.

use std::collections::HashMap;
use std::sync::LazyLock;

use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use regex::Regex;
use tracing::{debug, trace};

use crate::error::GraphError;

/// Name of the synthetic root node.
pub const ROOT: &str = "root";

/// `"[scope] from" -> "[scope] to"`
#[allow(clippy::expect_used)]
static EDGE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*"([^"]+)"\s*->\s*"([^"]+)""#).expect("static regex")
});

/// `"[scope] name" [label = ...]`
#[allow(clippy::expect_used)]
static NODE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*"([^"]+)"\s*\["#).expect("static regex"));

/// Trailing `(annotation)` after a node name, with or without a space.
#[allow(clippy::expect_used)]
static ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^()]*\)$").expect("static regex"));

/// A parsed line of the graph export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphLine {
    /// Node declaration.
    Node {
        /// Node name with scope and annotation removed.
        name: String,
    },
    /// Edge declaration.
    Edge {
        /// Dependent node.
        from: String,
        /// Node depended upon.
        to: String,
    },
}

/// Directed graph of resource addresses.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    by_name: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Creates a graph holding only the root node.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = Self {
            graph: DiGraph::new(),
            by_name: HashMap::new(),
        };
        graph.push_name(ROOT);
        graph
    }

    /// Builds a graph from export text.
    ///
    /// # Errors
    ///
    /// Returns an error if an edge cannot be connected.
    pub fn from_export(text: &str) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        graph.load(text)?;
        Ok(graph)
    }

    /// Registers a node, returning the existing index if already known.
    pub fn push_name(&mut self, name: &str) -> NodeIndex {
        if let Some(index) = self.by_name.get(name) {
            return *index;
        }
        let index = self.graph.add_node(name.to_string());
        self.by_name.insert(name.to_string(), index);
        index
    }

    /// Adds an edge between two registered nodes.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if either endpoint is unknown.
    pub fn connect(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        let source = self.index_of(from)?;
        let destination = self.index_of(to)?;
        if self.graph.find_edge(source, destination).is_none() {
            self.graph.add_edge(source, destination, ());
        }
        Ok(())
    }

    /// Loads export text into the graph. Loading is additive.
    ///
    /// Both endpoints of an edge are registered on first sight.
    ///
    /// # Errors
    ///
    /// Returns an error if an edge cannot be connected.
    pub fn load(&mut self, text: &str) -> Result<(), GraphError> {
        for line in text.lines() {
            match parse_line(line) {
                Some(GraphLine::Node { name }) => {
                    self.push_name(&name);
                }
                Some(GraphLine::Edge { from, to }) => {
                    self.push_name(&from);
                    self.push_name(&to);
                    self.connect(&from, &to)?;
                }
                None => {}
            }
        }

        debug!(
            "Loaded dependency graph: {} nodes, {} edges",
            self.node_count(),
            self.edge_count()
        );
        Ok(())
    }

    /// Returns true if a node with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of nodes, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Names of the nodes `name` points at, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if `name` is unknown.
    pub fn neighbors(&self, name: &str) -> Result<Vec<&str>, GraphError> {
        let index = self.index_of(name)?;
        let mut names: Vec<&str> = self
            .graph
            .neighbors(index)
            .map(|n| self.graph[n].as_str())
            .collect();
        // petgraph walks outgoing edges newest first
        names.reverse();
        Ok(names)
    }

    /// Fewest-hop path from `from` to `to`, both endpoints included.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NoPath`] if either endpoint is unknown or `to`
    /// is unreachable.
    pub fn shortest_path(&self, from: &str, to: &str) -> Result<Vec<String>, GraphError> {
        let (Some(&start), Some(&goal)) = (self.by_name.get(from), self.by_name.get(to)) else {
            return Err(GraphError::no_path(from, to));
        };

        // Unit weights with a zero heuristic make this Dijkstra.
        let (hops, path) = astar(&self.graph, start, |n| n == goal, |_| 1_u32, |_| 0)
            .ok_or_else(|| GraphError::no_path(from, to))?;

        trace!("Path {from} -> {to} found with {hops} hops");
        Ok(path.into_iter().map(|n| self.graph[n].clone()).collect())
    }

    /// Fewest-hop path from the root node to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NoPath`] if `to` is unreachable from the root.
    pub fn path_from_root(&self, to: &str) -> Result<Vec<String>, GraphError> {
        self.shortest_path(ROOT, to)
    }

    fn index_of(&self, name: &str) -> Result<NodeIndex, GraphError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode {
                name: name.to_string(),
            })
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses one line of the graph export.
///
/// Returns `None` for lines that declare neither a node nor an edge.
#[must_use]
pub fn parse_line(line: &str) -> Option<GraphLine> {
    if let Some(captures) = EDGE_LINE.captures(line) {
        return Some(GraphLine::Edge {
            from: clean_name(&captures[1]),
            to: clean_name(&captures[2]),
        });
    }

    NODE_LINE.captures(line).map(|captures| GraphLine::Node {
        name: clean_name(&captures[1]),
    })
}

/// Drops the `[scope]` prefix and a trailing parenthetical annotation.
fn clean_name(raw: &str) -> String {
    let raw = raw.trim();
    let unscoped = if raw.starts_with('[') {
        raw.find(']').map_or(raw, |end| &raw[end + 1..])
    } else {
        raw
    };
    ANNOTATION.replace(unscoped.trim(), "").trim().to_string()
}
