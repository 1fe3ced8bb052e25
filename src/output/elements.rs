//! Element export
//!
//! The final graph is written as one JSON array of elements, each wrapped in a `data`
//! object: nodes carry `id`, `label`, `size` and `url`; edges carry `source`, `target`
//! and `label`. This is the shape graph viewers such as Cytoscape load directly.

use crate::output::finalize::FinalGraph;
use crate::storage::StorageResult;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub id: String,
    pub label: String,
    pub size: f64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    pub source: String,
    pub target: String,
    pub label: String,
}

/// One exported node or edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphElement {
    Node { data: NodeData },
    Edge { data: EdgeData },
}

impl GraphElement {
    pub fn is_node(&self) -> bool {
        matches!(self, GraphElement::Node { .. })
    }
}

/// Flattens a graph into export order: every node, then every edge
pub fn to_elements(graph: &FinalGraph) -> Vec<GraphElement> {
    let nodes = graph.nodes.iter().map(|node| GraphElement::Node {
        data: NodeData {
            id: node.id.clone(),
            label: node.label.clone(),
            size: node.size,
            url: node.url.clone(),
        },
    });
    let edges = graph.edges.iter().map(|edge| GraphElement::Edge {
        data: EdgeData {
            source: edge.source.clone(),
            target: edge.target.clone(),
            label: edge.label.clone(),
        },
    });
    nodes.chain(edges).collect()
}

/// Writes the graph to `path`, replacing any previous export atomically
pub fn write_elements(graph: &FinalGraph, path: &Path) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        serde_json::to_writer(&mut writer, &to_elements(graph))?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }
    fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Reads an export written by [`write_elements`]
pub fn read_elements(path: &Path) -> StorageResult<Vec<GraphElement>> {
    let content = fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}
