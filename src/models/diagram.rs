//! Diagrams and their node forest.
//!
//! Nodes are views onto other project documents: a node carries the id and
//! type of the entity it shows. Ids are unique across the whole forest.

use super::document::{DocumentCommonData, DocumentData, DocumentMetaData, Named};
use super::enums::{DiagramType, DocumentType, HandlePosition};
use super::project_document::{Dimension, NodeEntity, Position, ProjectDocument};
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramHandle {
    /// Id of the node at this end of the edge
    pub id: String,
    pub handle: HandlePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramEdge {
    pub source: DiagramHandle,
    pub target: DiagramHandle,
}

impl DiagramEdge {
    pub fn new(
        source: impl Into<String>,
        source_handle: HandlePosition,
        target: impl Into<String>,
        target_handle: HandlePosition,
    ) -> Self {
        Self {
            source: DiagramHandle {
                id: source.into(),
                handle: source_handle,
            },
            target: DiagramHandle {
                id: target.into(),
                handle: target_handle,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: DocumentType,
    pub position: Position,
    pub dimension: Dimension,
    #[serde(default)]
    pub nodes: Vec<DiagramNode>,
    #[serde(default)]
    pub edges: Vec<DiagramEdge>,
    /// Id of the enclosing node, `None` at the root. Rebuilt after load.
    #[serde(skip)]
    parent: Option<String>,
}

impl DiagramNode {
    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramData {
    pub common: DocumentCommonData,
    #[serde(rename = "type")]
    pub diagram_type: DiagramType,
    #[serde(default)]
    pub nodes: Vec<DiagramNode>,
    #[serde(default)]
    pub edges: Vec<DiagramEdge>,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<DocumentMetaData>,
}

impl DocumentData for DiagramData {
    fn meta(&self) -> Option<&DocumentMetaData> {
        self.meta.as_ref()
    }

    fn meta_slot(&mut self) -> Option<&mut Option<DocumentMetaData>> {
        Some(&mut self.meta)
    }

    fn after_load(&mut self) {
        link_parents(&mut self.nodes, None);
    }
}

fn link_parents(nodes: &mut [DiagramNode], parent: Option<&str>) {
    for node in nodes.iter_mut() {
        node.parent = parent.map(str::to_string);
        let id = node.id.clone();
        link_parents(&mut node.nodes, Some(&id));
    }
}

fn find<'a>(nodes: &'a [DiagramNode], id: &str) -> Option<&'a DiagramNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find(&node.nodes, id) {
            return Some(found);
        }
    }
    None
}

fn find_mut<'a>(nodes: &'a mut [DiagramNode], id: &str) -> Option<&'a mut DiagramNode> {
    for node in nodes.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.nodes, id) {
            return Some(found);
        }
    }
    None
}

fn remove_from(nodes: &mut Vec<DiagramNode>, id: &str) -> bool {
    for index in 0..nodes.len() {
        if nodes[index].id == id {
            nodes.remove(index);
            return true;
        }
        if remove_from(&mut nodes[index].nodes, id) {
            return true;
        }
    }
    false
}

fn collect<'a>(nodes: &'a [DiagramNode], out: &mut Vec<&'a DiagramNode>) {
    for node in nodes {
        out.push(node);
        collect(&node.nodes, out);
    }
}

impl DiagramData {
    /// An empty diagram with the default viewport.
    pub fn new(common: DocumentCommonData, diagram_type: DiagramType) -> Self {
        Self {
            common,
            diagram_type,
            nodes: Vec::new(),
            edges: Vec::new(),
            viewport: Viewport::default(),
            meta: None,
        }
    }

    /// Places `entity` into the node `target` (or the root when `None`).
    ///
    /// Fails with `Conflict` if a node for the entity already exists anywhere
    /// in the forest, `NotFound` if `target` does not exist, and
    /// `Precondition` if the entity cannot be dropped there.
    pub fn add_node(
        &mut self,
        entity: &dyn NodeEntity,
        target: Option<&str>,
        position: Position,
    ) -> Result<(), CoreError> {
        if self.has_node(entity.id()) {
            return Err(CoreError::Conflict {
                entity_type: "diagram node".to_string(),
                entity_id: entity.id().to_string(),
                reason: "is already part of the diagram".to_string(),
            });
        }

        let target_type = match target {
            Some(target_id) => Some(
                self.get_node(target_id, None)
                    .ok_or_else(|| CoreError::not_found("diagram node", target_id))?
                    .node_type,
            ),
            None => None,
        };
        if !entity.is_droppable(target_type) {
            return Err(CoreError::Precondition(format!(
                "{} \"{}\" cannot be dropped into {}",
                entity.node_type(),
                entity.id(),
                target_type
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "the diagram root".to_string())
            )));
        }

        let node = DiagramNode {
            id: entity.id().to_string(),
            node_type: entity.node_type(),
            position,
            dimension: entity.default_dimension(),
            nodes: Vec::new(),
            edges: Vec::new(),
            parent: target.map(str::to_string),
        };
        match target {
            Some(target_id) => match find_mut(&mut self.nodes, target_id) {
                Some(parent) => parent.nodes.push(node),
                None => return Err(CoreError::not_found("diagram node", target_id)),
            },
            None => self.nodes.push(node),
        }
        Ok(())
    }

    /// Depth-first search below `from` (or the whole forest).
    pub fn get_node(&self, id: &str, from: Option<&str>) -> Option<&DiagramNode> {
        match from {
            Some(from_id) => find(&self.nodes, from_id).and_then(|start| find(&start.nodes, id)),
            None => find(&self.nodes, id),
        }
    }

    pub fn get_node_mut(&mut self, id: &str) -> Option<&mut DiagramNode> {
        find_mut(&mut self.nodes, id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.get_node(id, None).is_some()
    }

    /// Removes the node `id` below `from` (or anywhere) together with its
    /// subtree. Returns whether a node was removed.
    pub fn remove_node(&mut self, id: &str, from: Option<&str>) -> bool {
        match from {
            Some(from_id) => match find_mut(&mut self.nodes, from_id) {
                Some(start) => remove_from(&mut start.nodes, id),
                None => false,
            },
            None => remove_from(&mut self.nodes, id),
        }
    }

    pub fn parent_of(&self, id: &str) -> Option<&DiagramNode> {
        let parent_id = self.get_node(id, None)?.parent.as_deref()?;
        self.get_node(parent_id, None)
    }

    /// All nodes in depth-first pre-order.
    pub fn flatten(&self) -> Vec<&DiagramNode> {
        let mut out = Vec::new();
        collect(&self.nodes, &mut out);
        out
    }

    pub fn move_node(&mut self, id: &str, position: Position) -> Result<(), CoreError> {
        let node = self
            .get_node_mut(id)
            .ok_or_else(|| CoreError::not_found("diagram node", id))?;
        node.position = position;
        Ok(())
    }

    pub fn resize_node(&mut self, id: &str, dimension: Dimension) -> Result<(), CoreError> {
        let node = self
            .get_node_mut(id)
            .ok_or_else(|| CoreError::not_found("diagram node", id))?;
        node.dimension = dimension;
        Ok(())
    }

    /// Appends an edge to the node `owner` (or the root edges). Endpoints are
    /// not checked against the forest.
    pub fn add_edge(&mut self, owner: Option<&str>, edge: DiagramEdge) -> Result<(), CoreError> {
        match owner {
            Some(owner_id) => {
                let node = self
                    .get_node_mut(owner_id)
                    .ok_or_else(|| CoreError::not_found("diagram node", owner_id))?;
                node.edges.push(edge);
            }
            None => self.edges.push(edge),
        }
        Ok(())
    }

    /// Edges anywhere in the diagram whose source or target has no node.
    pub fn dangling_edges(&self) -> Vec<&DiagramEdge> {
        let nodes = self.flatten();
        let ids: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
        self.edges
            .iter()
            .chain(nodes.iter().flat_map(|node| node.edges.iter()))
            .filter(|edge| {
                !ids.contains(edge.source.id.as_str()) || !ids.contains(edge.target.id.as_str())
            })
            .collect()
    }
}

pub type Diagram = ProjectDocument<DiagramData>;

impl Named for Diagram {
    fn name(&self) -> String {
        self.data().common.name.clone()
    }
}
