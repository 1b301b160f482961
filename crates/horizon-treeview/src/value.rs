//! Lazily expanded tree over structured values.
//!
//! [`ValueLoader`] turns a [`serde_json::Value`] into [`ValueNode`]s one level
//! at a time: a composite node keeps its payload until it is first expanded,
//! then hands it to the loader which creates one child per entry and drops
//! the payload.
//!
//! | Value | Node kind | Children |
//! |---|---|---|
//! | object | [`ValueKind::Message`] | one per field |
//! | object under a map field | [`ValueKind::Map`] | one per key |
//! | array | [`ValueKind::Repeated`] | `name [i]` per element |
//! | `null` | [`ValueKind::Message`] | none, starts expanded |
//! | scalar | [`ValueKind::Field`] | leaf showing the value |
//!
//! # Example
//!
//! ```
//! use horizon_treeview::value::{ValueLoader, ValueNode};
//! use horizon_treeview::Tree;
//! use serde_json::json;
//!
//! let loader = ValueLoader::new();
//! let mut tree: Tree<ValueNode> = Tree::new();
//! let root = loader.create_root(&mut tree, "person", json!({"name": "Ada", "id": 1}));
//! tree.set_loader(loader);
//!
//! assert!(tree.lazy_loading(root));
//! tree.set_expanded(root, true).unwrap();
//! assert_eq!(tree.child_count(root), 2);
//! ```

use std::collections::HashSet;
use std::fmt;

use horizon_treeview_core::logging::targets;
use serde_json::Value;

use crate::error::{LoadError, LoadResult};
use crate::lazy::ChildLoader;
use crate::node::{NodeId, TreeNodeData};
use crate::tree::Tree;

/// The shape of a [`ValueNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A scalar leaf.
    Field,
    /// A record with named fields, or `null`.
    Message,
    /// An ordered collection.
    Repeated,
    /// A keyed collection.
    Map,
}

/// Payload for nodes built from structured values.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueNode {
    kind: ValueKind,
    name: String,
    full_name: String,
    data_type: String,
    field_value: Option<String>,
    /// Composite content not yet turned into children.
    pending: Option<Value>,
}

impl ValueNode {
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Short name shown in the row.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted path from the root value.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Human-readable type, e.g. `string` or `Repeated<message>`.
    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    /// Rendered value of a scalar field.
    pub fn field_value(&self) -> Option<&str> {
        self.field_value.as_deref()
    }

    /// Whether children still have to be produced from the payload.
    pub fn has_pending_children(&self) -> bool {
        self.pending.is_some()
    }

    fn field(name: String, full_name: String, value: &Value) -> Self {
        Self {
            kind: ValueKind::Field,
            name,
            full_name,
            data_type: scalar_type(value).to_string(),
            field_value: Some(match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            pending: None,
        }
    }

    fn message(name: String, full_name: String, value: Value) -> Self {
        let (data_type, pending) = match value {
            Value::Null => ("null".to_string(), None),
            other => ("message".to_string(), Some(other)),
        };
        Self {
            kind: ValueKind::Message,
            name,
            full_name,
            data_type,
            field_value: None,
            pending,
        }
    }

    fn repeated(name: String, full_name: String, items: Vec<Value>) -> Self {
        let element = items.first().map_or("empty", scalar_type);
        Self {
            kind: ValueKind::Repeated,
            name,
            full_name,
            data_type: format!("Repeated<{element}>"),
            field_value: None,
            pending: (!items.is_empty()).then_some(Value::Array(items)),
        }
    }

    fn map(name: String, full_name: String, entries: serde_json::Map<String, Value>) -> Self {
        let element = entries.values().next().map_or("empty", scalar_type);
        Self {
            kind: ValueKind::Map,
            name,
            full_name,
            data_type: format!("Map<string, {element}>"),
            field_value: None,
            pending: (!entries.is_empty()).then_some(Value::Object(entries)),
        }
    }

    /// Composites without content are shown open and never load.
    fn starts_open(&self) -> bool {
        self.kind != ValueKind::Field && self.pending.is_none()
    }
}

impl TreeNodeData for ValueNode {
    fn text(&self) -> String {
        self.name.clone()
    }
}

impl fmt::Display for ValueNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

fn scalar_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "double",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "message",
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

/// Child provider for [`ValueNode`] trees.
#[derive(Debug, Clone, Default)]
pub struct ValueLoader {
    /// Object-valued fields to present as keyed maps instead of messages.
    map_fields: HashSet<String>,
}

impl ValueLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Present object-valued fields named `name` as maps.
    pub fn with_map_field(mut self, name: impl Into<String>) -> Self {
        self.map_fields.insert(name.into());
        self
    }

    /// Create the node for a top-level value, ready to be attached or
    /// inserted.
    pub fn create_root(&self, tree: &mut Tree<ValueNode>, name: &str, value: Value) -> NodeId {
        let data = self.classify(name.to_string(), name.to_string(), value);
        spawn(tree, data)
    }

    fn classify(&self, name: String, full_name: String, value: Value) -> ValueNode {
        match value {
            Value::Object(entries) if self.map_fields.contains(&name) => {
                ValueNode::map(name, full_name, entries)
            }
            Value::Object(_) | Value::Null => ValueNode::message(name, full_name, value),
            Value::Array(items) => ValueNode::repeated(name, full_name, items),
            scalar => ValueNode::field(name, full_name, &scalar),
        }
    }

    fn children_of(&self, parent: &ValueNode, payload: Value) -> Vec<ValueNode> {
        match (parent.kind, payload) {
            (ValueKind::Message, Value::Object(fields)) => fields
                .into_iter()
                .map(|(key, value)| {
                    let path = join_path(&parent.full_name, &key);
                    self.classify(key, path, value)
                })
                .collect(),
            (ValueKind::Repeated, Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(i, value)| {
                    let name = format!("{} [{i}]", parent.name);
                    let path = format!("{}[{i}]", parent.full_name);
                    self.classify(name, path, value)
                })
                .collect(),
            (ValueKind::Map, Value::Object(entries)) => entries
                .into_iter()
                .map(|(key, value)| {
                    let path = join_path(&parent.full_name, &key);
                    match value {
                        Value::Object(_) | Value::Null => ValueNode::message(key, path, value),
                        other => ValueNode::field(key, path, &other),
                    }
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Create a detached node, arming lazy loading when it has content.
fn spawn(tree: &mut Tree<ValueNode>, data: ValueNode) -> NodeId {
    let opens = data.starts_open();
    let lazy = data.pending.is_some();
    tree.create_node_with(data, |node| {
        if lazy {
            node.lazy_loading = true;
            node.can_expand_recursively = false;
        } else {
            node.expanded = opens;
        }
    })
}

impl ChildLoader<ValueNode> for ValueLoader {
    fn load_children(&self, tree: &mut Tree<ValueNode>, node: NodeId) -> LoadResult {
        let data = tree
            .data_mut(node)
            .ok_or_else(|| LoadError::provider("node vanished before loading"))?;
        let Some(payload) = data.pending.take() else {
            return Ok(());
        };
        let parent = data.clone();

        let children: Vec<NodeId> = self
            .children_of(&parent, payload)
            .into_iter()
            .map(|child| spawn(tree, child))
            .collect();
        tracing::trace!(target: targets::LAZY, path = %parent.full_name, count = children.len(), "materialized value children");
        tree.append_children(node, &children)?;
        Ok(())
    }
}
