use crate::compose::classify::{GroupInfo, RowClassifier, RowInfo};
use crate::error::{RecastError, Result};
use crate::types::{Field, FieldKind, IdentityKey, MapConfig, Node, NodeValue, Row, Scalar};
use std::borrow::Borrow;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Root objects of one composition pass, in order of first appearance.
///
/// Rows without an identity always get a fresh slot, so they are never
/// matched by a later row. A cache must not be shared between unrelated row
/// sequences: identity values are not namespaced by sequence.
#[derive(Debug, Default)]
pub struct IdentityCache {
    nodes: Vec<Node>,
    index: HashMap<IdentityKey, usize>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&Node> {
        self.index.get(key).map(|&i| &self.nodes[i])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    fn position(&self, key: &IdentityKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    fn insert(&mut self, key: Option<IdentityKey>, node: Node) -> &mut Node {
        let position = self.nodes.len();
        if let Some(key) = key {
            self.index.insert(key, position);
        }
        self.nodes.push(node);
        &mut self.nodes[position]
    }
}

/// List entries and array values one row adds to its root object
struct PendingEntries {
    lists: Vec<(String, Node)>,
    arrays: Vec<(String, Scalar)>,
}

impl PendingEntries {
    fn apply(self, node: &mut Node) -> Result<()> {
        for (name, item) in self.lists {
            node.list_mut(&name)?.push(item);
        }
        for (name, value) in self.arrays {
            node.array_mut(&name)?.push(value);
        }
        Ok(())
    }
}

/// Rebuilds nested objects from flat rows.
///
/// The identity column deduplicates the "one" side of a join: scalars and
/// sub-objects come from the first row seen for an identity. List and array
/// columns are the "many" side: every row appends one entry.
#[derive(Debug, Clone, Default)]
pub struct ObjectComposer {
    classifier: RowClassifier,
}

impl ObjectComposer {
    pub fn new(config: MapConfig) -> Self {
        ObjectComposer {
            classifier: RowClassifier::new(config),
        }
    }

    pub fn classifier(&self) -> &RowClassifier {
        &self.classifier
    }

    /// Compose a single row into one object
    pub fn compose_one(&self, row: &Row) -> Result<Node> {
        self.compose_fields(row.fields(), 0)
    }

    /// Compose a row sequence into its distinct root objects.
    ///
    /// The sequence is consumed exactly once.
    pub fn compose_many<I>(&self, rows: I) -> Result<Vec<Node>>
    where
        I: IntoIterator,
        I::Item: Borrow<Row>,
    {
        let mut cache = IdentityCache::new();
        let mut count = 0usize;

        for row in rows {
            self.compose_row(row.borrow(), &mut cache)?;
            count += 1;
        }

        debug!(rows = count, objects = cache.len(), "composed row sequence");
        Ok(cache.into_nodes())
    }

    /// Fold one row into `cache` and return its root object.
    ///
    /// On error the cache keeps the effects of earlier rows and nothing of
    /// this one, so callers may skip the row and continue.
    pub fn compose_row<'c>(&self, row: &Row, cache: &'c mut IdentityCache) -> Result<&'c Node> {
        let info = self.classifier.classify(row.fields())?;
        let key = info.identity.as_ref().and_then(IdentityKey::from_scalar);

        if let Some(position) = key.as_ref().and_then(|k| cache.position(k)) {
            trace!(identity = ?key, "reusing cached object");
            let root = &mut cache.nodes[position];
            // Scalars and sub-objects are not re-merged, but must still agree in kind
            for field in &info.scalars {
                check_target(root, &field.name, FieldKind::Scalar)?;
            }
            for group in &info.sub_objects {
                check_target(root, &group.name, FieldKind::Object)?;
            }
            let pending = self.prepare_entries(root, &info, 0)?;
            pending.apply(root)?;
            return Ok(root);
        }

        trace!(identity = ?key, "creating object");
        let mut root = self.create_node(&info, 0)?;
        let pending = self.prepare_entries(&root, &info, 0)?;
        pending.apply(&mut root)?;
        Ok(cache.insert(key, root))
    }

    /// Compose a group's fields as an independent single-row pass
    fn compose_fields(&self, fields: &[Field], depth: usize) -> Result<Node> {
        let info = self.classifier.classify(fields)?;
        let mut node = self.create_node(&info, depth)?;
        let pending = self.prepare_entries(&node, &info, depth)?;
        pending.apply(&mut node)?;
        Ok(node)
    }

    /// New object carrying the row's scalars and sub-objects
    fn create_node(&self, info: &RowInfo, depth: usize) -> Result<Node> {
        if depth > self.classifier.config().max_depth {
            return Err(RecastError::DepthExceeded { depth });
        }

        let mut node = Node::new();
        for field in &info.scalars {
            node.insert(field.name.clone(), NodeValue::Scalar(field.value.clone()))?;
        }
        for group in &info.sub_objects {
            let sub_object = self.compose_group(group, depth)?;
            node.insert(group.name.clone(), NodeValue::Object(sub_object))?;
        }
        Ok(node)
    }

    /// Build this row's list entries and check every target before `node` is touched
    fn prepare_entries(&self, node: &Node, info: &RowInfo, depth: usize) -> Result<PendingEntries> {
        let mut lists = Vec::with_capacity(info.lists.len());
        for group in &info.lists {
            check_target(node, &group.name, FieldKind::List)?;
            lists.push((group.name.clone(), self.compose_group(group, depth)?));
        }

        let mut arrays = Vec::with_capacity(info.arrays.len());
        for field in &info.arrays {
            check_target(node, &field.name, FieldKind::Array)?;
            if info.lists.iter().any(|group| group.name == field.name) {
                return Err(RecastError::TypeMismatch {
                    name: field.name.clone(),
                    existing: FieldKind::List,
                    incoming: FieldKind::Array,
                });
            }
            arrays.push((field.name.clone(), field.value.clone()));
        }

        Ok(PendingEntries { lists, arrays })
    }

    fn compose_group(&self, group: &GroupInfo, depth: usize) -> Result<Node> {
        self.compose_fields(&group.fields, depth + 1)
    }
}

fn check_target(node: &Node, name: &str, incoming: FieldKind) -> Result<()> {
    match node.get(name).map(NodeValue::kind) {
        Some(existing) if existing != incoming => Err(RecastError::TypeMismatch {
            name: name.to_string(),
            existing,
            incoming,
        }),
        _ => Ok(()),
    }
}
