//! The canonical schema map.
//!
//! Documents are indexed in two passes. The first one walks every document breadth-first,
//! registering nodes that declare `$id` or `$anchor` and leaving a [`Slot::Pending`] marker for
//! every `$ref` target that is not known yet. The second one backfills the pending markers by
//! walking JSON Pointers into already indexed resources.
use std::{collections::VecDeque, sync::Arc};

use ahash::AHashMap;
use fluent_uri::Uri;
use serde_json::Value;

use crate::{
    pointer,
    subresources::subresources_of,
    uri::{self, AnchorScope, Identifier, DEFAULT_ROOT_URI},
    Error,
};

/// Index of a node in the graph arena.
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Node(NodeId),
    /// A `$ref` pointed here before the target was located.
    Pending,
}

#[derive(Debug, Clone)]
struct Node<'a> {
    contents: &'a Value,
    /// Effective base URI of the node, including its own `$id`.
    base: Arc<Uri<String>>,
}

/// A schema node found by its canonical identifier.
#[derive(Debug, Clone)]
pub struct Resolved<'a> {
    contents: &'a Value,
    base: Arc<Uri<String>>,
    id: String,
}

impl<'a> Resolved<'a> {
    /// Schema node contents.
    #[must_use]
    pub fn contents(&self) -> &'a Value {
        self.contents
    }
    /// Base URI that references inside this node are resolved against.
    #[must_use]
    pub fn base(&self) -> &Arc<Uri<String>> {
        &self.base
    }
    /// Canonical identifier the node was found by.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
    #[must_use]
    pub fn into_parts(self) -> (&'a Value, Arc<Uri<String>>, String) {
        (self.contents, self.base, self.id)
    }
}

/// Mapping from canonical identifiers to schema nodes of one or more documents.
#[derive(Debug, Clone)]
pub struct SchemaGraph<'a> {
    scope: AnchorScope,
    slots: AHashMap<String, Slot>,
    nodes: Vec<Node<'a>>,
    /// Identifiers declared below a `$ref`, keyed to the canonical id of that `$ref` node.
    ignored: AHashMap<String, String>,
}

impl Default for SchemaGraph<'_> {
    fn default() -> Self {
        SchemaGraph::new(AnchorScope::default())
    }
}

impl<'a> SchemaGraph<'a> {
    #[must_use]
    pub fn new(scope: AnchorScope) -> Self {
        SchemaGraph {
            scope,
            slots: AHashMap::new(),
            nodes: Vec::new(),
            ignored: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn scope(&self) -> AnchorScope {
        self.scope
    }

    /// Number of registered identifiers, pending ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether `id` points to a concrete node.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        matches!(self.slots.get(id), Some(Slot::Node(_)))
    }

    /// Number of identifiers still waiting for their target.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Pending))
            .count()
    }

    /// Index a document and return the canonical identifier of its root.
    ///
    /// The document is registered under `key` when one is given, and under its own `$id` if it
    /// declares one. A document with neither lives at the default root URI.
    ///
    /// # Errors
    ///
    /// If the key, an `$id` or a `$ref` is not a valid URI reference, or if another node already
    /// claims one of the identifiers declared in this document.
    pub fn add_document(&mut self, key: Option<&str>, document: &'a Value) -> Result<String, Error> {
        let base = match key {
            Some(key) => {
                let left = key.split_once('#').map_or(key, |(left, _)| left);
                Arc::new(uri::from_str(left)?)
            }
            None => match document.get("$id").and_then(Value::as_str) {
                Some(id) => match uri::resolve_id(&DEFAULT_ROOT_URI, id)? {
                    Identifier::Resource(base) => base,
                    Identifier::Anchor(_) => Arc::clone(&DEFAULT_ROOT_URI),
                },
                None => Arc::clone(&DEFAULT_ROOT_URI),
            },
        };
        let root = uri::canonical(&base, "");
        self.register(root.clone(), document, &base)?;
        self.index(document, base)?;
        tracing::debug!(document = %root, identifiers = self.slots.len(), "Indexed schema document");
        Ok(root)
    }

    fn index(&mut self, document: &'a Value, base: Arc<Uri<String>>) -> Result<(), Error> {
        let mut queue = VecDeque::from([(document, base)]);
        while let Some((contents, mut base)) = queue.pop_front() {
            let Some(schema) = contents.as_object() else {
                continue;
            };
            if let Some(Value::String(declared)) = schema.get("$id") {
                match uri::resolve_id(&base, declared)? {
                    Identifier::Resource(resource) => {
                        base = resource;
                        self.register(uri::canonical(&base, ""), contents, &base)?;
                    }
                    Identifier::Anchor(name) => {
                        let id = uri::anchor_id(&base, &name, self.scope);
                        self.register(id, contents, &base)?;
                    }
                }
            }
            if let Some(Value::String(anchor)) = schema.get("$anchor") {
                if uri::is_anchor(anchor) {
                    let id = uri::anchor_id(&base, anchor, self.scope);
                    self.register(id, contents, &base)?;
                }
            }
            if let Some(Value::String(reference)) = schema.get("$ref") {
                let resolved = uri::resolve_reference(&base, reference, self.scope)?;
                self.slots.entry(resolved.id).or_insert(Slot::Pending);
                self.remember_ignored(contents, &base);
                continue;
            }
            for subresource in subresources_of(contents) {
                queue.push_back((subresource.contents, Arc::clone(&base)));
            }
        }
        Ok(())
    }

    /// Record identifiers declared below a `$ref` node for error reporting only.
    fn remember_ignored(&mut self, reference: &'a Value, base: &Arc<Uri<String>>) {
        let parent = reference
            .get("$ref")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let mut queue: VecDeque<_> = subresources_of(reference)
            .map(|subresource| (subresource.contents, Arc::clone(base)))
            .collect();
        while let Some((contents, mut base)) = queue.pop_front() {
            let Some(schema) = contents.as_object() else {
                continue;
            };
            let mut declared = Vec::new();
            if let Some(Value::String(id)) = schema.get("$id") {
                match uri::resolve_id(&base, id) {
                    Ok(Identifier::Resource(resource)) => {
                        base = resource;
                        declared.push(uri::canonical(&base, ""));
                    }
                    Ok(Identifier::Anchor(name)) => declared.push(uri::anchor_id(&base, &name, self.scope)),
                    Err(_) => {}
                }
            }
            if let Some(Value::String(anchor)) = schema.get("$anchor") {
                if uri::is_anchor(anchor) {
                    declared.push(uri::anchor_id(&base, anchor, self.scope));
                }
            }
            for id in declared {
                self.ignored.entry(id).or_insert_with(|| parent.clone());
            }
            for subresource in subresources_of(contents) {
                queue.push_back((subresource.contents, Arc::clone(&base)));
            }
        }
    }

    fn unresolvable(&self, id: &str) -> Error {
        match self.ignored.get(id) {
            Some(parent) => Error::below_reference(id, parent.clone()),
            None => Error::unresolvable(id),
        }
    }

    fn register(&mut self, id: String, contents: &'a Value, base: &Arc<Uri<String>>) -> Result<NodeId, Error> {
        if let Some(Slot::Node(existing)) = self.slots.get(&id) {
            // The same node is seen again when a document root also declares `$id`
            if std::ptr::eq(self.nodes[*existing].contents, contents) {
                return Ok(*existing);
            }
            return Err(Error::duplicate_id(id));
        }
        let node = self.push(contents, Arc::clone(base));
        tracing::trace!(id = %id, "Registered schema node");
        self.slots.insert(id, Slot::Node(node));
        Ok(node)
    }

    fn push(&mut self, contents: &'a Value, base: Arc<Uri<String>>) -> NodeId {
        self.nodes.push(Node { contents, base });
        self.nodes.len() - 1
    }

    /// Replace every pending marker with the node it points to.
    ///
    /// # Errors
    ///
    /// If any `$ref` target can not be located in the indexed documents.
    pub fn resolve_pending(&mut self) -> Result<(), Error> {
        let mut pending: Vec<String> = self
            .slots
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Pending))
            .map(|(id, _)| id.clone())
            .collect();
        if pending.is_empty() {
            return Ok(());
        }
        // Deterministic failure reports
        pending.sort_unstable();
        tracing::debug!(count = pending.len(), "Resolving pending references");
        for id in pending {
            self.lookup(&id)?;
        }
        Ok(())
    }

    /// Resolve `reference` against `base` and find the node it points to.
    ///
    /// # Errors
    ///
    /// If the reference is malformed or its target is not present in the graph.
    pub fn resolve(&mut self, base: &Arc<Uri<String>>, reference: &str) -> Result<Resolved<'a>, Error> {
        let resolved = uri::resolve_reference(base, reference, self.scope)?;
        self.lookup(&resolved.id)
    }

    /// Find a node by its canonical identifier.
    ///
    /// Pointer fragments that were not registered during indexing are resolved by walking from
    /// the resource root, switching the base URI at every nested `$id` along the way. The result
    /// is registered, so each identifier is walked at most once.
    ///
    /// # Errors
    ///
    /// If the identifier does not point to any node.
    pub fn lookup(&mut self, id: &str) -> Result<Resolved<'a>, Error> {
        if let Some(Slot::Node(node)) = self.slots.get(id) {
            return Ok(self.resolved(*node, id));
        }
        let (left, fragment) = id.split_once('#').unwrap_or((id, ""));
        if !fragment.starts_with('/') {
            return Err(self.unresolvable(id));
        }
        let Some(Slot::Node(root)) = self.slots.get(&format!("{left}#")) else {
            return Err(self.unresolvable(id));
        };
        let Node {
            mut contents,
            mut base,
        } = self.nodes[*root].clone();
        for segment in pointer::segments(fragment) {
            contents = pointer::step(contents, &segment).ok_or_else(|| self.unresolvable(id))?;
            if let Some(Value::String(declared)) = contents.get("$id") {
                if let Identifier::Resource(resource) = uri::resolve_id(&base, declared)? {
                    base = resource;
                }
            }
        }
        let node = self.push(contents, base);
        self.slots.insert(id.to_string(), Slot::Node(node));
        tracing::trace!(id = %id, "Resolved pointer reference");
        Ok(self.resolved(node, id))
    }

    fn resolved(&self, node: NodeId, id: &str) -> Resolved<'a> {
        let node = &self.nodes[node];
        Resolved {
            contents: node.contents,
            base: Arc::clone(&node.base),
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn indexed(document: &Value) -> SchemaGraph<'_> {
        let mut graph = SchemaGraph::default();
        graph.add_document(None, document).expect("Valid document");
        graph.resolve_pending().expect("Resolvable");
        graph
    }

    #[test]
    fn root_lives_at_default_uri() {
        let document = json!({"type": "integer"});
        let mut graph = indexed(&document);
        let root = graph.lookup("json-schema:///#").expect("Root exists");
        assert!(std::ptr::eq(root.contents(), &document));
    }

    #[test]
    fn forward_reference_is_backfilled() {
        let document = json!({
            "properties": {"a": {"$ref": "#/$defs/later"}},
            "$defs": {"later": {"type": "string"}}
        });
        let mut graph = SchemaGraph::default();
        graph.add_document(None, &document).expect("Valid document");
        assert_eq!(graph.pending(), 1);
        graph.resolve_pending().expect("Resolvable");
        assert_eq!(graph.pending(), 0);
        let target = graph.lookup("json-schema:///#/$defs/later").expect("Exists");
        assert_eq!(target.contents(), &json!({"type": "string"}));
    }

    #[test]
    fn escaped_pointer_matches_direct_lookup() {
        let document = json!({
            "$defs": {"tilde~field": {"type": "integer"}},
            "$ref": "#/$defs/tilde~0field"
        });
        let mut graph = indexed(&document);
        let target = graph.lookup("json-schema:///#/$defs/tilde~0field").expect("Exists");
        assert!(std::ptr::eq(target.contents(), &document["$defs"]["tilde~field"]));
    }

    #[test_case(&json!({"type": "integer"}), &json!({"type": "string"}); "different contents")]
    #[test_case(&json!({"type": "integer"}), &json!({"type": "integer"}); "identical contents")]
    fn duplicate_identifiers(first: &Value, second: &Value) {
        let mut first = first.clone();
        let mut second = second.clone();
        first["$id"] = json!("http://example.com/same");
        second["$id"] = json!("http://example.com/same");
        let document = json!({"$defs": {"a": first, "b": second}});
        let mut graph = SchemaGraph::default();
        let error = graph.add_document(None, &document).expect_err("Should fail");
        assert_eq!(
            error,
            Error::DuplicateId {
                id: "http://example.com/same#".to_string()
            }
        );
    }

    #[test]
    fn unresolvable_reference() {
        let document = json!({"$ref": "#/$defs/missing"});
        let mut graph = SchemaGraph::default();
        graph.add_document(None, &document).expect("Valid document");
        let error = graph.resolve_pending().expect_err("Should fail");
        assert_eq!(
            error,
            Error::Unresolvable {
                reference: "json-schema:///#/$defs/missing".to_string()
            }
        );
    }

    #[test]
    fn identifiers_below_a_reference_are_reported() {
        let document = json!({"$ref": "#foo", "$defs": {"a": {"$anchor": "foo"}}});
        let mut graph = SchemaGraph::default();
        graph.add_document(None, &document).expect("Valid document");
        let error = graph.resolve_pending().expect_err("`foo` is not indexed");
        assert_eq!(
            error,
            Error::BelowReference {
                reference: "json-schema:///#foo".to_string(),
                parent: "#foo".to_string()
            }
        );
    }

    #[test]
    fn ids_rebase_descendants() {
        let document = json!({
            "$id": "http://example.com/root.json",
            "$defs": {
                "nested": {
                    "$id": "nested/",
                    "$defs": {"leaf": {"$anchor": "leaf", "type": "null"}}
                }
            }
        });
        let mut graph = indexed(&document);
        assert!(graph.contains("http://example.com/root.json#"));
        assert!(graph.contains("http://example.com/nested/#"));
        let leaf = graph.lookup("http://example.com/nested/#leaf").expect("Exists");
        assert_eq!(leaf.base().as_str(), "http://example.com/nested/");
        // Walking through the nested resource switches the base
        let walked = graph
            .lookup("http://example.com/root.json#/$defs/nested/$defs/leaf")
            .expect("Exists");
        assert_eq!(walked.base().as_str(), "http://example.com/nested/");
    }

    #[test_case(AnchorScope::Local, "http://example.com/a#item")]
    #[test_case(AnchorScope::Global, "#item")]
    fn anchor_scopes(scope: AnchorScope, expected: &str) {
        let document = json!({"$id": "http://example.com/a", "$defs": {"x": {"$anchor": "item"}}});
        let mut graph = SchemaGraph::new(scope);
        graph.add_document(None, &document).expect("Valid document");
        assert!(graph.contains(expected));
    }

    #[test]
    fn legacy_anchor_id() {
        let document = json!({"definitions": {"x": {"$id": "#item", "type": "null"}}});
        let graph = indexed(&document);
        assert!(graph.contains("json-schema:///#item"));
    }

    #[test]
    fn cross_document_references() {
        let tree = json!({
            "$id": "http://localhost:1234/tree",
            "properties": {"nodes": {"items": {"$ref": "node"}}}
        });
        let node = json!({
            "$id": "http://localhost:1234/node",
            "properties": {"subtree": {"$ref": "tree"}}
        });
        let mut graph = SchemaGraph::default();
        graph.add_document(None, &tree).expect("Valid document");
        graph.add_document(None, &node).expect("Valid document");
        graph.resolve_pending().expect("Resolvable");
        let base = Arc::new(uri::from_str("http://localhost:1234/tree").expect("Valid"));
        let resolved = graph.resolve(&base, "node").expect("Exists");
        assert!(std::ptr::eq(resolved.contents(), &node));
        assert_eq!(resolved.id(), "http://localhost:1234/node#");
    }

    #[test]
    fn explicit_key() {
        let document = json!({"type": "string"});
        let mut graph = SchemaGraph::default();
        let root = graph
            .add_document(Some("http://example.com/key.json"), &document)
            .expect("Valid document");
        assert_eq!(root, "http://example.com/key.json#");
    }

    #[test]
    fn identical_documents_are_duplicates() {
        let first = json!({"$id": "http://example.com/s", "type": "string"});
        let second = first.clone();
        let mut graph = SchemaGraph::default();
        graph.add_document(None, &first).expect("Valid document");
        let error = graph.add_document(None, &second).expect_err("Another node");
        assert!(matches!(error, Error::DuplicateId { .. }));
    }

    #[test]
    fn root_with_id_is_registered_once() {
        let document = json!({"$id": "http://example.com/s", "$defs": {"a": {"$ref": "#"}}});
        let graph = indexed(&document);
        assert!(graph.contains("http://example.com/s#"));
    }
}
