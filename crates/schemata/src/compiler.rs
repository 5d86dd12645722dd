//! The compilation root.
//!
//! Every compiled object lives in one slot table and is addressed by its structural path. A
//! `$ref` compiles to an indirection through the slot of its target. When the target was not
//! compiled yet, its slot is reserved and the target is queued, so a reference that leads back
//! into an object under construction finds the reserved slot instead of recursing.
use std::{cell::RefCell, collections::VecDeque, rc::Rc, sync::Arc};

use ahash::AHashMap;
use referencing::{uri, Resolved, SchemaGraph, Uri};
use serde_json::{Map, Value};

use crate::{
    error::{CompileError, Keyword},
    evaluation::ErrorHandler,
    formats::Formats,
    keywords,
    node::{ObjectId, SchemaNode},
    options::{Compiler, PatternEngine},
    paths::{Location, LocationSegment},
    regex::Pattern,
    validator::Validator,
};

/// Shared state of one compilation.
struct Root<'a> {
    graph: SchemaGraph<'a>,
    objects: Vec<Option<SchemaNode>>,
    locations: Vec<Location>,
    cache: AHashMap<Location, ObjectId>,
    deferred: VecDeque<Deferred<'a>>,
}

/// A `$ref` target whose slot is reserved but not compiled yet.
struct Deferred<'a> {
    id: ObjectId,
    location: Location,
    target: Resolved<'a>,
}

impl<'a> Root<'a> {
    fn new(graph: SchemaGraph<'a>) -> Self {
        Root {
            graph,
            objects: Vec::new(),
            locations: Vec::new(),
            cache: AHashMap::new(),
            deferred: VecDeque::new(),
        }
    }

    fn create_object(&mut self, location: Location) -> Result<ObjectId, CompileError> {
        if self.cache.contains_key(&location) {
            return Err(CompileError::ObjectAlreadyCreated { location });
        }
        let id = ObjectId::new(self.objects.len());
        self.objects.push(None);
        self.locations.push(location.clone());
        self.cache.insert(location, id);
        Ok(id)
    }

    fn finish(&mut self) -> Result<(Box<[SchemaNode]>, Box<[Location]>), CompileError> {
        let locations = std::mem::take(&mut self.locations);
        let objects = std::mem::take(&mut self.objects)
            .into_iter()
            .zip(&locations)
            .map(|(node, location)| {
                node.ok_or_else(|| CompileError::UnboundReference {
                    location: location.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        check_reference_cycles(&objects, &locations)?;
        Ok((objects.into_boxed_slice(), locations.into_boxed_slice()))
    }
}

/// A chain of `$ref` nodes that never reaches a node with keywords would loop forever.
fn check_reference_cycles(objects: &[SchemaNode], locations: &[Location]) -> Result<(), CompileError> {
    for (start, node) in objects.iter().enumerate() {
        let SchemaNode::Ref(mut target) = node else {
            continue;
        };
        let mut steps = 0;
        while let SchemaNode::Ref(next) = &objects[target.index()] {
            steps += 1;
            if target.index() == start || steps > objects.len() {
                return Err(CompileError::CircularReference {
                    location: locations[start].clone(),
                });
            }
            target = *next;
        }
    }
    Ok(())
}

/// Compilation context of a single schema object.
pub(crate) struct Context<'a> {
    root: Rc<RefCell<Root<'a>>>,
    config: &'a Compiler,
    base: Arc<Uri<String>>,
    location: Location,
}

impl<'a> Context<'a> {
    /// Context for a subschema found under `segment` of the current object.
    #[must_use]
    pub(crate) fn new_at_location<'s>(&self, segment: impl Into<LocationSegment<'s>>) -> Self {
        Context {
            root: Rc::clone(&self.root),
            config: self.config,
            base: Arc::clone(&self.base),
            location: self.location.join(segment),
        }
    }

    pub(crate) fn location(&self) -> &Location {
        &self.location
    }

    pub(crate) fn formats(&self) -> &Formats {
        &self.config.formats
    }

    pub(crate) fn validate_formats(&self) -> bool {
        self.config.validate_formats
    }

    pub(crate) fn pattern_engine(&self) -> PatternEngine {
        self.config.pattern_engine
    }

    /// Error handler for `keyword` of the current object.
    pub(crate) fn error_handler(&self, keyword: &'static str, expected: Value) -> ErrorHandler {
        ErrorHandler::new(self.location.join(keyword), Keyword::Single(keyword), expected)
    }

    /// Error handler for keywords that fail together. Located at the last one.
    pub(crate) fn error_handler_for(
        &self,
        keywords: &'static [&'static str],
        expected: Value,
    ) -> ErrorHandler {
        let location = keywords
            .last()
            .map_or_else(|| self.location.clone(), |keyword| self.location.join(*keyword));
        ErrorHandler::new(location, Keyword::Set(keywords), expected)
    }

    pub(crate) fn invalid_keyword(&self, keyword: &'static str, reason: impl Into<String>) -> CompileError {
        CompileError::invalid_keyword(self.location.join(keyword), keyword, reason)
    }

    pub(crate) fn compile_pattern(&self, keyword: &'static str, pattern: &str) -> Result<Pattern, CompileError> {
        Pattern::new(pattern, self.pattern_engine()).map_err(|reason| self.invalid_keyword(keyword, reason))
    }

    fn with_base(&self, base: Arc<Uri<String>>) -> Self {
        Context {
            root: Rc::clone(&self.root),
            config: self.config,
            base,
            location: self.location.clone(),
        }
    }

    fn cached(&self) -> Option<ObjectId> {
        self.root.borrow().cache.get(&self.location).copied()
    }

    fn create_object(&self) -> Result<ObjectId, CompileError> {
        self.root.borrow_mut().create_object(self.location.clone())
    }

    fn bind(&self, id: ObjectId, node: SchemaNode) {
        self.root.borrow_mut().objects[id.index()] = Some(node);
    }

    /// Make the resource declared by an `$id` reachable through its canonical identifier too.
    fn alias(&self, id: ObjectId) {
        let key = Location::resource(&uri::canonical(&self.base, ""));
        self.root.borrow_mut().cache.entry(key).or_insert(id);
    }

    /// Find the object a `$ref` points to, reserving its slot if it was not compiled yet.
    fn resolve_reference(&self, reference: &str) -> Result<ObjectId, CompileError> {
        let mut root = self.root.borrow_mut();
        let target = root.graph.resolve(&self.base, reference)?;
        let location = Location::resource(target.id());
        if let Some(id) = root.cache.get(&location) {
            return Ok(*id);
        }
        let id = root.create_object(location.clone())?;
        tracing::trace!(reference, target = %location, "Deferred reference");
        root.deferred.push_back(Deferred {
            id,
            location,
            target,
        });
        Ok(id)
    }

    fn next_deferred(&self) -> Option<Deferred<'a>> {
        self.root.borrow_mut().deferred.pop_front()
    }

    /// Compile every queued `$ref` target. Compiling one may queue more.
    fn bind_deferred(&self) -> Result<usize, CompileError> {
        let mut count = 0;
        while let Some(Deferred {
            id,
            location,
            target,
        }) = self.next_deferred()
        {
            let (contents, base, _) = target.into_parts();
            let ctx = Context {
                root: Rc::clone(&self.root),
                config: self.config,
                base,
                location,
            };
            let node = compile_node(&ctx, contents, id)?;
            ctx.bind(id, node);
            count += 1;
        }
        Ok(count)
    }
}

/// Compile `schema` at the current location, or return the object already compiled there.
pub(crate) fn compile<'a>(ctx: &Context<'a>, schema: &'a Value) -> Result<ObjectId, CompileError> {
    if let Some(id) = ctx.cached() {
        return Ok(id);
    }
    let id = ctx.create_object()?;
    let node = compile_node(ctx, schema, id)?;
    ctx.bind(id, node);
    Ok(id)
}

fn compile_node<'a>(ctx: &Context<'a>, schema: &'a Value, id: ObjectId) -> Result<SchemaNode, CompileError> {
    match schema {
        Value::Bool(true) => Ok(SchemaNode::True),
        Value::Bool(false) => Ok(SchemaNode::False(ErrorHandler::new(
            ctx.location.clone(),
            Keyword::Single("false"),
            Value::Bool(false),
        ))),
        Value::Object(map) => {
            if let Some(declared) = map.get("$id").and_then(Value::as_str) {
                if let uri::Identifier::Resource(base) = uri::resolve_id(&ctx.base, declared)? {
                    let ctx = ctx.with_base(base);
                    ctx.alias(id);
                    return compile_object(&ctx, map);
                }
            }
            compile_object(ctx, map)
        }
        _ => Err(CompileError::InvalidSchema {
            location: ctx.location.clone(),
            value: schema.clone(),
        }),
    }
}

fn compile_object<'a>(ctx: &Context<'a>, schema: &'a Map<String, Value>) -> Result<SchemaNode, CompileError> {
    if let Some(reference) = schema.get("$ref") {
        let Value::String(reference) = reference else {
            return Err(ctx.invalid_keyword("$ref", "must be a string"));
        };
        return Ok(SchemaNode::Ref(ctx.resolve_reference(reference)?));
    }
    let validators = keywords::compile(ctx, schema)?;
    tracing::trace!(location = %ctx.location, keywords = validators.len(), "Compiled object");
    Ok(SchemaNode::from_validators(validators))
}

/// Index the documents, compile the root schema and everything it references.
pub(crate) fn build(config: &Compiler, schema: &Value, auxiliary: &[Value]) -> Result<Validator, CompileError> {
    let mut graph = SchemaGraph::new(config.anchor_scope);
    let root_id = graph.add_document(None, schema)?;
    for document in &config.schemas {
        // A registered copy of the compiled document is the root itself
        if document.key.is_none() && document.contents == *schema {
            continue;
        }
        graph.add_document(document.key.as_deref(), &document.contents)?;
    }
    for document in auxiliary {
        if !document.get("$id").is_some_and(Value::is_string) {
            return Err(referencing::Error::MissingKey.into());
        }
        if document == schema {
            continue;
        }
        graph.add_document(None, document)?;
    }
    graph.resolve_pending()?;
    let resolved = graph.lookup(&root_id)?;
    let root = Rc::new(RefCell::new(Root::new(graph)));
    let ctx = Context {
        root: Rc::clone(&root),
        config,
        base: Arc::clone(resolved.base()),
        location: Location::resource(&root_id),
    };
    let entry = compile(&ctx, resolved.contents())?;
    let deferred = ctx.bind_deferred()?;
    drop(ctx);
    let (objects, locations) = root.borrow_mut().finish()?;
    tracing::debug!(
        root = %root_id,
        objects = objects.len(),
        deferred,
        "Compiled schema"
    );
    Ok(Validator::new(objects, locations, entry))
}
