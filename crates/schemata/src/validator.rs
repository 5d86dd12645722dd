//! The compiled validator and the trait every keyword validator implements.
use serde_json::Value;

use crate::{
    error::{ValidationError, ValidationErrors},
    node::{ObjectId, SchemaNode},
    paths::{LazyLocation, Location},
};

/// Keyword validators are compiled once and then shared between threads.
///
/// `is_valid` answers the question as fast as possible. `validate` additionally records every
/// violation it finds in the context, so it must not short-circuit on the first failure.
pub(crate) trait Validate: Send + Sync {
    fn is_valid(&self, instance: &Value, ctx: &ValidationContext<'_>) -> bool;

    fn validate(
        &self,
        instance: &Value,
        location: &LazyLocation<'_>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool;
}

pub(crate) type BoxedValidator = Box<dyn Validate>;

/// State of one validation call: the object table and the errors reported so far.
///
/// A fresh context is created by every call, so concurrent calls never share errors.
pub(crate) struct ValidationContext<'v> {
    objects: &'v [SchemaNode],
    pub(crate) errors: Vec<ValidationError>,
}

impl<'v> ValidationContext<'v> {
    pub(crate) fn new(objects: &'v [SchemaNode]) -> Self {
        ValidationContext {
            objects,
            errors: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn object(&self, id: ObjectId) -> &'v SchemaNode {
        &self.objects[id.index()]
    }
}

/// A compiled schema.
///
/// ```
/// use serde_json::json;
///
/// let validator = schemata::compile(&json!({"type": "integer", "minimum": 1}))
///     .expect("Valid schema");
/// assert!(validator.is_valid(&json!(3)));
/// assert!(!validator.is_valid(&json!(0)));
/// ```
pub struct Validator {
    objects: Box<[SchemaNode]>,
    locations: Box<[Location]>,
    root: ObjectId,
}

impl Validator {
    pub(crate) fn new(objects: Box<[SchemaNode]>, locations: Box<[Location]>, root: ObjectId) -> Self {
        Validator {
            objects,
            locations,
            root,
        }
    }

    /// Run validation against `instance` but return a boolean result instead of an iterator.
    /// It is useful for cases, where it is important to only know the fact if the data is valid
    /// or not. This approach is much faster, than [`Validator::validate`].
    #[must_use]
    #[inline]
    pub fn is_valid(&self, instance: &Value) -> bool {
        let ctx = ValidationContext::new(&self.objects);
        self.root.is_valid(instance, &ctx)
    }

    /// Validate `instance` and collect every violation.
    ///
    /// # Errors
    ///
    /// All violations found, in the order they were reported.
    pub fn validate(&self, instance: &Value) -> Result<(), ValidationErrors> {
        let mut ctx = ValidationContext::new(&self.objects);
        if self.root.validate(instance, &LazyLocation::new(), &mut ctx) {
            Ok(())
        } else {
            Err(ValidationErrors::new(ctx.errors))
        }
    }

    /// Iterate over the violations found in `instance`.
    pub fn iter_errors(&self, instance: &Value) -> impl Iterator<Item = ValidationError> {
        self.validate(instance).err().into_iter().flatten()
    }

    /// Structural paths of all compiled objects, in compilation order.
    #[must_use]
    pub fn schema_locations(&self) -> &[Location] {
        &self.locations
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("objects", &self.objects.len())
            .field("root", &self.locations.get(self.root.index()))
            .finish()
    }
}
