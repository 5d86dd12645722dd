use serde_json::Value;

use crate::{
    evaluation::ErrorHandler,
    paths::LazyLocation,
    validator::{BoxedValidator, ValidationContext},
};

/// Index of a compiled object in the validator's object table.
///
/// Keyword validators refer to their subschemas through this index, which is what lets a `$ref`
/// point at an object that is still being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ObjectId(usize);

impl ObjectId {
    pub(crate) fn new(idx: usize) -> Self {
        ObjectId(idx)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }

    #[inline]
    pub(crate) fn is_valid(self, instance: &Value, ctx: &ValidationContext<'_>) -> bool {
        ctx.object(self).is_valid(instance, ctx)
    }

    #[inline]
    pub(crate) fn validate(
        self,
        instance: &Value,
        location: &LazyLocation<'_>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        ctx.object(self).validate(instance, location, ctx)
    }
}

/// The predicate of one compiled object.
pub(crate) enum SchemaNode {
    True,
    False(ErrorHandler),
    /// A `$ref` node. Its siblings are ignored.
    Ref(ObjectId),
    Keywords(Keywords),
}

/// Keyword validators of a node with the common small sizes unrolled.
pub(crate) enum Keywords {
    One(BoxedValidator),
    Two([BoxedValidator; 2]),
    Three([BoxedValidator; 3]),
    Many(Box<[BoxedValidator]>),
}

impl SchemaNode {
    pub(crate) fn from_validators(mut validators: Vec<BoxedValidator>) -> SchemaNode {
        let keywords = match validators.len() {
            0 => None,
            1 => validators.pop().map(Keywords::One),
            2 => <[_; 2]>::try_from(validators).ok().map(Keywords::Two),
            3 => <[_; 3]>::try_from(validators).ok().map(Keywords::Three),
            _ => Some(Keywords::Many(validators.into_boxed_slice())),
        };
        keywords.map_or(SchemaNode::True, SchemaNode::Keywords)
    }

    /// Whether `instance` is valid. Stops at the first failing keyword and records nothing.
    #[inline]
    pub(crate) fn is_valid(&self, instance: &Value, ctx: &ValidationContext<'_>) -> bool {
        match self {
            SchemaNode::True => true,
            SchemaNode::False(_) => false,
            SchemaNode::Ref(target) => target.is_valid(instance, ctx),
            SchemaNode::Keywords(Keywords::One(first)) => first.is_valid(instance, ctx),
            SchemaNode::Keywords(Keywords::Two([first, second])) => {
                first.is_valid(instance, ctx) && second.is_valid(instance, ctx)
            }
            SchemaNode::Keywords(Keywords::Three([first, second, third])) => {
                first.is_valid(instance, ctx)
                    && second.is_valid(instance, ctx)
                    && third.is_valid(instance, ctx)
            }
            SchemaNode::Keywords(Keywords::Many(validators)) => {
                validators.iter().all(|v| v.is_valid(instance, ctx))
            }
        }
    }

    /// Whether `instance` is valid. Every keyword runs so all violations get recorded.
    pub(crate) fn validate(
        &self,
        instance: &Value,
        location: &LazyLocation<'_>,
        ctx: &mut ValidationContext<'_>,
    ) -> bool {
        match self {
            SchemaNode::True => true,
            SchemaNode::False(handler) => handler.report(ctx, instance, location),
            SchemaNode::Ref(target) => target.validate(instance, location, ctx),
            SchemaNode::Keywords(Keywords::One(first)) => first.validate(instance, location, ctx),
            SchemaNode::Keywords(Keywords::Two([first, second])) => {
                let first = first.validate(instance, location, ctx);
                second.validate(instance, location, ctx) && first
            }
            SchemaNode::Keywords(Keywords::Three([first, second, third])) => {
                let first = first.validate(instance, location, ctx);
                let second = second.validate(instance, location, ctx);
                third.validate(instance, location, ctx) && first && second
            }
            SchemaNode::Keywords(Keywords::Many(validators)) => {
                let mut valid = true;
                for validator in validators.iter() {
                    valid &= validator.validate(instance, location, ctx);
                }
                valid
            }
        }
    }
}
