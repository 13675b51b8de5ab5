use crate::compatibility::CompatibilityProfile;
use crate::options::Options;
use crate::properties::validator::Validator;
use crate::properties::value_minifier::ValueContext;

/// Read-only state shared by every optimizer pass of one call.
pub struct OptimizeContext<'a> {
    pub options: &'a Options,
    pub validator: Validator<'a>,
}

impl<'a> OptimizeContext<'a> {
    pub fn new(options: &'a Options, profile: &'a CompatibilityProfile) -> Self {
        OptimizeContext {
            options,
            validator: Validator::new(profile),
        }
    }

    pub fn profile(&self) -> &CompatibilityProfile {
        self.validator.profile()
    }

    pub fn value_context(&self) -> ValueContext<'_, 'a> {
        ValueContext {
            validator: &self.validator,
            rounding_precision: self.options.rounding_precision,
        }
    }
}
