use thiserror::Error;

/// Errors that abort a minify call.
///
/// Malformed but parseable CSS never ends up here; it is reported through
/// [`Warnings`] and the offending fragment is dropped instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MinifyError {
    #[error("nesting depth exceeds {limit} levels at {position}")]
    NestingTooDeep { limit: usize, position: String },

    #[error("input of {size} bytes exceeds the {limit} byte limit")]
    InputTooLarge { size: usize, limit: usize },

    #[error("invalid compatibility setting `{0}`")]
    InvalidCompatibility(String),
}

/// Collects non-fatal parse warnings for one minify call.
#[derive(Debug, Default, Clone)]
pub struct Warnings {
    messages: Vec<String>,
}

impl Warnings {
    pub fn new() -> Self {
        Warnings {
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.messages.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.messages.iter()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MinifyError::InputTooLarge { size: 10, limit: 5 };
        assert_eq!(err.to_string(), "input of 10 bytes exceeds the 5 byte limit");
    }

    #[test]
    fn test_warnings_collect_in_order() {
        let mut warnings = Warnings::new();
        warnings.push("first");
        warnings.push(String::from("second"));
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings.into_vec(), vec!["first", "second"]);
    }
}
