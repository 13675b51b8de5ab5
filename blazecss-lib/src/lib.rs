//! A CSS minifier: tokenizes a stylesheet, optimizes values, shorthands and
//! rules without changing what it means, and writes it back out compactly.

pub mod blaze_minify;
pub mod compatibility;
pub mod context;
pub mod error;
pub mod options;
pub mod properties;
pub mod selectors;
pub mod stringifier;
pub mod text;
pub mod tokenizer;
pub mod tree;

pub use blaze_minify::blaze_css::{minify, minify_sources, try_minify, try_minify_sources, MinifyOutput};
pub use compatibility::CompatibilityProfile;
pub use error::MinifyError;
pub use options::{Compatibility, KeepSpecialComments, Limits, Options};
