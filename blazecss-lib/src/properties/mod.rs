//! Declaration-level optimizations: value minification and the shorthand
//! algebra.

pub mod break_up;
pub mod can_override;
pub mod colors;
pub mod compactable;
pub mod optimizer;
pub mod override_compactor;
pub mod restore;
pub mod shorthand_compactor;
pub mod validator;
pub mod value_minifier;
pub mod wrap;
