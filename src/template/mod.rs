//! Template trees: reference discovery, naming, and substitution.

pub mod apply;
pub mod ids;
pub mod logical;
pub mod naming;
pub mod path;
pub mod references;

pub use apply::apply_at;
pub use naming::{CollisionPolicy, ParameterNamer};
pub use references::find_references;
