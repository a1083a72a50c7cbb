//! The compiler between action templates and tool definitions.

pub mod canonical;
pub mod export;
pub mod invoke;
pub mod repository;
pub mod scan;
pub mod spec;
pub mod workflow;

pub use export::ToolCatalog;
pub use invoke::invoke;
pub use repository::ToolRepository;
pub use spec::ShortcutSpecGenerator;
pub use workflow::build_dispatch_workflow;
