//! Serving recorded interactions back to a replay session

mod resolver;
mod table;

pub use resolver::{resolver_fn, ResolveMock, SequentialResolver};
pub use table::MockTable;
