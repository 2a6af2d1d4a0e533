//! Query expressions, evaluation and the paging pipeline.

mod engine;
mod eval;
mod expr;
mod info;
mod path;

pub use engine::{NavigationResponse, QueryEngine, ResultPage};
pub use eval::Evaluator;
pub use expr::{BinaryOp, Direction, Expr, Function, OrderBy, PropertyPath};
pub use info::{InlineCount, QueryInfo};
pub use path::SelectExpandState;
