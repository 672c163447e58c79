//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod book_handlers;
mod session_handlers;

pub use book_handlers::*;
pub use session_handlers::*;
