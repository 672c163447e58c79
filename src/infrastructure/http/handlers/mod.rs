//! HTTP Handlers

mod book;
mod ping;
mod session;
mod websocket;

pub use book::*;
pub use ping::*;
pub use session::*;
pub use websocket::*;
