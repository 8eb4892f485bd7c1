pub mod handler;
pub mod http_server;

pub use handler::{Handler, HandlerError};
pub use http_server::HttpServer;
