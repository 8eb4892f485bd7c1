pub mod body;
pub mod headers;
pub mod message;
pub mod method;

pub use body::{Body, BodyError};
pub use headers::Headers;
pub use message::{Request, RequestSource, Response, Scheme};
pub use method::{InvalidMethod, Method};
