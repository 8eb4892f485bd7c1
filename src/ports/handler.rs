use async_trait::async_trait;
use thiserror::Error;

use crate::core::{Request, Response};

/// Error type for handler operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HandlerError {
    /// The request could not be served because the client sent something bad
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Handler defines the port (interface) for serving a single request.
///
/// Implementations may block or await arbitrarily; each request runs on its
/// own task so a slow handler does not affect concurrent requests. Failures
/// returned here (and panics) are absorbed by the transport adapter's fault
/// boundary and mapped to a fixed error response; they never reach the
/// engine.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handle one request, producing exactly one response
    async fn handle(&self, req: Request) -> Result<Response, HandlerError>;
}

/// Plain async functions and closures are handlers.
#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Response, HandlerError>> + Send + 'static,
{
    async fn handle(&self, req: Request) -> Result<Response, HandlerError> {
        (self)(req).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::Method;

    #[tokio::test]
    async fn closures_are_handlers() {
        let handler: Arc<dyn Handler> = Arc::new(|req: Request| async move {
            Ok::<_, HandlerError>(Response::ok().with_body(req.target().to_string()))
        });

        let response = handler
            .handle(Request::new(Method::Get, "/ping"))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(&response.into_body().collect().await.unwrap()[..], b"/ping");
    }
}
