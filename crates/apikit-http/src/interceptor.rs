//! Request and response interceptors
//!
//! Interceptors run in registration order, each receiving the output of the
//! previous one. Plain closures implement both traits; anything that needs to
//! await implements the trait directly:
//!
//! ```rust,ignore
//! struct SignRequest { signer: Arc<Signer> }
//!
//! #[async_trait]
//! impl RequestInterceptor for SignRequest {
//!     async fn intercept(&self, request: RequestDescriptor) -> RequestDescriptor {
//!         let signature = self.signer.sign(&request.url).await;
//!         request.with_header("X-Signature", signature)
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::{request::RequestDescriptor, response::RawResponse};

/// Rewrites a request before it is sent
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn intercept(&self, request: RequestDescriptor) -> RequestDescriptor;
}

/// Rewrites a raw response before its status is inspected
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    async fn intercept(&self, response: RawResponse) -> RawResponse;
}

#[async_trait]
impl<F> RequestInterceptor for F
where
    F: Fn(RequestDescriptor) -> RequestDescriptor + Send + Sync,
{
    async fn intercept(&self, request: RequestDescriptor) -> RequestDescriptor {
        self(request)
    }
}

#[async_trait]
impl<F> ResponseInterceptor for F
where
    F: Fn(RawResponse) -> RawResponse + Send + Sync,
{
    async fn intercept(&self, response: RawResponse) -> RawResponse {
        self(response)
    }
}
