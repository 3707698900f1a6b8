use std::{fmt, time::Duration};

use url::Url;

use crate::errors::Result;

/// Per-connection settings a transport needs to carry out one exchange.
///
/// Built by [`crate::ConnectionConfig::request_context`] with `${VAR}`
/// references in the credentials already resolved.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub account_name: String,
    pub password: String,
    /// Redirects to follow before giving up.
    pub max_redirects: u32,
    pub timeout: Duration,
}

impl RequestContext {
    /// Whether basic authentication should be sent.
    pub fn has_credentials(&self) -> bool {
        !self.account_name.is_empty()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("account_name", &self.account_name)
            .field("password", &"<redacted>")
            .field("max_redirects", &self.max_redirects)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Request/response seam between the object model and the network.
///
/// Implementations own TLS, redirect following, basic authentication and
/// timeouts, all driven by the [`RequestContext`]. They hand back the
/// complete response body; HTTP failures should be reported with
/// [`crate::FmError::from_status`].
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// POSTs a form-encoded `body` to the XML gateway at `url`.
    async fn post(&self, url: &Url, body: String, context: &RequestContext) -> Result<Vec<u8>>;
}

impl<T> Transport for &T
where
    T: Transport + ?Sized,
{
    async fn post(&self, url: &Url, body: String, context: &RequestContext) -> Result<Vec<u8>> {
        (**self).post(url, body, context).await
    }
}
