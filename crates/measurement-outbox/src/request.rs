//! GET/POST shape of a tracking request.

use url::Url;

/// Longest absolute URI sent as a GET. Longer requests are POSTed.
pub const MAX_GET_URI_LENGTH: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
}

/// A request ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingRequest {
    pub method: RequestMethod,
    pub url: Url,
    /// Form-encoded query string for POST requests.
    pub body: Option<String>,
}

impl TrackingRequest {
    /// Shape `uri` as a GET, or as a POST of its query string to the
    /// query-less URI when it is longer than [`MAX_GET_URI_LENGTH`].
    pub fn from_uri(uri: &Url) -> Self {
        if uri.as_str().len() <= MAX_GET_URI_LENGTH {
            return Self {
                method: RequestMethod::Get,
                url: uri.clone(),
                body: None,
            };
        }

        let body = uri.query().unwrap_or_default().to_string();
        let mut url = uri.clone();
        url.set_query(None);

        Self {
            method: RequestMethod::Post,
            url,
            body: Some(body),
        }
    }
}
