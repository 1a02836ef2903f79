use reqwest::Url;

use crate::args::HttpMethod;
use crate::catalog::ErrorVariant;

/// Fully rendered request, ready for a [`super::Transport`].
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// Set when the payload was deliberately corrupted.
    pub variant: Option<ErrorVariant>,
}
