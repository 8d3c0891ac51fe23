//! Remote HTTP(S) import source.
//!
//! Handles directives whose `url` parses as an absolute `http` or
//! `https` URL. The response format is inferred from the `Content-Type`
//! header first, falling back to the URL's path extension. Remote
//! content is untrusted, so the sections it may contribute are
//! restricted to a narrow subset by default, and repeat imports of the
//! same URL within a directive's TTL are suppressed outright.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::directive::ImportDirective;
use crate::errors::{ResolutionError, ResolutionResult};
use crate::format::{parse_document, DocumentFormat};
use crate::fragment::Fragment;
use crate::source::{ImportSource, SectionPermit};

#[cfg(test)]
#[path = "remote_source_tests.rs"]
mod tests;

/// Sections a remote source may contribute unless explicitly widened.
const DEFAULT_REMOTE_SECTIONS: [&str; 1] = ["prompts"];

/// Import source backed by HTTP(S) GET requests.
///
/// Redirects are followed by the client's default policy. Per-request
/// headers come from the directive (`headers`), letting configurations
/// reach authenticated endpoints without the resolver knowing anything
/// about credentials.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    client: reqwest::Client,
    permitted: SectionPermit,
}

impl RemoteSource {
    /// Creates a remote source with the default section restriction.
    pub fn new() -> Self {
        Self::with_permitted_sections(SectionPermit::only(DEFAULT_REMOTE_SECTIONS))
    }

    /// Creates a remote source with an explicit section permit.
    ///
    /// Widening beyond the default is a trust decision: every section
    /// named here can be populated by whatever the remote endpoint
    /// serves.
    pub fn with_permitted_sections(permitted: SectionPermit) -> Self {
        Self {
            client: reqwest::Client::new(),
            permitted,
        }
    }

    fn parse_url(directive: &ImportDirective) -> Option<Url> {
        let url = Url::parse(directive.url.as_deref()?).ok()?;
        matches!(url.scheme(), "http" | "https").then_some(url)
    }
}

impl Default for RemoteSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImportSource for RemoteSource {
    fn supports(&self, directive: &ImportDirective, _base: &Path) -> bool {
        Self::parse_url(directive).is_some()
    }

    fn canonicalize(&self, directive: &ImportDirective, _base: &Path) -> ResolutionResult<String> {
        let url = Self::parse_url(directive).ok_or_else(|| ResolutionError::Fetch {
            locator: directive.display_locator().to_string(),
            reason: "not an absolute http(s) URL".to_string(),
            status: None,
        })?;
        Ok(url.to_string())
    }

    async fn fetch(&self, directive: &ImportDirective, _base: &Path) -> ResolutionResult<Fragment> {
        let url = Self::parse_url(directive).ok_or_else(|| ResolutionError::Fetch {
            locator: directive.display_locator().to_string(),
            reason: "not an absolute http(s) URL".to_string(),
            status: None,
        })?;
        let identity = url.to_string();
        debug!("Fetching remote import: {}", identity);

        let mut request = self.client.get(url.clone());
        for (name, value) in &directive.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(|err| ResolutionError::Fetch {
            locator: identity.clone(),
            reason: err.to_string(),
            status: err.status().map(|status| status.as_u16()),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionError::Fetch {
                locator: identity.clone(),
                reason: format!("HTTP status {}", status),
                status: Some(status.as_u16()),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await.map_err(|err| ResolutionError::Fetch {
            locator: identity.clone(),
            reason: err.to_string(),
            status: None,
        })?;

        let format = content_type
            .as_deref()
            .and_then(DocumentFormat::from_content_type)
            .or_else(|| DocumentFormat::from_path(url.path()))
            .ok_or_else(|| ResolutionError::Parse {
                locator: identity.clone(),
                format: "unknown".to_string(),
                reason: format!(
                    "could not determine format from Content-Type {:?} or URL path",
                    content_type.as_deref().unwrap_or("<absent>")
                ),
            })?;
        let sections = parse_document(&bytes, format, &identity)?;

        Ok(Fragment::new(identity, sections))
    }

    fn allowed_sections(&self) -> SectionPermit {
        self.permitted.clone()
    }

    fn reusable_within_ttl(&self) -> bool {
        true
    }
}
