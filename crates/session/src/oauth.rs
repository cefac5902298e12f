//! Parsing of the provider redirect into a one-shot exchange request.

use std::collections::HashMap;

use proto::{AuthError, CallbackRequest};

/// Authorization code + state taken from the redirect URL. Consumed by value
/// when exchanged, so a request can be sent at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct OAuthExchangeRequest {
    code: String,
    state: Option<String>,
}

impl OAuthExchangeRequest {
    /// Parses a full redirect URL (`http://host/oauth/callback?code=..&state=..`),
    /// a bare path with query, or a bare query string.
    ///
    /// A missing or blank `code` is [`AuthError::NoCode`]; a provider `error`
    /// parameter without a code is [`AuthError::Provider`].
    pub fn from_redirect_url(url: &str) -> Result<Self, AuthError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AuthError::MalformedRedirect("empty redirect URL".to_string()));
        }
        let params = parse_query_params(url)?;
        Self::from_params(&params)
    }

    /// Builds a request from already-decoded query parameters.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, AuthError> {
        let code = params.get("code").map(|c| c.trim()).unwrap_or("");
        if !code.is_empty() {
            let state = params
                .get("state")
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(String::from);
            return Ok(Self {
                code: code.to_string(),
                state,
            });
        }

        if let Some(error) = params.get("error") {
            let description = params
                .get("error_description")
                .cloned()
                .unwrap_or_default();
            return Err(AuthError::Provider {
                error: error.clone(),
                description,
            });
        }
        Err(AuthError::NoCode)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Converts into the callback body; the request is gone afterwards.
    pub fn into_body(self) -> CallbackRequest {
        CallbackRequest {
            code: self.code,
            state: self.state,
        }
    }
}

/// Extracts and percent-decodes the query parameters of a URL or query string.
/// The fragment is ignored; the first occurrence of a key wins.
pub fn parse_query_params(url: &str) -> Result<HashMap<String, String>, AuthError> {
    let without_fragment = url.split_once('#').map_or(url, |(head, _)| head);
    let query = match without_fragment.split_once('?') {
        Some((_, query)) => query,
        None if without_fragment.contains('=') && !without_fragment.contains('/') => {
            without_fragment
        }
        None => "",
    };

    let mut params = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = percent_decode(key)?;
        let value = percent_decode(value)?;
        params.entry(key).or_insert(value);
    }
    Ok(params)
}

/// Percent-decodes a query-string component (`%XX` sequences and `+` → space).
fn percent_decode(s: &str) -> Result<String, AuthError> {
    let mut out = Vec::with_capacity(s.len());
    let mut bytes = s.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'%' => {
                let hex = [bytes.next(), bytes.next()];
                let byte = match hex {
                    [Some(h1), Some(h2)] => std::str::from_utf8(&[h1, h2])
                        .ok()
                        .and_then(|h| u8::from_str_radix(h, 16).ok()),
                    _ => None,
                };
                let byte = byte.ok_or_else(|| {
                    AuthError::MalformedRedirect(format!("invalid percent-escape in {s:?}"))
                })?;
                out.push(byte);
            }
            b'+' => out.push(b' '),
            other => out.push(other),
        }
    }
    String::from_utf8(out)
        .map_err(|_| AuthError::MalformedRedirect(format!("non UTF-8 value in {s:?}")))
}
