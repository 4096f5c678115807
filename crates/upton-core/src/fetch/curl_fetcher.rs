//! Blocking GET through libcurl.

use std::time::Duration;

use super::ResourceFetcher;
use crate::config::HttpConfig;
use crate::error::FetchError;

/// [`ResourceFetcher`] backed by a fresh curl easy handle per request.
///
/// Bodies are decoded as UTF-8. Pages in other encodings (e.g. Latin-1) have
/// invalid sequences replaced with U+FFFD before they reach the cache.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    http: HttpConfig,
}

impl CurlFetcher {
    pub fn new(http: HttpConfig) -> Self {
        Self { http }
    }

    fn configure(&self, easy: &mut curl::easy::Easy, uri: &str) -> Result<(), curl::Error> {
        easy.url(uri)?;
        easy.get(true)?;
        easy.follow_location(self.http.follow_redirects)?;
        easy.max_redirections(self.http.max_redirections)?;
        easy.connect_timeout(Duration::from_secs(self.http.connect_timeout_secs))?;
        if self.http.timeout_secs > 0 {
            easy.timeout(Duration::from_secs(self.http.timeout_secs))?;
        }
        if let Some(ua) = &self.http.user_agent {
            easy.useragent(ua)?;
        }
        Ok(())
    }
}

impl ResourceFetcher for CurlFetcher {
    fn fetch(&self, uri: &str) -> Result<String, FetchError> {
        url::Url::parse(uri).map_err(|e| FetchError::InvalidUri(format!("{}: {}", uri, e)))?;

        let mut body: Vec<u8> = Vec::new();
        let mut easy = curl::easy::Easy::new();
        self.configure(&mut easy, uri)?;
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }
        Ok(decode_body(uri, body))
    }
}

fn decode_body(uri: &str, body: Vec<u8>) -> String {
    match String::from_utf8(body) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(
                uri,
                valid_up_to = e.utf8_error().valid_up_to(),
                "body is not valid UTF-8; replacing invalid sequences"
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}
