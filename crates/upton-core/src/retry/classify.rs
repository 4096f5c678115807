//! Classify HTTP status and curl errors into fetch error kinds.

use crate::error::FetchError;
use crate::retry::policy::ErrorKind;

/// Classify an HTTP status code.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        404 => ErrorKind::NotFound,
        408 => ErrorKind::Timeout,
        500 => ErrorKind::ServerError,
        503 => ErrorKind::ServiceUnavailable,
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_url_malformed() || e.is_unsupported_protocol() {
        return ErrorKind::InvalidUri;
    }
    ErrorKind::Other
}

/// Classify any fetch error.
pub fn classify(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::Curl(ce) => classify_curl_error(ce),
        FetchError::Http(code) => classify_http_status(*code),
        FetchError::InvalidUri(_) => ErrorKind::InvalidUri,
        FetchError::Timeout => ErrorKind::Timeout,
        FetchError::Transport(_) => ErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_statuses() {
        assert_eq!(classify_http_status(404), ErrorKind::NotFound);
        assert_eq!(classify_http_status(500), ErrorKind::ServerError);
        assert_eq!(classify_http_status(503), ErrorKind::ServiceUnavailable);
    }

    #[test]
    fn request_timeout_status_is_retried() {
        assert_eq!(classify_http_status(408), ErrorKind::Timeout);
    }

    #[test]
    fn other_statuses_are_fatal() {
        assert_eq!(classify_http_status(403), ErrorKind::Other);
        assert_eq!(classify_http_status(502), ErrorKind::Other);
        assert_eq!(classify_http_status(429), ErrorKind::Other);
    }

    #[test]
    fn curl_codes() {
        // CURLE_OPERATION_TIMEDOUT = 28, CURLE_URL_MALFORMAT = 3, CURLE_COULDNT_CONNECT = 7
        assert_eq!(classify_curl_error(&curl::Error::new(28)), ErrorKind::Timeout);
        assert_eq!(classify_curl_error(&curl::Error::new(3)), ErrorKind::InvalidUri);
        assert_eq!(classify_curl_error(&curl::Error::new(7)), ErrorKind::Other);
    }

    #[test]
    fn fetch_error_variants() {
        assert_eq!(classify(&FetchError::Timeout), ErrorKind::Timeout);
        assert_eq!(
            classify(&FetchError::InvalidUri("::".into())),
            ErrorKind::InvalidUri
        );
        assert_eq!(
            classify(&FetchError::Transport("reset".into())),
            ErrorKind::Other
        );
    }
}
