use std::fmt;

/// Classification bucket for a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Online,
    Redirect,
    ClientError,
    ServerError,
    UnknownStatus,
    SSLError,
    Timeout,
    ConnectionFailed,
    OtherError,
}

impl Category {
    /// Maps the final HTTP status code of a response to its category.
    pub fn from_status(code: u16) -> Self {
        match code {
            200..=299 => Category::Online,
            300..=399 => Category::Redirect,
            400..=499 => Category::ClientError,
            500..=599 => Category::ServerError,
            _ => Category::UnknownStatus,
        }
    }

    /// True for the categories that mean no HTTP response was received.
    pub fn is_network_failure(self) -> bool {
        matches!(
            self,
            Category::SSLError
                | Category::Timeout
                | Category::ConnectionFailed
                | Category::OtherError
        )
    }

    fn name(self) -> &'static str {
        match self {
            Category::Online => "Online",
            Category::Redirect => "Redirect",
            Category::ClientError => "Client Error",
            Category::ServerError => "Server Error",
            Category::UnknownStatus => "Unknown",
            Category::SSLError => "SSL Error",
            Category::Timeout => "Timeout",
            Category::ConnectionFailed => "Connection Failed",
            Category::OtherError => "Error",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one probe. Created fresh for every batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    /// The URL actually requested, after scheme normalization.
    pub url: String,
    pub category: Category,
    /// Present whenever an HTTP response was received.
    pub status_code: Option<u16>,
    pub response_time_ms: f64,
    /// Short failure description, only set for `Category::OtherError`.
    pub error: Option<String>,
}

impl ProbeOutcome {
    pub fn from_status(url: impl Into<String>, code: u16, response_time_ms: f64) -> Self {
        ProbeOutcome {
            url: url.into(),
            category: Category::from_status(code),
            status_code: Some(code),
            response_time_ms,
            error: None,
        }
    }

    pub fn failure(url: impl Into<String>, category: Category, response_time_ms: f64) -> Self {
        ProbeOutcome {
            url: url.into(),
            category,
            status_code: None,
            response_time_ms,
            error: None,
        }
    }

    pub fn other_error(
        url: impl Into<String>,
        description: impl Into<String>,
        response_time_ms: f64,
    ) -> Self {
        ProbeOutcome {
            url: url.into(),
            category: Category::OtherError,
            status_code: None,
            response_time_ms,
            error: Some(description.into()),
        }
    }

    /// Human label such as `Client Error (404)` or `Error: builder error`.
    pub fn display_label(&self) -> String {
        match (self.category, self.status_code, &self.error) {
            (Category::Online, _, _) => Category::Online.to_string(),
            (Category::OtherError, _, Some(description)) => format!("Error: {description}"),
            (category, Some(code), _) => format!("{category} ({code})"),
            (category, None, _) => category.to_string(),
        }
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_status_ranges() {
        assert_eq!(Category::from_status(200), Category::Online);
        assert_eq!(Category::from_status(299), Category::Online);
        assert_eq!(Category::from_status(301), Category::Redirect);
        assert_eq!(Category::from_status(404), Category::ClientError);
        assert_eq!(Category::from_status(503), Category::ServerError);
        assert_eq!(Category::from_status(199), Category::UnknownStatus);
        assert_eq!(Category::from_status(600), Category::UnknownStatus);
    }

    #[test]
    fn test_display_labels() {
        let online = ProbeOutcome::from_status("https://a.test", 204, 12.5);
        assert_eq!(online.display_label(), "Online");

        let not_found = ProbeOutcome::from_status("https://a.test", 404, 12.5);
        assert_eq!(not_found.display_label(), "Client Error (404)");

        let odd = ProbeOutcome::from_status("https://a.test", 799, 1.0);
        assert_eq!(odd.display_label(), "Unknown (799)");

        let timeout = ProbeOutcome::failure("https://a.test", Category::Timeout, 5000.0);
        assert_eq!(timeout.display_label(), "Timeout");

        let other = ProbeOutcome::other_error("https://a.test", "builder error", 0.0);
        assert_eq!(other.display_label(), "Error: builder error");
    }

    #[test]
    fn test_network_failures_have_no_status() {
        let refused = ProbeOutcome::failure("https://a.test", Category::ConnectionFailed, 3.0);
        assert!(refused.category.is_network_failure());
        assert_eq!(refused.status_code, None);
        assert!(!Category::ClientError.is_network_failure());
    }
}
