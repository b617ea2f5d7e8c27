//! User-facing error message formatting.
//!
//! Uses typed error matching (ureq errors, serde_json categories,
//! io::ErrorKind) rather than string parsing to produce one-line messages.

use std::io;

/// Format an HTTP error from the data fetch.
#[cfg(feature = "http")]
pub fn user_message_from_ureq(err: &ureq::Error) -> String {
    match err {
        ureq::Error::Status(code, response) => format!(
            "Server returned {} {}. Check the URL.",
            code,
            response.status_text()
        ),
        ureq::Error::Transport(t) => match t.kind() {
            ureq::ErrorKind::Dns => "Could not resolve the host name.".to_string(),
            ureq::ErrorKind::ConnectionFailed => {
                "Could not connect. Is the Datasette server running?".to_string()
            }
            ureq::ErrorKind::TooManyRedirects => "Too many redirects.".to_string(),
            ureq::ErrorKind::InvalidUrl | ureq::ErrorKind::UnknownScheme => {
                "Invalid URL.".to_string()
            }
            ureq::ErrorKind::Io => match t.message() {
                Some(m) => format!("Network error: {}", m),
                None => "Network error.".to_string(),
            },
            _ => t.to_string(),
        },
    }
}

/// Format a JSON error by category.
pub fn user_message_from_json(err: &serde_json::Error) -> String {
    use serde_json::error::Category;

    match err.classify() {
        Category::Syntax => format!(
            "Response is not valid JSON (line {}, column {}).",
            err.line(),
            err.column()
        ),
        Category::Data => format!("Unexpected JSON shape: {}", err),
        Category::Eof => "Response ended early; the JSON is incomplete.".to_string(),
        Category::Io => "Could not read the response.".to_string(),
    }
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error, context: Option<&str>) -> String {
    use std::io::ErrorKind;

    let base: String = match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check read access.".to_string(),
        ErrorKind::ConnectionRefused => "Connection refused.".to_string(),
        ErrorKind::ConnectionReset => "Connection reset.".to_string(),
        ErrorKind::TimedOut => "The request timed out.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        _ => err.to_string(),
    };

    match context {
        Some(ctx) if !ctx.is_empty() => format!("{} {}", base, ctx),
        _ => base,
    }
}

/// Format a color_eyre Report by downcasting to known error types.
/// Walks the cause chain; falls back to the first line of the display.
pub fn user_message_from_report(report: &color_eyre::eyre::Report) -> String {
    for cause in report.chain() {
        #[cfg(feature = "http")]
        if let Some(e) = cause.downcast_ref::<ureq::Error>() {
            return user_message_from_ureq(e);
        }
        if let Some(e) = cause.downcast_ref::<serde_json::Error>() {
            let outer = report.to_string();
            let msg = user_message_from_json(e);
            return if outer.starts_with("invalid ") {
                format!("{}: {}", outer.lines().next().unwrap_or_default(), msg)
            } else {
                msg
            };
        }
        if let Some(e) = cause.downcast_ref::<io::Error>() {
            return user_message_from_io(e, None);
        }
    }

    let display = report.to_string();
    display
        .lines()
        .next()
        .map(str::trim)
        .unwrap_or("An error occurred")
        .to_string()
}
