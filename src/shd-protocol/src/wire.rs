// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Text wire framing.
//!
//! A message is a start line, a block of `Name: value` header lines and an
//! optional body:
//!
//! ```text
//! GET deviceStatus?id=7 HTTP/1.1\r\n
//! Host: 10.0.0.2\r\n
//! \r\n
//! ```
//!
//! The header block ends at the first `\r\n\r\n`. A message without that
//! separator, or with a start line that does not parse, is rejected as a
//! whole. A `Content-Length` header bounds the body; without one the body
//! runs to the end of the text.

use std::fmt;

use thiserror::Error;

const CRLF: &str = "\r\n";
const SEPARATOR: &str = "\r\n\r\n";

pub const HEADER_HOST: &str = "Host";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_CONTENT_LENGTH: &str = "Content-Length";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("empty message")]
    Empty,

    #[error("missing header/body separator")]
    MissingSeparator,

    #[error("invalid start line '{0}'")]
    BadStartLine(String),

    #[error("invalid header line '{0}'")]
    BadHeader(String),

    #[error("body truncated: {available} of {expected} bytes")]
    Incomplete { expected: usize, available: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Version {
    Http10,
    #[default]
    Http11,
}

impl Version {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http10 => "HTTP/1.0",
            Self::Http11 => "HTTP/1.1",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "HTTP/1.0" => Some(Self::Http10),
            "HTTP/1.1" => Some(Self::Http11),
            _ => None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class of a response status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Informational,
    Success,
    Redirection,
    ClientError,
    ServerError,
}

impl StatusClass {
    pub fn of(code: u16) -> Option<Self> {
        match code {
            100..=199 => Some(Self::Informational),
            200..=299 => Some(Self::Success),
            300..=399 => Some(Self::Redirection),
            400..=499 => Some(Self::ClientError),
            500..=599 => Some(Self::ServerError),
            _ => None,
        }
    }
}

/// Canonical reason phrase of a known status code.
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    let phrase = match code {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        409 => "Conflict",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        _ => return None,
    };
    Some(phrase)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartLine {
    Request {
        method: Method,
        path: String,
        version: Version,
    },
    Response {
        version: Version,
        code: u16,
        reason: String,
    },
}

impl StartLine {
    fn parse(line: &str) -> Result<Self, WireError> {
        let bad = || WireError::BadStartLine(line.to_string());
        let mut fields = line.splitn(3, ' ');
        let first = fields.next().ok_or_else(bad)?;

        if let Some(method) = Method::parse(first) {
            let path = fields.next().filter(|p| !p.is_empty()).ok_or_else(bad)?;
            let version = fields.next().and_then(Version::parse).ok_or_else(bad)?;
            return Ok(Self::Request {
                method,
                path: path.to_string(),
                version,
            });
        }

        let version = Version::parse(first).ok_or_else(bad)?;
        let code = fields
            .next()
            .and_then(|c| c.parse::<u16>().ok())
            .filter(|c| StatusClass::of(*c).is_some())
            .ok_or_else(bad)?;
        let reason = fields.next().unwrap_or_default().to_string();
        Ok(Self::Response {
            version,
            code,
            reason,
        })
    }
}

impl fmt::Display for StartLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request {
                method,
                path,
                version,
            } => write!(f, "{} {} {}", method, path, version),
            Self::Response {
                version,
                code,
                reason,
            } if reason.is_empty() => write!(f, "{} {}", version, code),
            Self::Response {
                version,
                code,
                reason,
            } => write!(f, "{} {} {}", version, code, reason),
        }
    }
}

/// Request or response message.
///
/// Built with [`WireMessage::request`] or [`WireMessage::response`] and the
/// chaining `header`/`body` methods. A message whose start line was rejected
/// stays invalid and encodes to an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WireMessage {
    start: Option<StartLine>,
    headers: Vec<(String, String)>,
    body: String,
}

impl WireMessage {
    pub fn request(method: Method, path: &str, version: Version) -> Self {
        let valid = !path.is_empty() && !path.contains(char::is_whitespace);
        Self {
            start: valid.then(|| StartLine::Request {
                method,
                path: path.to_string(),
                version,
            }),
            ..Self::default()
        }
    }

    /// Response with the canonical reason phrase. Unknown codes yield an
    /// invalid message.
    pub fn response(version: Version, code: u16) -> Self {
        Self {
            start: reason_phrase(code).map(|reason| StartLine::Response {
                version,
                code,
                reason: reason.to_string(),
            }),
            ..Self::default()
        }
    }

    /// Append a header line. Names or values containing line breaks are
    /// dropped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let clean = |s: &str| !s.contains(['\r', '\n']);
        if !name.is_empty() && !name.contains(':') && clean(name) && clean(value) {
            self.headers.push((name.to_string(), value.to_string()));
        }
        self
    }

    /// Append text to the body.
    pub fn body(mut self, text: &str) -> Self {
        self.body.push_str(text);
        self
    }

    pub fn is_valid(&self) -> bool {
        self.start.is_some()
    }

    pub fn start_line(&self) -> Option<&StartLine> {
        self.start.as_ref()
    }

    pub fn method(&self) -> Option<Method> {
        match self.start {
            Some(StartLine::Request { method, .. }) => Some(method),
            _ => None,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match &self.start {
            Some(StartLine::Request { path, .. }) => Some(path),
            _ => None,
        }
    }

    pub fn version(&self) -> Option<Version> {
        match self.start {
            Some(StartLine::Request { version, .. } | StartLine::Response { version, .. }) => {
                Some(version)
            }
            None => None,
        }
    }

    /// Status code of a response.
    pub fn status(&self) -> Option<u16> {
        match self.start {
            Some(StartLine::Response { code, .. }) => Some(code),
            _ => None,
        }
    }

    pub fn status_class(&self) -> Option<StatusClass> {
        self.status().and_then(StatusClass::of)
    }

    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn body_text(&self) -> &str {
        &self.body
    }

    /// Render the message. Invalid messages render as an empty string.
    pub fn encode(&self) -> String {
        let Some(start) = &self.start else {
            return String::new();
        };
        let mut out = format!("{}{}", start, CRLF);
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str(CRLF);
        }
        out.push_str(CRLF);
        out.push_str(&self.body);
        out
    }

    /// Parse a complete message. Text past a `Content-Length` bounded body
    /// is ignored.
    pub fn parse(text: &str) -> Result<Self, WireError> {
        Self::parse_prefix(text).map(|(message, _)| message)
    }

    /// Parse the message at the start of `text` and return it with the
    /// number of bytes it spans, so back-to-back messages can be split.
    pub fn parse_prefix(text: &str) -> Result<(Self, usize), WireError> {
        if text.is_empty() {
            return Err(WireError::Empty);
        }
        let start_end = text.find(CRLF).ok_or(WireError::MissingSeparator)?;
        let start = StartLine::parse(&text[..start_end])?;

        // An empty header block puts the separator right at the start line's end.
        let sep = text[start_end..]
            .find(SEPARATOR)
            .map(|i| i + start_end)
            .ok_or(WireError::MissingSeparator)?;

        let mut headers = Vec::new();
        if sep > start_end {
            for line in text[start_end + CRLF.len()..sep].split(CRLF) {
                let (name, value) = line
                    .split_once(':')
                    .filter(|(n, _)| !n.trim().is_empty())
                    .ok_or_else(|| WireError::BadHeader(line.to_string()))?;
                headers.push((name.trim().to_string(), value.trim().to_string()));
            }
        }

        let body_start = sep + SEPARATOR.len();
        let body_end = match headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(HEADER_CONTENT_LENGTH))
        {
            Some((name, value)) => {
                let bad = || WireError::BadHeader(format!("{}: {}", name, value));
                let len: usize = value.parse().map_err(|_| bad())?;
                let available = text.len() - body_start;
                if len > available {
                    return Err(WireError::Incomplete {
                        expected: len,
                        available,
                    });
                }
                if !text.is_char_boundary(body_start + len) {
                    return Err(bad());
                }
                body_start + len
            }
            None => text.len(),
        };

        let message = Self {
            start: Some(start),
            headers,
            body: text[body_start..body_end].to_string(),
        };
        Ok((message, body_end))
    }
}
