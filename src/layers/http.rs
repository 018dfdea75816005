//! HTTP request/response header parsing
//!
//! Only the first segment of a message is looked at: the start line and whatever header lines were
//! captured in the same packet. There is no reassembly, so a header block split across segments
//! yields only the lines present in the first one.

use crate::errors::Error;

pub const GET_PREFIX: &[u8] = b"GET ";
pub const HEAD_PREFIX: &[u8] = b"HEAD ";
pub const HTTP_PREFIX: &[u8] = b"HTTP/";

/// Size of the scratch area, payloads are clamped to this by the packet decoder.
pub const MAX_PAYLOAD_LEN: usize = 8192_usize;

/// Whether a message travels from the client or from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    /// Classify a payload by its leading bytes.
    pub fn classify(payload: &[u8]) -> Option<Self> {
        if payload.starts_with(GET_PREFIX) || payload.starts_with(HEAD_PREFIX) {
            Some(Direction::Request)
        } else if payload.starts_with(HTTP_PREFIX) {
            Some(Direction::Response)
        } else {
            None
        }
    }

    /// Value of the synthesized `Direction` field.
    pub fn marker(&self) -> &'static str {
        match self {
            Direction::Request => ">",
            Direction::Response => "<",
        }
    }
}

/// First line of a message, split into its three parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartLine<'a> {
    Request {
        method: &'a str,
        uri: &'a str,
        version: &'a str,
    },
    Response {
        version: &'a str,
        status_code: &'a str,
        reason: &'a str,
    },
}

impl<'a> StartLine<'a> {
    fn parse(line: &'a str, direction: Direction) -> Result<Self, Error> {
        // Only the first two spaces delimit, the third part keeps any further spaces.
        let mut parts = line.splitn(3, ' ');
        let first = parts.next().unwrap_or_default();
        let (second, third) = match (parts.next(), parts.next()) {
            (Some(second), Some(third)) => (second, third),
            _ => {
                return Err(Error::Malformed(match direction {
                    Direction::Request => "request line",
                    Direction::Response => "status line",
                }))
            }
        };

        Ok(match direction {
            Direction::Request => StartLine::Request {
                method: first,
                uri: second,
                version: third,
            },
            Direction::Response => StartLine::Response {
                version: first,
                status_code: second,
                reason: third,
            },
        })
    }

    pub fn direction(&self) -> Direction {
        match self {
            StartLine::Request { .. } => Direction::Request,
            StartLine::Response { .. } => Direction::Response,
        }
    }

    /// The start line as named output fields.
    pub fn fields(&self) -> [(&'static str, &'a str); 3] {
        match *self {
            StartLine::Request {
                method,
                uri,
                version,
            } => [
                ("Method", method),
                ("Request-URI", uri),
                ("HTTP-Version", version),
            ],
            StartLine::Response {
                version,
                status_code,
                reason,
            } => [
                ("HTTP-Version", version),
                ("Status-Code", status_code),
                ("Reason-Phrase", reason),
            ],
        }
    }
}

/// Cursor over the lines of one payload.
///
/// Lines end at `\n`, a preceding `\r` is not part of the line.
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    rest: &'a str,
}

impl<'a> Lines<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { rest: text }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let line = match self.rest.find('\n') {
            Some(end) => {
                let line = &self.rest[..end];
                self.rest = &self.rest[end + 1..];
                line
            }
            None => core::mem::take(&mut self.rest),
        };
        Some(line.strip_suffix('\r').unwrap_or(line))
    }
}

/// `(name, value)` pairs of the header lines following the start line, in wire order.
///
/// Empty lines and lines without a `:` are skipped, so `name: value` lines past the end of the
/// header block are reported too.
#[derive(Debug, Clone)]
pub struct Headers<'a> {
    lines: Lines<'a>,
}

impl<'a> Iterator for Headers<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            if let Some((name, value)) = line.split_once(':') {
                return Some((name, value.trim_start()));
            }
        }
    }
}

/// A parsed message borrowing from the parser's scratch buffer.
#[derive(Debug, Clone)]
pub struct HttpMessage<'a> {
    start_line: StartLine<'a>,
    headers: Headers<'a>,
}

impl<'a> HttpMessage<'a> {
    pub fn start_line(&self) -> &StartLine<'a> {
        &self.start_line
    }

    pub fn direction(&self) -> Direction {
        self.start_line.direction()
    }

    pub fn headers(&self) -> Headers<'a> {
        self.headers.clone()
    }
}

/// Parser owning the scratch buffer a payload is copied into.
#[derive(Debug)]
pub struct HttpParser {
    scratch: String,
}

impl Default for HttpParser {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpParser {
    pub fn new() -> Self {
        Self {
            scratch: String::with_capacity(MAX_PAYLOAD_LEN),
        }
    }

    /// Parse a payload as an HTTP request or response.
    ///
    /// Returns [`NotHttp`][`Error::NotHttp`] for an unrecognized prefix and
    /// [`Malformed`][`Error::Malformed`] for a payload without a line terminator or a start
    /// line missing one of its delimiters.
    pub fn parse(&mut self, payload: &[u8]) -> Result<HttpMessage<'_>, Error> {
        let direction = Direction::classify(payload).ok_or(Error::NotHttp)?;

        self.scratch.clear();
        self.scratch.push_str(&String::from_utf8_lossy(payload));

        if !self.scratch.contains('\n') {
            return Err(Error::Malformed("missing line terminator"));
        }

        let mut lines = Lines::new(&self.scratch);
        let first = lines.next().unwrap_or_default();
        let start_line = StartLine::parse(first, direction)?;

        Ok(HttpMessage {
            start_line,
            headers: Headers { lines },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_request() {
        let mut parser = HttpParser::new();
        let payload = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nAccept: */*\r\n\r\n";

        let msg = parser.parse(payload);
        assert!(msg.is_ok(), "{:?}", msg.err());
        let msg = msg.unwrap();

        assert_eq!(msg.direction(), Direction::Request);
        assert_eq!(
            msg.start_line().fields(),
            [
                ("Method", "GET"),
                ("Request-URI", "/index.html"),
                ("HTTP-Version", "HTTP/1.1"),
            ]
        );
        let headers: Vec<_> = msg.headers().collect();
        assert_eq!(headers, vec![("Host", "example.com"), ("Accept", "*/*")]);
    }

    #[test]
    fn parse_response_reason_keeps_spaces() {
        let mut parser = HttpParser::new();
        let msg = parser
            .parse(b"HTTP/1.0 404 Not Found Here\r\nServer: x\r\n")
            .unwrap();

        assert_eq!(msg.direction(), Direction::Response);
        assert_eq!(
            *msg.start_line(),
            StartLine::Response {
                version: "HTTP/1.0",
                status_code: "404",
                reason: "Not Found Here",
            }
        );
    }

    #[test]
    fn parse_head_request() {
        let mut parser = HttpParser::new();
        let msg = parser.parse(b"HEAD / HTTP/1.1\n").unwrap();

        assert_eq!(msg.start_line().fields()[0], ("Method", "HEAD"));
        assert_eq!(msg.headers().count(), 0);
    }

    #[test]
    fn unrecognized_prefix_is_not_http() {
        let mut parser = HttpParser::new();

        for payload in [
            &b"POST /form HTTP/1.1\r\n"[..],
            &b"http/1.1 200 OK\r\n"[..],
            &b"GET\r\n"[..],
            &b"\x16\x03\x01\x02\x00"[..],
        ] {
            let result = parser.parse(payload);
            assert!(matches!(result, Err(Error::NotHttp)), "{:?}", result);
        }
    }

    #[test]
    fn missing_line_terminator_is_malformed() {
        let mut parser = HttpParser::new();
        let result = parser.parse(b"GET /index.html HTTP/1.1");

        assert!(matches!(result, Err(Error::Malformed(_))), "{:?}", result);
    }

    #[test]
    fn status_line_without_code_is_malformed() {
        let mut parser = HttpParser::new();

        let result = parser.parse(b"HTTP/1.1\r\n\r\n");
        assert!(matches!(result, Err(Error::Malformed(_))), "{:?}", result);

        let result = parser.parse(b"HTTP/1.1 200\r\n\r\n");
        assert!(matches!(result, Err(Error::Malformed(_))), "{:?}", result);
    }

    #[test]
    fn header_lines_without_colon_are_skipped() {
        let mut parser = HttpParser::new();
        let msg = parser
            .parse(b"GET / HTTP/1.1\r\ngarbage line\r\nHost:\t  a.example\r\nX-Empty:\r\n")
            .unwrap();

        let headers: Vec<_> = msg.headers().collect();
        assert_eq!(headers, vec![("Host", "a.example"), ("X-Empty", "")]);
    }

    #[test]
    fn repeated_headers_are_yielded_in_wire_order() {
        let mut parser = HttpParser::new();
        let msg = parser
            .parse(b"GET / HTTP/1.1\r\nCookie: a=1\r\ncookie: b=2\r\n")
            .unwrap();

        let headers: Vec<_> = msg.headers().collect();
        assert_eq!(headers, vec![("Cookie", "a=1"), ("cookie", "b=2")]);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut parser = HttpParser::new();
        let msg = parser
            .parse(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\n\r\nkey: v\r\nbody text\r\n")
            .unwrap();

        let headers: Vec<_> = msg.headers().collect();
        assert_eq!(headers, vec![("Content-Type", "text/plain"), ("key", "v")]);
    }

    #[test]
    fn truncated_last_header_line_is_kept() {
        let mut parser = HttpParser::new();
        let msg = parser.parse(b"GET / HTTP/1.1\r\nHost: trunc").unwrap();

        let headers: Vec<_> = msg.headers().collect();
        assert_eq!(headers, vec![("Host", "trunc")]);
    }

    #[test]
    fn lines_strip_carriage_returns() {
        let lines: Vec<_> = Lines::new("a\r\nb\n\r\nc").collect();
        assert_eq!(lines, vec!["a", "b", "", "c"]);
    }
}
