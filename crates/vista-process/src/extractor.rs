//! URL discovery from process output
//!
//! The admin server prints the address it bound to on stdout. The first
//! `http://` or `https://` token followed by whitespace wins; everything
//! after that is ignored by the extractor.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ProcessError;
use crate::Result;

/// Longest unterminated token kept while waiting for its whitespace
const MAX_CANDIDATE: usize = 16 * 1024;

/// Bytes kept from a chunk's end in case they start a scheme ("htt")
const SCHEME_TAIL: usize = 3;

/// Holds only output that could still begin a URL, so scanning a chatty
/// server stays linear in its output.
#[derive(Debug, Default)]
pub struct UrlExtractor {
    buffer: Vec<u8>,
    resolved: bool,
}

impl UrlExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of output. Returns the URL the first time one is complete
    /// and `None` on every call after that.
    pub fn feed(&mut self, chunk: &[u8]) -> Option<String> {
        if self.resolved {
            return None;
        }

        self.buffer.extend_from_slice(chunk);

        match scan(&self.buffer) {
            Scan::Found(url) => {
                self.resolved = true;
                self.buffer = Vec::new();
                Some(url)
            }
            Scan::Pending(keep_from) => {
                self.buffer.drain(..keep_from);
                if self.buffer.len() > MAX_CANDIDATE {
                    let cut = self.buffer.len() - SCHEME_TAIL;
                    self.buffer.drain(..cut);
                }
                None
            }
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}

enum Scan {
    Found(String),
    /// No URL yet; bytes before this offset can never be part of one
    Pending(usize),
}

fn scan(buf: &[u8]) -> Scan {
    let mut from = 0;

    while let Some(offset) = find(&buf[from..], b"http") {
        let start = from + offset;
        let rest = &buf[start..];

        let scheme_len = if rest.starts_with(b"https://") {
            8
        } else if rest.starts_with(b"http://") {
            7
        } else if b"https://".starts_with(rest) || b"http://".starts_with(rest) {
            // could still become a scheme once more output arrives
            return Scan::Pending(start);
        } else {
            from = start + 4;
            continue;
        };

        let body = &rest[scheme_len..];
        let len = match body.iter().position(|b| b.is_ascii_whitespace()) {
            Some(0) => {
                from = start + scheme_len;
                continue;
            }
            Some(len) => len,
            // not terminated yet
            None => return Scan::Pending(start),
        };

        let candidate = String::from_utf8_lossy(&rest[..scheme_len + len]).into_owned();
        if url::Url::parse(&candidate).is_ok() {
            return Scan::Found(candidate);
        }

        from = start + scheme_len + len;
    }

    Scan::Pending(buf.len().saturating_sub(SCHEME_TAIL).max(from))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Read `stream` until a URL appears, then stop reading.
///
/// The stream is left positioned after the chunk that completed the URL so
/// the caller can keep draining it.
pub async fn discover_url<R>(stream: &mut R, pid: u32, timeout: Duration) -> Result<String>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let scan = async {
        let mut extractor = UrlExtractor::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = stream.read(&mut chunk).await.map_err(|e| ProcessError::Output {
                pid,
                reason: e.to_string(),
            })?;

            if n == 0 {
                return Err(ProcessError::OutputClosed { pid });
            }

            if let Some(url) = extractor.feed(&chunk[..n]) {
                return Ok(url);
            }
        }
    };

    match tokio::time::timeout(timeout, scan).await {
        Ok(result) => result,
        Err(_) => Err(ProcessError::DiscoveryTimeout {
            pid,
            waited: timeout,
        }),
    }
}
