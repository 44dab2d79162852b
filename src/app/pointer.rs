//! Pointer input source: one `x y` (or `x,y`) pair per line

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, warn};

/// Parse a pointer line into game coordinates
pub fn parse_point(line: &str) -> Option<(f64, f64)> {
    let mut parts = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty());

    let x: f64 = parts.next()?.parse().ok()?;
    let y: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some((x, y))
}

/// Line-oriented pointer reader
pub struct PointerInput<R> {
    lines: Lines<R>,
    closed: bool,
}

impl PointerInput<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> PointerInput<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            closed: false,
        }
    }

    /// Input ended; stop polling
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Next valid point, skipping lines that do not parse. `None` at end of input.
    pub async fn next_point(&mut self) -> Option<(f64, f64)> {
        while !self.closed {
            match self.lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_point(&line) {
                        Some(point) => return Some(point),
                        None => warn!(line = %line, "Ignoring unparseable pointer input"),
                    }
                }
                Ok(None) => {
                    debug!("Pointer input closed");
                    self.closed = true;
                }
                Err(e) => {
                    warn!(error = %e, "Pointer input failed, closing");
                    self.closed = true;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_space_and_comma_forms() {
        assert_eq!(parse_point("300 100"), Some((300.0, 100.0)));
        assert_eq!(parse_point("  12.5,  7 "), Some((12.5, 7.0)));
        assert_eq!(parse_point("1,2\r"), Some((1.0, 2.0)));
    }

    #[test]
    fn rejects_bad_lines() {
        assert_eq!(parse_point(""), None);
        assert_eq!(parse_point("1"), None);
        assert_eq!(parse_point("1 2 3"), None);
        assert_eq!(parse_point("a b"), None);
        assert_eq!(parse_point("NaN 2"), None);
        assert_eq!(parse_point("inf 2"), None);
    }

    #[tokio::test]
    async fn skips_garbage_and_closes_at_eof() {
        let data: &[u8] = b"10 20\n\nnope\n30,40\n";
        let mut input = PointerInput::from_reader(data);

        assert_eq!(input.next_point().await, Some((10.0, 20.0)));
        assert_eq!(input.next_point().await, Some((30.0, 40.0)));
        assert!(!input.is_closed());
        assert_eq!(input.next_point().await, None);
        assert!(input.is_closed());
        assert_eq!(input.next_point().await, None);
    }
}
