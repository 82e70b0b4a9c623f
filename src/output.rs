//! Rendering of simulated intervals.

use std::io::{self, Write};

use crate::Interval;

/// How the interval list is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// `[1, 2, 3, ]`: every value is followed by `, `.
    Trailing,
    /// `[1, 2, 3]`
    Compact,
}

impl Default for Style {
    fn default() -> Self {
        Style::Trailing
    }
}

/// Writes intervals as a bracketed list, one value at a time as `values` yields them.
/// Empty input gives `[]` in both styles.
pub fn write_intervals<W, I>(out: &mut W, values: I, style: Style) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = Interval>,
{
    out.write_all(b"[")?;
    match style {
        Style::Trailing => {
            for v in values {
                write!(out, "{}, ", v)?;
            }
        }
        Style::Compact => {
            for (i, v) in values.into_iter().enumerate() {
                if i > 0 {
                    out.write_all(b", ")?;
                }
                write!(out, "{}", v)?;
            }
        }
    }
    out.write_all(b"]")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(values: &[Interval], style: Style) -> String {
        let mut out = Vec::new();
        write_intervals(&mut out, values.iter().copied(), style).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn empty() {
        assert_eq!(format(&[], Style::Trailing), "[]");
        assert_eq!(format(&[], Style::Compact), "[]");
    }

    #[test]
    fn trailing_separator() {
        assert_eq!(format(&[1], Style::Trailing), "[1, ]");
        assert_eq!(format(&[12, 0, 345], Style::Trailing), "[12, 0, 345, ]");
    }

    #[test]
    fn compact() {
        assert_eq!(format(&[1], Style::Compact), "[1]");
        assert_eq!(format(&[12, 0, 345], Style::Compact), "[12, 0, 345]");
    }

    #[test]
    fn default_is_trailing() {
        assert_eq!(Style::default(), Style::Trailing);
    }

    #[test]
    fn values_written_as_drawn() {
        // a writer that is full after "[1, " must stop the iterator right there
        let mut buf = [0u8; 4];
        let mut out = &mut buf[..];
        let mut drawn = 0;
        let values = (1..=1000).map(|v| {
            drawn += 1;
            v
        });
        assert!(write_intervals(&mut out, values, Style::Trailing).is_err());
        assert_eq!(&buf, b"[1, ");
        assert!(drawn <= 2, "drew {} values", drawn);
    }
}
