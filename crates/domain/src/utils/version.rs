//! Release version parsing for the client compatibility window

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A dotted numeric release version such as `0.50.1`
///
/// Only the leading numeric release segment is compared; suffixes such as
/// `.post1` or `+g1234` are kept for display but ignored for ordering.
/// Missing trailing components compare as zero, so `5.0 == 5`.
#[derive(Debug, Clone)]
pub struct Version {
    release: Vec<u64>,
    raw: String,
}

impl Version {
    /// Numeric release components
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// `true` when `lower <= self <= upper`
    pub fn within(&self, lower: &Self, upper: &Self) -> bool {
        lower <= self && self <= upper
    }

    fn component(&self, idx: usize) -> u64 {
        self.release.get(idx).copied().unwrap_or(0)
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let release_part = raw.trim_start_matches(['v', 'V']);
        let release_part = release_part.split(['+', '-']).next().unwrap_or_default();

        let mut release = Vec::new();
        for piece in release_part.split('.') {
            let digits: String = piece.chars().take_while(char::is_ascii_digit).collect();
            if digits.is_empty() {
                break;
            }
            let value = digits.parse::<u64>().map_err(|e| format!("Invalid version {raw}: {e}"))?;
            release.push(value);
            if digits.len() != piece.len() {
                break;
            }
        }

        if release.is_empty() {
            return Err(format!("Invalid version: {raw}"));
        }

        Ok(Self { release, raw: raw.to_string() })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        (0..len)
            .map(|idx| self.component(idx).cmp(&other.component(idx)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}
