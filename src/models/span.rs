//! Span sets - the text coverage of a single tag
//!
//! A tag covers zero or more half-open character ranges of the primary text.
//! The compact string form is `start~end` segments joined by commas
//! (e.g. `"0~5,8~10"`). A tag covering nothing (non-consuming) is written as
//! `"-1~-1"`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder written for a tag without any extent
pub const NON_CONSUMING: &str = "-1~-1";

const SEGMENT_SEPARATOR: char = ',';
const BOUND_SEPARATOR: char = '~';

/// Error produced when a span string cannot be read
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpanParseError {
    #[error("segment '{0}' is not of the form start~end")]
    MalformedSegment(String),

    #[error("segment '{0}' has a non-numeric bound")]
    InvalidBound(String),

    #[error("segment '{segment}' ends before it starts")]
    Reversed { segment: String },
}

/// Ordered, deduplicated set of half-open `[start, end)` ranges
///
/// Overlapping segments are merged on construction; touching segments are
/// kept apart because each segment becomes its own unit when unitizing.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpanSet {
    segments: Vec<(usize, usize)>,
}

impl SpanSet {
    /// Span set covering nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a span set from arbitrary pairs, normalizing order and overlaps
    ///
    /// Empty pairs (`start == end`) carry no extent and are dropped, so the
    /// printed form only round-trips to the normalized set: `[(2, 2), (4, 6)]`
    /// prints as `4~6` and parses back as `[(4, 6)]`.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut pairs: Vec<(usize, usize)> = pairs
            .into_iter()
            .filter(|(start, end)| start < end)
            .collect();
        pairs.sort_unstable();

        let mut segments: Vec<(usize, usize)> = Vec::with_capacity(pairs.len());
        for (start, end) in pairs {
            match segments.last_mut() {
                Some(last) if start < last.1 => last.1 = last.1.max(end),
                _ => segments.push((start, end)),
            }
        }

        Self { segments }
    }

    /// Single-segment span set
    pub fn single(start: usize, end: usize) -> Self {
        Self::from_pairs([(start, end)])
    }

    /// Parse the compact `start~end,start~end` form
    ///
    /// An empty string or the non-consuming placeholder yields an empty set.
    /// Any segment with a negative bound is treated as non-consuming.
    pub fn parse(input: &str) -> Result<Self, SpanParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == NON_CONSUMING {
            return Ok(Self::empty());
        }

        let mut pairs = Vec::new();
        for raw in trimmed.split(SEGMENT_SEPARATOR) {
            let segment = raw.trim();
            if segment.is_empty() {
                continue;
            }

            let (start, end) = segment
                .split_once(BOUND_SEPARATOR)
                .ok_or_else(|| SpanParseError::MalformedSegment(segment.to_string()))?;

            let start: i64 = start
                .trim()
                .parse()
                .map_err(|_| SpanParseError::InvalidBound(segment.to_string()))?;
            let end: i64 = end
                .trim()
                .parse()
                .map_err(|_| SpanParseError::InvalidBound(segment.to_string()))?;

            if start < 0 || end < 0 {
                continue;
            }
            if end < start {
                return Err(SpanParseError::Reversed {
                    segment: segment.to_string(),
                });
            }

            pairs.push((start as usize, end as usize));
        }

        Ok(Self::from_pairs(pairs))
    }

    /// Segments in ascending order
    pub fn segments(&self) -> &[(usize, usize)] {
        &self.segments
    }

    /// True for a non-consuming tag
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First covered offset
    pub fn start(&self) -> Option<usize> {
        self.segments.first().map(|(start, _)| *start)
    }

    /// One past the last covered offset
    pub fn end(&self) -> Option<usize> {
        self.segments.last().map(|(_, end)| *end)
    }

    /// Same set with every segment cut to `[0, limit)`
    pub fn clipped(&self, limit: usize) -> Self {
        Self::from_pairs(
            self.segments
                .iter()
                .map(|&(start, end)| (start.min(limit), end.min(limit))),
        )
    }
}

impl fmt::Display for SpanSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str(NON_CONSUMING);
        }

        for (i, (start, end)) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEGMENT_SEPARATOR)?;
            }
            write!(f, "{}{}{}", start, BOUND_SEPARATOR, end)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for SpanSet {
    type Err = SpanParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
