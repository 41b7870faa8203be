//! Configuration options for comparisons.
//!
//! `ComparisonOptions` controls how fragment sources compare lines, when a
//! comparison is considered too large, and how often long computations look
//! at their cancellation token.

use std::borrow::Cow;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration options for a comparison.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComparisonOptions {
    /// How whitespace is treated when comparing lines.
    pub ignore_policy: IgnorePolicy,

    /// Combined line count of all sides above which a comparison is refused.
    pub max_lines: usize,

    /// Upper bound for a single line diff; past it the diff degrades to a
    /// coarser (but still correct) result.
    pub timeout: Option<Duration>,

    /// Number of diff operations processed between cancellation checks.
    pub check_interval: usize,

    /// Compute char-level inner fragments for two-way modifications.
    pub inner_fragments: bool,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            ignore_policy: IgnorePolicy::default(),
            max_lines: 1_000_000,
            timeout: Some(Duration::from_secs(5)),
            check_interval: 1024,
            inner_fragments: false,
        }
    }
}

impl ComparisonOptions {
    /// Create new comparison options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the whitespace policy.
    pub fn ignore_policy(mut self, policy: IgnorePolicy) -> Self {
        self.ignore_policy = policy;
        self
    }

    /// Set the size limit.
    pub fn max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    /// Set the diff timeout, or `None` to let the diff run to completion.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the cancellation check interval (at least 1).
    pub fn check_interval(mut self, interval: usize) -> Self {
        self.check_interval = interval.max(1);
        self
    }

    /// Enable or disable inner fragments.
    pub fn inner_fragments(mut self, enabled: bool) -> Self {
        self.inner_fragments = enabled;
        self
    }

    /// The point in time a diff started now must give up at.
    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.timeout.map(|timeout| Instant::now() + timeout)
    }
}

/// How whitespace affects line equality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IgnorePolicy {
    /// Lines must match exactly.
    #[default]
    Default,

    /// Leading and trailing whitespace is ignored.
    TrimWhitespaces,

    /// All whitespace is ignored.
    IgnoreWhitespaces,
}

impl IgnorePolicy {
    /// The form of `line` that is compared under this policy
    pub fn normalize<'a>(&self, line: &'a str) -> Cow<'a, str> {
        match self {
            IgnorePolicy::Default => Cow::Borrowed(line),
            IgnorePolicy::TrimWhitespaces => Cow::Borrowed(line.trim()),
            IgnorePolicy::IgnoreWhitespaces => {
                if line.chars().any(char::is_whitespace) {
                    Cow::Owned(line.chars().filter(|c| !c.is_whitespace()).collect())
                } else {
                    Cow::Borrowed(line)
                }
            }
        }
    }

    /// Compare two runs of lines under this policy
    pub fn lines_equal<A: AsRef<str>, B: AsRef<str>>(&self, a: &[A], b: &[B]) -> bool {
        a.len() == b.len()
            && a
                .iter()
                .zip(b)
                .all(|(x, y)| self.normalize(x.as_ref()) == self.normalize(y.as_ref()))
    }
}
