//! Ordered application versions
//!
//! The startup gate compares the persisted last-seen version against the
//! running client version; a newer running client invalidates the stored
//! session. Versions are dotted numeric strings ("1.4.2"); missing trailing
//! segments compare as zero, so "1.4" == "1.4.0".

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// A dotted numeric application version with total order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AppVersion(Vec<u64>);

impl AppVersion {
    /// The version of the running client
    pub fn running() -> Self {
        env!("CARGO_PKG_VERSION")
            .parse()
            .unwrap_or_else(|_| Self(vec![0, 0, 0]))
    }

    /// The version segments, most significant first
    pub fn segments(&self) -> &[u64] {
        &self.0
    }
}

impl FromStr for AppVersion {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DomainError::InvalidVersion(
                "Version cannot be empty".to_string(),
            ));
        }
        let segments = s
            .split('.')
            .map(|seg| {
                seg.parse::<u64>()
                    .map_err(|_| DomainError::InvalidVersion(format!("Non-numeric segment: {s}")))
            })
            .collect::<Result<Vec<u64>, DomainError>>()?;
        Ok(Self(segments))
    }
}

impl TryFrom<String> for AppVersion {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AppVersion> for String {
    fn from(v: AppVersion) -> Self {
        v.to_string()
    }
}

impl Display for AppVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let text = self
            .0
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{text}")
    }
}

// Equality must agree with the zero-padded ordering ("1.4" == "1.4.0"),
// so it cannot be derived from the raw segment vector.
impl PartialEq for AppVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AppVersion {}

impl Ord for AppVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        for i in 0..len {
            let a = self.0.get(i).copied().unwrap_or(0);
            let b = other.0.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for AppVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
