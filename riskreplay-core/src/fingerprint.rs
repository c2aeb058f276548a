//! Content fingerprints: BLAKE3 over canonical JSON.
//!
//! Two runs with identical inputs must produce byte-identical transaction logs
//! and equity curves, so their fingerprints compare equal. `BTreeMap`s keep key
//! order stable across builds and platforms.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hex-encoded BLAKE3 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    /// Hash the canonical JSON encoding of `value`.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_vec(value)?;
        Ok(Self(blake3::hash(&json).to_hex().to_string()))
    }

    /// First `n` hex characters, for log lines and directory names.
    pub fn short(&self, n: usize) -> &str {
        &self.0[..n.min(self.0.len())]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn same_value_same_fingerprint() {
        let a: BTreeMap<&str, f64> = [("b", 2.0), ("a", 1.0)].into_iter().collect();
        let b: BTreeMap<&str, f64> = [("a", 1.0), ("b", 2.0)].into_iter().collect();
        assert_eq!(Fingerprint::of(&a).unwrap(), Fingerprint::of(&b).unwrap());
    }

    #[test]
    fn different_value_different_fingerprint() {
        let a = Fingerprint::of(&[1.0, 2.0]).unwrap();
        let b = Fingerprint::of(&[1.0, 2.000001]).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.0.len(), 64);
        assert_eq!(a.short(8).len(), 8);
    }
}
