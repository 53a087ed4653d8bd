//! Feature deduplication
//!
//! Two fingerprints identify a feature:
//!
//! - [`CoordKey`]: representative coordinate rounded to six decimals, `"lat,lon"`
//! - [`GeomKey`]: geometry type plus every coordinate, rounded the same way
//!
//! Candidates are checked in order against a [`FingerprintIndex`]. A matching
//! coordinate key wins over a matching geometry key; survivors add both keys.
//!
//! ```ignore
//! use geoclip::dedupe::FingerprintIndex;
//!
//! let mut index = FingerprintIndex::seeded(&existing, Some("Roads"));
//! let report = index.dedupe(candidates);
//! println!("kept {} of {}", report.kept.len(), report.stats.processed());
//! ```

mod fingerprint;
mod index;

pub use fingerprint::{CoordKey, GeomKey, FINGERPRINT_DECIMALS};
pub use index::{DedupeReport, DedupeStats, FingerprintIndex, Verdict};

#[cfg(test)]
mod tests;
