//! The event taxonomy and append-only log.
//!
//! A closed sum type with exhaustive matching, the same shape reached for
//! whenever a protocol message needs a tagged representation rather than
//! ad-hoc shape-dependent dispatch. [`Event`] is that sum type; it derives
//! `serde::Serialize` so a viewer outside this crate can consume the log
//! as JSON.

use serde::{Deserialize, Serialize};

use crate::chunk::Address;

/// Where an allocation was satisfied from.
///
/// The source tags are a mix of bare names and one indexed form —
/// `tcache`, `fastbin`, `smallbin[i]`, `unsorted`, `largebin`, `top` — so
/// the serialized form is the plain string each variant's `Display`
/// produces, not a tagged struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Tcache,
    Fastbin,
    Smallbin(usize),
    Unsorted,
    Largebin,
    Top,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Tcache => f.write_str("tcache"),
            Source::Fastbin => f.write_str("fastbin"),
            Source::Smallbin(idx) => write!(f, "smallbin[{idx}]"),
            Source::Unsorted => f.write_str("unsorted"),
            Source::Largebin => f.write_str("largebin"),
            Source::Top => f.write_str("top"),
        }
    }
}

impl Serialize for Source {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Source {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == "tcache" {
            Ok(Source::Tcache)
        } else if s == "fastbin" {
            Ok(Source::Fastbin)
        } else if s == "unsorted" {
            Ok(Source::Unsorted)
        } else if s == "largebin" {
            Ok(Source::Largebin)
        } else if s == "top" {
            Ok(Source::Top)
        } else if let Some(inner) = s.strip_prefix("smallbin[").and_then(|s| s.strip_suffix(']')) {
            let idx = inner.parse().map_err(serde::de::Error::custom)?;
            Ok(Source::Smallbin(idx))
        } else {
            Err(serde::de::Error::custom(format!("unknown source tag: {s}")))
        }
    }
}

/// Where a freed chunk ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Tcache,
    Fastbin,
    Unsorted,
    Top,
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Destination::Tcache => "tcache",
            Destination::Fastbin => "fastbin",
            Destination::Unsorted => "unsorted",
            Destination::Top => "top",
        };
        f.write_str(s)
    }
}

/// A single entry in the arena's event trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "sysmalloc")]
    Sysmalloc { msg: String, bytes: usize, old_top: Address, new_top: Address },
    #[serde(rename = "malloc")]
    Malloc { msg: String, bytes: usize, nb: usize, result: Address, source: Source },
    #[serde(rename = "free")]
    Free { msg: String, ptr: Address, size: usize, into: Destination },
    #[serde(rename = "consolidate")]
    Consolidate { msg: String },
    #[serde(rename = "tcache-put")]
    TcachePut { msg: String, size: usize },
    #[serde(rename = "tcache-get")]
    TcacheGet { msg: String, size: usize },
    #[serde(rename = "bin-insert")]
    BinInsert { msg: String, bin: String, addr: Address, size: usize },
    #[serde(rename = "bin-unlink")]
    BinUnlink { msg: String, bin: String, addr: Address, size: usize },
    #[serde(rename = "split")]
    Split { msg: String, from: Address, into: [Address; 2], sizes: [usize; 2] },
    #[serde(rename = "coalesce")]
    Coalesce { msg: String, result: Address, size: usize, parts: Vec<Address> },
    #[serde(rename = "error")]
    Error { msg: String },
}

impl Event {
    /// The short human-readable message carried by every variant.
    pub fn message(&self) -> &str {
        match self {
            Event::Sysmalloc { msg, .. }
            | Event::Malloc { msg, .. }
            | Event::Free { msg, .. }
            | Event::Consolidate { msg }
            | Event::TcachePut { msg, .. }
            | Event::TcacheGet { msg, .. }
            | Event::BinInsert { msg, .. }
            | Event::BinUnlink { msg, .. }
            | Event::Split { msg, .. }
            | Event::Coalesce { msg, .. }
            | Event::Error { msg } => msg,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}
