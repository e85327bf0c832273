//! VDF (Valve Data Format) parsing and serialization.
//!
//! SteamCMD emits application metadata as VDF: quoted keys paired with either
//! quoted scalar values or `{}`-delimited nested blocks. This module provides
//! the pieces the synchronizer needs:
//!
//! - [`Value`] / [`Map`] - an order-preserving document model
//! - [`parse`] - parse one complete VDF document
//! - [`write`] - serialize a document back to VDF text (stable two-space
//!   indentation, round-trippable through [`parse`])
//! - [`scan_tool_output`] - extract and merge the VDF blocks interleaved with
//!   diagnostic noise in SteamCMD's combined output
//!
//! This is not a general configuration-file parser; it covers the VDF subset
//! the tool actually produces (string scalars, nested maps, `//` comments,
//! backslash escapes).
//!
//! # Parse outcome
//!
//! [`scan_tool_output`] returns a tagged [`ParseOutcome`] rather than
//! overloading one return type: callers either get a usable app map or the
//! raw tool output for logging, and cannot accidentally treat one as the
//! other.
//!
//! # Examples
//!
//! ```rust
//! use manifest_sync::vdf::{ParseOutcome, scan_tool_output};
//!
//! let stdout = "noise\n\"730\"\n{\n  \"common\"\n  {\n    \"name\"  \"CS2\"\n  }\n}\nmore noise\n";
//! match scan_tool_output(stdout) {
//!     ParseOutcome::Parsed(apps) => assert!(apps.contains_key("730")),
//!     ParseOutcome::Unparsed(_) => unreachable!(),
//! }
//! ```

mod parser;
mod writer;

pub use parser::parse;
pub use writer::write;

use indexmap::IndexMap;
use tracing::warn;

/// An ordered VDF mapping.
///
/// Insertion order is preserved so serialized documents are stable and
/// diffable across passes.
pub type Map = IndexMap<String, Value>;

/// A single VDF value: a scalar or a nested mapping.
///
/// VDF text carries every scalar as a quoted string; [`Value::Int`] exists so
/// generated documents can state numeric fields directly and serialize them
/// without formatting detours. Parsing always yields [`Value::Str`] scalars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A string scalar.
    Str(String),
    /// An integer scalar, serialized as its quoted decimal form.
    Int(i64),
    /// A nested mapping.
    Map(Map),
}

impl Value {
    /// Borrow the nested map, if this value is one.
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow the string scalar, if this value is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Render a scalar as its string form; `None` for maps.
    pub fn scalar_string(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::Map(_) => None,
        }
    }

    /// Look up a key in a nested map; `None` for scalars or absent keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

/// Result of scanning SteamCMD output for VDF blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// All blocks parsed; top-level keys are application identifiers.
    ///
    /// Empty when the output contained no blocks at all.
    Parsed(Map),
    /// At least one block failed to parse.
    ///
    /// Carries the raw input unchanged. The whole batch is unusable for this
    /// pass; callers log it and move on rather than retrying per app.
    Unparsed(String),
}

/// Extract every VDF block from combined SteamCMD output and merge them.
///
/// The output interleaves plain diagnostic lines with one or more VDF blocks.
/// A block opens at a line whose first byte is `"` and closes at a line whose
/// first byte is `}` in column zero; the closing brace is kept as part of the
/// block. Lines outside any block are discarded. Each completed block is
/// parsed as one document and its top-level keys merged into the cumulative
/// result, later blocks overwriting earlier ones.
///
/// Fail-fast: a parse failure in any block discards everything accumulated so
/// far and returns [`ParseOutcome::Unparsed`] with the raw input.
pub fn scan_tool_output(stdout: &str) -> ParseOutcome {
    let mut apps = Map::new();
    let mut block = String::new();
    let mut inside = false;

    for line in stdout.lines() {
        if line.starts_with('"') {
            inside = true;
        }
        if line.starts_with('}') {
            inside = false;
            block.push('}');
        }

        if inside {
            block.push_str(line);
            block.push('\n');
        } else if !block.is_empty() {
            match parse(&block) {
                Ok(document) => {
                    for (key, value) in document {
                        apps.insert(key, value);
                    }
                }
                Err(err) => {
                    warn!(target: "vdf", "discarding tool output: {err}");
                    return ParseOutcome::Unparsed(stdout.to_string());
                }
            }
            block.clear();
        }
    }

    ParseOutcome::Parsed(apps)
}
