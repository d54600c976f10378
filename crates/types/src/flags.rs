//! Marker bits carried by tree nodes.
//!
//! The XPath engine never reads or writes these; they are set by the embedding
//! application (datastore diffing, default-value expansion, edit marking) and only used
//! to post-filter query results.

use crate::error::UnknownFlagError;
use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;

bitflags! {
    /// Bit set of node markers. Unnamed bits survive parsing from a raw mask.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u16 {
        /// General-purpose mark, e.g. "visited" during a tree walk.
        const MARK = 0x01;
        /// Node is about to be removed and should be skipped.
        const TRANSIENT = 0x02;
        /// Node was added by an edit.
        const ADD = 0x04;
        /// Node was deleted by an edit.
        const DEL = 0x08;
        /// Node value was changed by an edit.
        const CHANGE = 0x10;
        /// Node was filled in from a schema default.
        const DEFAULT = 0x20;
    }
}

/// Parses `mark,change` (names joined by `,` or `|`), a hex mask such as `0x11`, or a
/// decimal mask.
impl FromStr for NodeFlags {
    type Err = UnknownFlagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix("0x") {
            return u16::from_str_radix(hex, 16)
                .map(NodeFlags::from_bits_retain)
                .map_err(|_| UnknownFlagError(s.to_string()));
        }
        if let Ok(bits) = s.parse::<u16>() {
            return Ok(NodeFlags::from_bits_retain(bits));
        }
        s.split([',', '|'])
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .try_fold(NodeFlags::empty(), |acc, name| {
                NodeFlags::from_name(&name.to_ascii_uppercase())
                    .map(|flag| acc | flag)
                    .ok_or_else(|| UnknownFlagError(name.to_string()))
            })
    }
}

impl fmt::Display for NodeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_and_intersects() {
        let flags = NodeFlags::ADD | NodeFlags::MARK;
        assert!(flags.contains(NodeFlags::ADD));
        assert!(!flags.contains(NodeFlags::ADD | NodeFlags::DEL));
        assert!(flags.intersects(NodeFlags::ADD | NodeFlags::DEL));
        assert!(!flags.intersects(NodeFlags::CHANGE));
        assert!(NodeFlags::empty().is_empty());
    }

    #[test]
    fn test_insert_remove() {
        let mut flags = NodeFlags::empty();
        flags.insert(NodeFlags::DEFAULT);
        flags |= NodeFlags::CHANGE;
        assert_eq!(flags.bits(), 0x30);
        flags.remove(NodeFlags::DEFAULT);
        assert_eq!(flags, NodeFlags::CHANGE);
        assert_eq!(flags.to_string(), "0x0010");
    }

    #[test]
    fn test_raw_masks_keep_unnamed_bits() {
        assert_eq!(NodeFlags::from_bits(0x40), None);
        let raw: NodeFlags = "0x41".parse().unwrap();
        assert_eq!(raw.bits(), 0x41);
        assert!(raw.contains(NodeFlags::MARK));
        assert_eq!(NodeFlags::all().bits(), 0x3f);
        assert_eq!(
            NodeFlags::all().iter_names().map(|(name, _)| name).collect::<Vec<_>>(),
            ["MARK", "TRANSIENT", "ADD", "DEL", "CHANGE", "DEFAULT"]
        );
    }

    #[test]
    fn test_parse_masks() {
        assert_eq!("mark,change".parse(), Ok(NodeFlags::MARK | NodeFlags::CHANGE));
        assert_eq!("ADD | del".parse(), Ok(NodeFlags::ADD | NodeFlags::DEL));
        assert_eq!("0x30".parse(), Ok(NodeFlags::CHANGE | NodeFlags::DEFAULT));
        assert_eq!("4".parse(), Ok(NodeFlags::ADD));
        assert_eq!("".parse(), Ok(NodeFlags::empty()));
        assert_eq!(
            "mark,bogus".parse::<NodeFlags>(),
            Err(UnknownFlagError("bogus".to_string()))
        );
    }
}
