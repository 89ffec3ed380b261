//! Burn-relevant flags reported by editors.

use enumflags2::{bitflags, BitFlags};

/// Flags an editor's content imposes on the burn.
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurnFlag {
    /// Disc-at-once writing, needed for gapless audio
    Dao = 1 << 0,
    /// Generate Joliet names
    Joliet = 1 << 1,
}

/// Human-readable list, e.g. `dao|joliet`.
pub fn describe(flags: BitFlags<BurnFlag>) -> String {
    if flags.is_empty() {
        return "none".to_string();
    }
    flags
        .iter()
        .map(|flag| match flag {
            BurnFlag::Dao => "dao",
            BurnFlag::Joliet => "joliet",
        })
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_flags() {
        assert_eq!(describe(BitFlags::empty()), "none");
        assert_eq!(describe(BurnFlag::Dao | BurnFlag::Joliet), "dao|joliet");
        assert_eq!(describe(BitFlags::all()), "dao|joliet");
    }
}
