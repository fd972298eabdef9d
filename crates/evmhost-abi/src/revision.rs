//! Protocol revisions and the feature schedule they are selected from.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Protocol revision tag, ordered oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum Revision {
    /// Baseline revision.
    Frontier = 0,
    /// Adds `DELEGATECALL`.
    Homestead = 1,
    /// Gas repricing of IO-heavy operations.
    TangerineWhistle = 2,
    /// State-clearing rules.
    SpuriousDragon = 3,
    /// Adds `REVERT`, `RETURNDATA*` and `STATICCALL`.
    Byzantium = 4,
    /// Adds `CREATE2`, bitwise shifts and `EXTCODEHASH`.
    Constantinople = 5,
}

impl Revision {
    /// All revisions, oldest first.
    pub const ALL: [Revision; 6] = [
        Revision::Frontier,
        Revision::Homestead,
        Revision::TangerineWhistle,
        Revision::SpuriousDragon,
        Revision::Byzantium,
        Revision::Constantinople,
    ];

    /// The newest revision known to this crate.
    pub const LATEST: Revision = Revision::Constantinople;

    /// Returns the lowercase name used in configuration and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Revision::Frontier => "frontier",
            Revision::Homestead => "homestead",
            Revision::TangerineWhistle => "tangerine_whistle",
            Revision::SpuriousDragon => "spurious_dragon",
            Revision::Byzantium => "byzantium",
            Revision::Constantinople => "constantinople",
        }
    }

    /// Returns the value passed across the plugin ABI.
    pub fn as_raw(&self) -> i32 {
        *self as i32
    }

    /// Converts a raw ABI value back into a revision.
    pub fn from_raw(raw: i32) -> Option<Revision> {
        Revision::ALL.get(usize::try_from(raw).ok()?).copied()
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown revision name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown revision '{0}' (expected one of: frontier, homestead, tangerine_whistle, spurious_dragon, byzantium, constantinople)")]
pub struct UnknownRevision(pub String);

impl FromStr for Revision {
    type Err = UnknownRevision;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Revision::ALL
            .iter()
            .find(|rev| rev.as_str() == normalized)
            .copied()
            .ok_or_else(|| UnknownRevision(s.to_string()))
    }
}

/// Feature flags of the active chain configuration.
///
/// Enabling a newer flag is expected to imply all older ones; this is not
/// checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSchedule {
    /// `DELEGATECALL` is available.
    pub have_delegate_call: bool,
    /// Increased-cost repricing (EIP-150).
    pub eip150_mode: bool,
    /// State-clearing rules (EIP-158).
    pub eip158_mode: bool,
    /// `REVERT` with output is available.
    pub have_revert: bool,
    /// `CREATE2` is available.
    pub have_create2: bool,
}

impl FeatureSchedule {
    /// Schedule with every flag cleared.
    pub const FRONTIER: FeatureSchedule = FeatureSchedule {
        have_delegate_call: false,
        eip150_mode: false,
        eip158_mode: false,
        have_revert: false,
        have_create2: false,
    };

    /// Returns the canonical schedule for a revision: its own flag and every older one.
    pub fn for_revision(revision: Revision) -> Self {
        FeatureSchedule {
            have_delegate_call: revision >= Revision::Homestead,
            eip150_mode: revision >= Revision::TangerineWhistle,
            eip158_mode: revision >= Revision::SpuriousDragon,
            have_revert: revision >= Revision::Byzantium,
            have_create2: revision >= Revision::Constantinople,
        }
    }

    /// Shorthand for [`select_revision`].
    pub fn revision(&self) -> Revision {
        select_revision(self)
    }
}

/// Selects the protocol revision for a feature schedule.
///
/// Flags are checked newest first and the first one set wins; with no flag
/// set the baseline revision is returned.
pub fn select_revision(schedule: &FeatureSchedule) -> Revision {
    if schedule.have_create2 {
        return Revision::Constantinople;
    }
    if schedule.have_revert {
        return Revision::Byzantium;
    }
    if schedule.eip158_mode {
        return Revision::SpuriousDragon;
    }
    if schedule.eip150_mode {
        return Revision::TangerineWhistle;
    }
    if schedule.have_delegate_call {
        return Revision::Homestead;
    }
    Revision::Frontier
}
