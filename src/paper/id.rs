//! Wallpaper identifiers and flags.

use bitflags::bitflags;

/// Maps a legacy 32-bit background id into the reserved 64-bit range.
pub const fn legacy_raw_id(legacy: i32) -> u64 {
    0xFFFF_FFFF_0000_0000 | (legacy as u32 as u64)
}

const UNINITIALIZED: u64 = legacy_raw_id(-999);
const TESTING_THEME: u64 = legacy_raw_id(-666);
const TESTING_DEFAULT: u64 = legacy_raw_id(-665);
const TESTING_EDITOR: u64 = legacy_raw_id(-664);
const THEME: u64 = legacy_raw_id(-2);
const CUSTOM: u64 = legacy_raw_id(-1);
const LEGACY1_DEFAULT: u64 = legacy_raw_id(0);
const LEGACY2_DEFAULT: u64 = 5947530738516623361;
const LEGACY3_DEFAULT: u64 = 5778236420632084488;
const LEGACY4_DEFAULT: u64 = 5945087215657811969;
const DEFAULT: u64 = 5933856211186221059;
const INCORRECT_DEFAULT: u64 = legacy_raw_id(105);

/// Wallpaper identity.
///
/// Server-issued ids are `Real`. The remaining variants are the fixed set
/// of virtual wallpapers; their raw 64-bit encodings only appear at the
/// persistence boundary through [`from_raw`](Self::from_raw) and
/// [`to_raw`](Self::to_raw).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaperId {
    Real(u64),
    Theme,
    Custom,
    Default,
    Legacy1Default,
    Legacy2Default,
    Legacy3Default,
    Legacy4Default,
    /// A mis-encoded default id written by old clients; matched as legacy 2.
    IncorrectDefault,
    Uninitialized,
    TestingTheme,
    TestingDefault,
    TestingEditor,
}

impl PaperId {
    pub fn from_raw(raw: u64) -> Self {
        match raw {
            THEME => Self::Theme,
            CUSTOM => Self::Custom,
            DEFAULT => Self::Default,
            LEGACY1_DEFAULT => Self::Legacy1Default,
            LEGACY2_DEFAULT => Self::Legacy2Default,
            LEGACY3_DEFAULT => Self::Legacy3Default,
            LEGACY4_DEFAULT => Self::Legacy4Default,
            INCORRECT_DEFAULT => Self::IncorrectDefault,
            UNINITIALIZED => Self::Uninitialized,
            TESTING_THEME => Self::TestingTheme,
            TESTING_DEFAULT => Self::TestingDefault,
            TESTING_EDITOR => Self::TestingEditor,
            raw => Self::Real(raw),
        }
    }

    pub fn from_legacy(legacy: i32) -> Self {
        Self::from_raw(legacy_raw_id(legacy))
    }

    pub fn to_raw(self) -> u64 {
        match self {
            Self::Real(raw) => raw,
            Self::Theme => THEME,
            Self::Custom => CUSTOM,
            Self::Default => DEFAULT,
            Self::Legacy1Default => LEGACY1_DEFAULT,
            Self::Legacy2Default => LEGACY2_DEFAULT,
            Self::Legacy3Default => LEGACY3_DEFAULT,
            Self::Legacy4Default => LEGACY4_DEFAULT,
            Self::IncorrectDefault => INCORRECT_DEFAULT,
            Self::Uninitialized => UNINITIALIZED,
            Self::TestingTheme => TESTING_THEME,
            Self::TestingDefault => TESTING_DEFAULT,
            Self::TestingEditor => TESTING_EDITOR,
        }
    }

    /// True for the legacy-2 default, including its mis-encoded form.
    pub fn is_legacy2_default(self) -> bool {
        matches!(self, Self::Legacy2Default | Self::IncorrectDefault)
    }

    /// True if the id refers to a wallpaper the server knows about.
    pub fn is_cloud(self) -> bool {
        !matches!(
            self,
            Self::IncorrectDefault
                | Self::Theme
                | Self::Custom
                | Self::Legacy1Default
                | Self::Uninitialized
                | Self::TestingTheme
                | Self::TestingDefault
                | Self::TestingEditor
        )
    }
}

bitflags! {
    /// Wallpaper property flags as persisted in the current format.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PaperFlags: i32 {
        const CREATOR = 1 << 0;
        const DEFAULT = 1 << 1;
        const PATTERN = 1 << 2;
        const DARK = 1 << 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_ids_live_in_reserved_range() {
        assert_eq!(legacy_raw_id(-1), 0xFFFF_FFFF_FFFF_FFFF);
        assert_eq!(legacy_raw_id(0), 0xFFFF_FFFF_0000_0000);
        assert_eq!(legacy_raw_id(105), 0xFFFF_FFFF_0000_0069);
    }

    #[test]
    fn raw_translation_is_bijective() {
        let all = [
            PaperId::Theme,
            PaperId::Custom,
            PaperId::Default,
            PaperId::Legacy1Default,
            PaperId::Legacy2Default,
            PaperId::Legacy3Default,
            PaperId::Legacy4Default,
            PaperId::IncorrectDefault,
            PaperId::Uninitialized,
            PaperId::TestingTheme,
            PaperId::TestingDefault,
            PaperId::TestingEditor,
            PaperId::Real(42),
            PaperId::Real(0),
        ];
        for id in all {
            assert_eq!(PaperId::from_raw(id.to_raw()), id);
        }
    }

    #[test]
    fn legacy_lookup() {
        assert_eq!(PaperId::from_legacy(-2), PaperId::Theme);
        assert_eq!(PaperId::from_legacy(-1), PaperId::Custom);
        assert_eq!(PaperId::from_legacy(0), PaperId::Legacy1Default);
        assert_eq!(PaperId::from_legacy(105), PaperId::IncorrectDefault);
        assert_eq!(PaperId::from_legacy(7), PaperId::Real(legacy_raw_id(7)));
    }

    #[test]
    fn cloud_ids() {
        assert!(PaperId::Real(1).is_cloud());
        assert!(PaperId::Default.is_cloud());
        assert!(PaperId::Legacy3Default.is_cloud());
        assert!(!PaperId::Theme.is_cloud());
        assert!(!PaperId::TestingEditor.is_cloud());
        assert!(!PaperId::IncorrectDefault.is_cloud());
        assert!(PaperId::IncorrectDefault.is_legacy2_default());
    }
}
