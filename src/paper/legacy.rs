//! Migration from older wallpaper representations.
//!
//! Three shapes predate the current layout: bare legacy ids, the
//! `(id, access_hash, flags, slug)` tuple, and the untagged serialized
//! layout:
//!
//! ```text
//! u64 id | u64 access_hash | i32 legacy_flags | string slug
//! i32 settings | u32 color | i32 intensity [| i32 owner_low [| i32 owner_high]]
//! ```

use super::id::{PaperFlags, PaperId};
use super::serialize::{StoredFields, StreamReader};
use super::WallPaper;
use crate::color::{from_hex6, unpack_or_sentinel};
use crate::error::DecodeError;

/// Blur bit in the legacy settings word.
const LEGACY_BLUR_BIT: i32 = 1 << 1;

/// Remaps legacy flag bits onto [`PaperFlags`].
///
/// Bit 0 is Creator, bit 1 Default, bit 3 Pattern, bit 4 Dark. Bit 2 was
/// never assigned and is ignored.
pub fn flags_from_legacy(legacy: i32) -> PaperFlags {
    let mut flags = PaperFlags::empty();
    flags.set(PaperFlags::CREATOR, legacy & (1 << 0) != 0);
    flags.set(PaperFlags::DEFAULT, legacy & (1 << 1) != 0);
    flags.set(PaperFlags::PATTERN, legacy & (1 << 3) != 0);
    flags.set(PaperFlags::DARK, legacy & (1 << 4) != 0);
    flags
}

/// Reads the untagged layout after the id, access hash and flags word.
pub(crate) fn read_legacy(
    stream: &mut StreamReader<'_>,
    legacy_flags: i32,
) -> Result<StoredFields, DecodeError> {
    let slug = stream.string("slug")?;
    let settings = stream.i32("settings")?;
    let background_color = stream.u32("background color")?;
    let intensity = stream.i32("intensity")?;

    let mut owner_id = 0u64;
    if !stream.at_end() {
        let low = stream.i32("owner id")? as u32;
        let high = if stream.at_end() {
            0
        } else {
            stream.i32("owner id")? as u32
        };
        owner_id = u64::from(low) | (u64::from(high) << 32);
    }

    Ok(StoredFields {
        flags: flags_from_legacy(legacy_flags),
        slug,
        blurred: settings & LEGACY_BLUR_BIT != 0,
        background_colors: unpack_or_sentinel(background_color).into_iter().collect(),
        intensity,
        rotation: 0,
        owner_id,
    })
}

impl WallPaper {
    /// Builds a record from a bare legacy background id.
    ///
    /// Every legacy id except the custom one denotes a default wallpaper.
    pub fn from_legacy_id(legacy: i32) -> Self {
        let mut result = WallPaper::new(PaperId::from_legacy(legacy));
        if result.id != PaperId::Custom {
            result.flags = PaperFlags::DEFAULT;
        }
        result
    }

    /// Builds a record from the oldest stored tuple.
    ///
    /// A slug that is a hex color doubles as the single background color.
    pub fn from_legacy_serialized(id: u64, access_hash: u64, flags: u32, slug: &str) -> Self {
        let mut result = WallPaper::new(PaperId::from_raw(id));
        result.access_hash = access_hash;
        result.flags = flags_from_legacy(flags as i32);
        result.slug = slug.to_string();
        result.background_colors = from_hex6(slug).into_iter().collect();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::super::serialize::StreamWriter;
    use super::*;
    use crate::color::Color;

    #[test]
    fn legacy_flag_mapping() {
        let flags = flags_from_legacy(0b0000_1011);
        assert_eq!(flags, PaperFlags::CREATOR | PaperFlags::DEFAULT | PaperFlags::PATTERN);
        assert!(!flags.contains(PaperFlags::DARK));
    }

    #[test]
    fn legacy_bit_two_is_ignored() {
        assert_eq!(flags_from_legacy(1 << 2), PaperFlags::empty());
        assert_eq!(flags_from_legacy(1 << 4), PaperFlags::DARK);
    }

    fn legacy_payload(owner: &[i32]) -> Vec<u8> {
        let mut stream = StreamWriter::default();
        stream
            .put_u64(900)
            .put_u64(901)
            .put_i32(0b1_1000)
            .put_string("legacy")
            .put_i32(LEGACY_BLUR_BIT)
            .put_u32(0x00ff_8000)
            .put_i32(60);
        for word in owner {
            stream.put_i32(*word);
        }
        stream.finish()
    }

    #[test]
    fn decodes_legacy_layout() {
        let paper = WallPaper::from_serialized(&legacy_payload(&[])).unwrap();
        assert_eq!(paper.id(), PaperId::Real(900));
        assert_eq!(paper.access_hash(), 901);
        assert!(paper.is_pattern());
        assert!(paper.is_dark());
        assert!(paper.is_blurred());
        assert_eq!(paper.slug(), "legacy");
        assert_eq!(paper.background_colors(), &[Color::rgb(0xff, 0x80, 0x00)]);
        assert_eq!(paper.pattern_intensity(), 60);
        assert_eq!(paper.owner_id(), 0);
    }

    #[test]
    fn legacy_owner_words() {
        let low_only = WallPaper::from_serialized(&legacy_payload(&[5])).unwrap();
        assert_eq!(low_only.owner_id(), 5);

        let both = WallPaper::from_serialized(&legacy_payload(&[-1, 2])).unwrap();
        assert_eq!(both.owner_id(), 0x0000_0002_FFFF_FFFF);
    }

    #[test]
    fn legacy_sentinel_color_means_none() {
        let mut stream = StreamWriter::default();
        stream
            .put_u64(1)
            .put_u64(2)
            .put_i32(0)
            .put_string("")
            .put_i32(0)
            .put_u32(0xFFFF_FFFF)
            .put_i32(0);
        let paper = WallPaper::from_serialized(&stream.finish()).unwrap();
        assert!(paper.background_colors().is_empty());
    }

    #[test]
    fn legacy_truncated_fails() {
        let bytes = legacy_payload(&[]);
        assert!(WallPaper::from_serialized(&bytes[..bytes.len() - 2]).is_none());
    }

    #[test]
    fn from_legacy_id_flags() {
        assert!(WallPaper::from_legacy_id(0).is_default());
        assert_eq!(WallPaper::from_legacy_id(0).id(), PaperId::Legacy1Default);
        let custom = WallPaper::from_legacy_id(-1);
        assert_eq!(custom.id(), PaperId::Custom);
        assert!(!custom.is_default());
    }

    #[test]
    fn from_legacy_serialized_hex_slug() {
        let paper = WallPaper::from_legacy_serialized(3, 4, 0b1000, "a0b0c0");
        assert!(paper.is_pattern());
        assert_eq!(paper.background_colors(), &[Color::rgb(0xa0, 0xb0, 0xc0)]);

        let named = WallPaper::from_legacy_serialized(3, 4, 0, "named");
        assert!(named.background_colors().is_empty());
        assert_eq!(named.slug(), "named");
    }
}
