//! Persisted binary layout of [`WallPaper`].
//!
//! All integers are big-endian. Strings are a `u32` byte length followed by
//! UTF-16BE code units, with `0xFFFFFFFF` marking a null string.
//!
//! ```text
//! u64 id | u64 access_hash | i32 VERSION_TAG | i32 version | i32 flags
//! string slug | i32 blurred | i32 color_count | u32[color_count] colors
//! i32 intensity | i32 rotation | u64 owner_id
//! ```
//!
//! Payloads without the version tag use the legacy layout, see
//! [`legacy`](super::legacy).

use tracing::debug;

use super::id::{PaperFlags, PaperId};
use super::legacy;
use super::{snap_rotation, WallPaper};
use crate::color::{pack_or_sentinel, unpack_or_sentinel};
use crate::error::DecodeError;

/// Marks the current layout. Legacy payloads carry their flags in this slot.
pub const VERSION_TAG: i32 = 0x7FFF_FFFF;

/// Current layout version.
pub const VERSION: i32 = 1;

const NULL_STRING: u32 = 0xFFFF_FFFF;
const MAX_COLORS: i32 = 4;

// ============================================================================
// Stream primitives
// ============================================================================

#[derive(Debug, Default)]
pub(crate) struct StreamWriter {
    buffer: Vec<u8>,
}

impl StreamWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn put_u64(&mut self, value: u64) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_i32(&mut self, value: i32) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Writes a string; empty strings are written as null.
    pub fn put_string(&mut self, value: &str) -> &mut Self {
        if value.is_empty() {
            return self.put_u32(NULL_STRING);
        }
        let units: Vec<u16> = value.encode_utf16().collect();
        self.put_u32((units.len() * 2) as u32);
        for unit in units {
            self.buffer.extend_from_slice(&unit.to_be_bytes());
        }
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }
}

pub(crate) fn string_size(value: &str) -> usize {
    4 + value.encode_utf16().count() * 2
}

#[derive(Debug)]
pub(crate) struct StreamReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> StreamReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn at_end(&self) -> bool {
        self.position >= self.data.len()
    }

    fn take<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], DecodeError> {
        let end = self.position + N;
        let bytes = self
            .data
            .get(self.position..end)
            .ok_or(DecodeError::Truncated(what))?;
        self.position = end;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn u64(&mut self, what: &'static str) -> Result<u64, DecodeError> {
        self.take::<8>(what).map(u64::from_be_bytes)
    }

    pub fn i32(&mut self, what: &'static str) -> Result<i32, DecodeError> {
        self.take::<4>(what).map(i32::from_be_bytes)
    }

    pub fn u32(&mut self, what: &'static str) -> Result<u32, DecodeError> {
        self.take::<4>(what).map(u32::from_be_bytes)
    }

    pub fn string(&mut self, what: &'static str) -> Result<String, DecodeError> {
        let length = self.u32(what)?;
        if length == NULL_STRING {
            return Ok(String::new());
        }
        if length % 2 != 0 {
            return Err(DecodeError::OddStringLength(length));
        }
        let end = self
            .position
            .checked_add(length as usize)
            .filter(|end| *end <= self.data.len())
            .ok_or(DecodeError::Truncated(what))?;
        let units: Vec<u16> = self.data[self.position..end]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        self.position = end;
        String::from_utf16(&units).map_err(|_| DecodeError::Utf16)
    }
}

// ============================================================================
// Current layout
// ============================================================================

impl WallPaper {
    /// Encodes the record in the current persisted layout.
    ///
    /// The document handle, local thumbnail and emoji id are not persisted.
    pub fn serialize(&self) -> Vec<u8> {
        let size = 8 // id
            + 8 // access hash
            + 4 // version tag
            + 4 // version
            + 4 // flags
            + string_size(&self.slug)
            + 4 // blurred
            + 4 // color count
            + self.background_colors.len() * 4
            + 4 // intensity
            + 4 // rotation
            + 8; // owner id

        let mut stream = StreamWriter::with_capacity(size);
        stream
            .put_u64(self.id.to_raw())
            .put_u64(self.access_hash)
            .put_i32(VERSION_TAG)
            .put_i32(VERSION)
            .put_i32(self.flags.bits())
            .put_string(&self.slug)
            .put_i32(i32::from(self.blurred))
            .put_i32(self.background_colors.len() as i32);
        for color in &self.background_colors {
            stream.put_u32(pack_or_sentinel(Some(*color)));
        }
        stream
            .put_i32(self.intensity)
            .put_i32(self.rotation)
            .put_u64(self.owner_id);
        stream.finish()
    }

    /// Decodes a persisted record, reporting why decoding failed.
    ///
    /// Never yields a partially populated record.
    pub fn decode(serialized: &[u8]) -> Result<Self, DecodeError> {
        if serialized.is_empty() {
            return Err(DecodeError::Empty);
        }
        let mut stream = StreamReader::new(serialized);
        let id = stream.u64("id")?;
        let access_hash = stream.u64("access hash")?;
        let tag = stream.i32("version tag")?;

        let fields = if tag == VERSION_TAG {
            read_current(&mut stream)?
        } else {
            legacy::read_legacy(&mut stream, tag)?
        };
        if !(-100..=100).contains(&fields.intensity) {
            return Err(DecodeError::Intensity(fields.intensity));
        }

        let mut result = WallPaper::new(PaperId::from_raw(id));
        result.access_hash = access_hash;
        result.owner_id = fields.owner_id;
        result.flags = fields.flags;
        result.slug = fields.slug;
        result.blurred = fields.blurred;
        result.background_colors = fields.background_colors;
        result.intensity = fields.intensity;
        result.rotation = snap_rotation(fields.rotation);
        Ok(result)
    }

    /// Decodes a persisted record; any failure yields `None`.
    pub fn from_serialized(serialized: &[u8]) -> Option<Self> {
        Self::decode(serialized)
            .map_err(|err| debug!(%err, len = serialized.len(), "discarding serialized wallpaper"))
            .ok()
    }
}

/// Fields shared by every persisted layout.
#[derive(Debug, Default)]
pub(crate) struct StoredFields {
    pub flags: PaperFlags,
    pub slug: String,
    pub blurred: bool,
    pub background_colors: Vec<crate::color::Color>,
    pub intensity: i32,
    pub rotation: i32,
    pub owner_id: u64,
}

fn read_current(stream: &mut StreamReader<'_>) -> Result<StoredFields, DecodeError> {
    let _version = stream.i32("version")?;
    let flags = stream.i32("flags")?;
    let slug = stream.string("slug")?;
    let blurred = stream.i32("blurred")?;
    let count = stream.i32("color count")?;
    if !(0..=MAX_COLORS).contains(&count) {
        return Err(DecodeError::ColorCount(count));
    }
    let mut background_colors = Vec::with_capacity(count as usize);
    for index in 0..count as usize {
        let packed = stream.u32("background color")?;
        let color = unpack_or_sentinel(packed).ok_or(DecodeError::MissingColor(index))?;
        background_colors.push(color);
    }
    let intensity = stream.i32("intensity")?;
    let rotation = stream.i32("rotation")?;
    let owner_id = stream.u64("owner id")?;
    Ok(StoredFields {
        flags: PaperFlags::from_bits_retain(flags),
        slug,
        blurred: blurred == 1,
        background_colors,
        intensity,
        rotation,
        owner_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn sample(colors: Vec<Color>) -> WallPaper {
        WallPaper::new(PaperId::Real(0x0102_0304_0506_0708))
            .with_access_hash(0xdead_beef)
            .with_owner_id(77)
            .with_flags(PaperFlags::PATTERN | PaperFlags::DARK)
            .with_slug("aBc_-.9")
            .with_background_colors(colors)
            .with_pattern_intensity(-35)
            .with_gradient_rotation(90)
            .with_blurred(true)
    }

    #[test]
    fn roundtrip_every_color_count() {
        let palette = [
            Color::rgb(1, 2, 3),
            Color::rgb(250, 0, 9),
            Color::rgb(0, 0, 0),
            Color::rgb(255, 255, 255),
        ];
        for count in 0..=4 {
            let paper = sample(palette[..count].to_vec());
            let restored = WallPaper::from_serialized(&paper.serialize()).unwrap();
            assert_eq!(restored, paper, "count {count}");
        }
    }

    #[test]
    fn roundtrip_sentinel_ids() {
        for paper in [WallPaper::theme(), WallPaper::construct_default(), WallPaper::testing_default()] {
            let restored = WallPaper::from_serialized(&paper.serialize()).unwrap();
            assert_eq!(restored, paper);
        }
    }

    #[test]
    fn header_layout_is_big_endian() {
        let bytes = WallPaper::new(PaperId::Real(1)).serialize();
        assert_eq!(&bytes[0..8], &[0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(&bytes[16..20], &[0x7f, 0xff, 0xff, 0xff]);
        assert_eq!(&bytes[20..24], &[0, 0, 0, 1]);
        // Empty slug is a null string.
        assert_eq!(&bytes[28..32], &[0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn slug_is_utf16() {
        let bytes = WallPaper::new(PaperId::Real(1)).with_slug("ab").serialize();
        assert_eq!(&bytes[28..36], &[0, 0, 0, 4, 0, b'a', 0, b'b']);
    }

    #[test]
    fn rejects_empty_and_truncated() {
        assert_eq!(WallPaper::decode(&[]), Err(DecodeError::Empty));
        let bytes = sample(vec![Color::rgb(1, 1, 1)]).serialize();
        for cut in [4, 17, 30, bytes.len() - 1] {
            assert!(
                WallPaper::from_serialized(&bytes[..cut]).is_none(),
                "cut at {cut}"
            );
        }
    }

    fn current_payload(count: i32, colors: &[u32], intensity: i32) -> Vec<u8> {
        let mut stream = StreamWriter::default();
        stream
            .put_u64(5)
            .put_u64(6)
            .put_i32(VERSION_TAG)
            .put_i32(VERSION)
            .put_i32(PaperFlags::PATTERN.bits())
            .put_string("slug")
            .put_i32(0)
            .put_i32(count);
        for color in colors {
            stream.put_u32(*color);
        }
        stream.put_i32(intensity).put_i32(0).put_u64(0);
        stream.finish()
    }

    #[test]
    fn rejects_bad_color_count() {
        assert_eq!(
            WallPaper::decode(&current_payload(5, &[0; 5], 0)),
            Err(DecodeError::ColorCount(5))
        );
        assert_eq!(
            WallPaper::decode(&current_payload(-1, &[], 0)),
            Err(DecodeError::ColorCount(-1))
        );
    }

    #[test]
    fn rejects_sentinel_color() {
        assert_eq!(
            WallPaper::decode(&current_payload(2, &[0x112233, 0xFFFF_FFFF], 0)),
            Err(DecodeError::MissingColor(1))
        );
    }

    #[test]
    fn intensity_bounds() {
        assert!(WallPaper::from_serialized(&current_payload(0, &[], 100)).is_some());
        assert!(WallPaper::from_serialized(&current_payload(0, &[], -100)).is_some());
        assert_eq!(
            WallPaper::decode(&current_payload(0, &[], 101)),
            Err(DecodeError::Intensity(101))
        );
        assert_eq!(
            WallPaper::decode(&current_payload(0, &[], -101)),
            Err(DecodeError::Intensity(-101))
        );
    }

    #[test]
    fn rejects_odd_string_length() {
        let mut stream = StreamWriter::default();
        stream
            .put_u64(1)
            .put_u64(1)
            .put_i32(VERSION_TAG)
            .put_i32(VERSION)
            .put_i32(0)
            .put_u32(3);
        assert_eq!(
            WallPaper::decode(&stream.finish()),
            Err(DecodeError::OddStringLength(3))
        );
    }
}
