//! Decoder for the binary "lite variant" descriptor ND2 uses for its
//! metadata chunks.
//!
//! A descriptor is a run of items. Each item is a type byte, a name length
//! byte (UTF-16 code units including the terminating NUL), the UTF-16LE
//! name, then a value whose encoding depends on the type. Level items nest
//! a further run of items. Repeated names within one level become a
//! [`RawNode::Seq`].

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;

use crate::error::ExtractionCause;
use crate::tree::{RawMap, RawNode};

/// Item type tags.
pub mod item_type {
    pub const VOID: u8 = 0;
    pub const BOOL: u8 = 1;
    pub const INT32: u8 = 2;
    pub const UINT32: u8 = 3;
    pub const INT64: u8 = 4;
    pub const UINT64: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const VOID_POINTER: u8 = 7;
    pub const STRING: u8 = 8;
    pub const BYTE_ARRAY: u8 = 9;
    pub const DEPRECATED: u8 = 10;
    pub const LEVEL: u8 = 11;
    pub const COMPRESSED: u8 = 76;
}

/// Bytes preceding the zlib stream of a compressed item.
const COMPRESSED_PREFIX_LEN: usize = 10;
const MAX_DEPTH: usize = 64;

/// Decode a descriptor into a map of its top-level items.
pub fn decode(data: &[u8]) -> Result<RawNode, ExtractionCause> {
    let map = decode_items(data, None, 0)?;
    Ok(RawNode::Map(map))
}

fn invalid(message: impl Into<String>) -> ExtractionCause {
    ExtractionCause::InvalidContainer(format!("CLX descriptor: {}", message.into()))
}

/// Decode up to `count` items, or until the data runs out.
fn decode_items(data: &[u8], count: Option<usize>, depth: usize) -> Result<RawMap, ExtractionCause> {
    if depth > MAX_DEPTH {
        return Err(invalid("nesting too deep"));
    }

    let mut map = RawMap::new();
    let mut cursor = Cursor::new(data);
    let mut decoded = 0usize;

    while count.map_or(true, |n| decoded < n) && (cursor.position() as usize) < data.len() {
        let item_start = cursor.position();
        let kind = cursor.read_u8().map_err(|_| invalid("truncated item header"))?;
        let name_len = cursor.read_u8().map_err(|_| invalid("truncated item header"))?;
        let name = read_utf16(&mut cursor, usize::from(name_len))?;

        let value = match kind {
            item_type::BOOL => RawNode::Bool(read(&mut cursor, |c| c.read_u8())? != 0),
            item_type::INT32 => RawNode::Int(i64::from(read(&mut cursor, |c| c.read_i32::<LittleEndian>())?)),
            item_type::UINT32 => RawNode::Int(i64::from(read(&mut cursor, |c| c.read_u32::<LittleEndian>())?)),
            item_type::INT64 => RawNode::Int(read(&mut cursor, |c| c.read_i64::<LittleEndian>())?),
            item_type::UINT64 | item_type::VOID_POINTER => {
                let value = read(&mut cursor, |c| c.read_u64::<LittleEndian>())?;
                i64::try_from(value).map(RawNode::Int).unwrap_or(RawNode::Float(value as f64))
            }
            item_type::DOUBLE => RawNode::Float(read(&mut cursor, |c| c.read_f64::<LittleEndian>())?),
            item_type::STRING => RawNode::Text(read_utf16_until_nul(&mut cursor)?),
            item_type::BYTE_ARRAY => {
                let size = read(&mut cursor, |c| c.read_u64::<LittleEndian>())?;
                skip(&mut cursor, data.len(), size)?;
                RawNode::Absent
            }
            item_type::LEVEL => {
                let items = read(&mut cursor, |c| c.read_u32::<LittleEndian>())?;
                let length = read(&mut cursor, |c| c.read_u64::<LittleEndian>())?;
                let header_len = cursor.position() - item_start;
                let nested_len = length
                    .checked_sub(header_len)
                    .ok_or_else(|| invalid(format!("level {:?} shorter than its header", name)))?;
                let start = cursor.position() as usize;
                let end = start
                    .checked_add(usize::try_from(nested_len).map_err(|_| invalid("level too long"))?)
                    .filter(|&end| end <= data.len())
                    .ok_or_else(|| invalid(format!("level {:?} runs past the data", name)))?;
                let nested = decode_items(&data[start..end], Some(items as usize), depth + 1)?;
                cursor.set_position(end as u64);
                // Each level is followed by an offset table of one u64 per item
                skip(&mut cursor, data.len(), u64::from(items) * 8)?;
                RawNode::Map(nested)
            }
            item_type::COMPRESSED => {
                let start = cursor.position() as usize + COMPRESSED_PREFIX_LEN;
                if start > data.len() {
                    return Err(invalid("truncated compressed item"));
                }
                let mut inflated = Vec::new();
                ZlibDecoder::new(&data[start..])
                    .read_to_end(&mut inflated)
                    .map_err(|e| invalid(format!("compressed item: {}", e)))?;
                cursor.set_position(data.len() as u64);
                RawNode::Map(decode_items(&inflated, None, depth + 1)?)
            }
            item_type::VOID => RawNode::Absent,
            item_type::DEPRECATED => return Err(invalid("deprecated item type")),
            other => return Err(invalid(format!("unknown item type {}", other))),
        };

        map.append(name, value);
        decoded += 1;
    }

    Ok(map)
}

fn read<T>(
    cursor: &mut Cursor<&[u8]>,
    op: impl FnOnce(&mut Cursor<&[u8]>) -> std::io::Result<T>,
) -> Result<T, ExtractionCause> {
    op(cursor).map_err(|_| invalid("truncated value"))
}

fn skip(cursor: &mut Cursor<&[u8]>, len: usize, bytes: u64) -> Result<(), ExtractionCause> {
    let target = cursor
        .position()
        .checked_add(bytes)
        .filter(|&target| target <= len as u64)
        .ok_or_else(|| invalid("value runs past the data"))?;
    cursor.set_position(target);
    Ok(())
}

/// Read `units` UTF-16LE code units and drop the terminating NUL.
fn read_utf16(cursor: &mut Cursor<&[u8]>, units: usize) -> Result<String, ExtractionCause> {
    let mut buf = Vec::with_capacity(units);
    for _ in 0..units {
        buf.push(read(cursor, |c| c.read_u16::<LittleEndian>())?);
    }
    while buf.last() == Some(&0) {
        buf.pop();
    }
    Ok(String::from_utf16(&buf)?)
}

fn read_utf16_until_nul(cursor: &mut Cursor<&[u8]>) -> Result<String, ExtractionCause> {
    let mut buf = Vec::new();
    loop {
        match read(cursor, |c| c.read_u16::<LittleEndian>())? {
            0 => break,
            unit => buf.push(unit),
        }
    }
    Ok(String::from_utf16(&buf)?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    /// Minimal encoder for test descriptors.
    #[derive(Debug, Clone)]
    pub enum Item {
        Int(&'static str, i32),
        UInt(&'static str, u32),
        Double(&'static str, f64),
        Text(&'static str, &'static str),
        Bytes(&'static str, Vec<u8>),
        Level(&'static str, Vec<Item>),
    }

    fn name(buf: &mut Vec<u8>, kind: u8, name: &str) {
        let units: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
        buf.write_u8(kind).unwrap();
        buf.write_u8(units.len() as u8).unwrap();
        for unit in units {
            buf.write_u16::<LittleEndian>(unit).unwrap();
        }
    }

    pub fn encode(items: &[Item]) -> Vec<u8> {
        let mut buf = Vec::new();
        for item in items {
            encode_item(&mut buf, item);
        }
        buf
    }

    fn encode_item(buf: &mut Vec<u8>, item: &Item) {
        match item {
            Item::Int(n, v) => {
                name(buf, item_type::INT32, n);
                buf.write_i32::<LittleEndian>(*v).unwrap();
            }
            Item::UInt(n, v) => {
                name(buf, item_type::UINT32, n);
                buf.write_u32::<LittleEndian>(*v).unwrap();
            }
            Item::Double(n, v) => {
                name(buf, item_type::DOUBLE, n);
                buf.write_f64::<LittleEndian>(*v).unwrap();
            }
            Item::Text(n, v) => {
                name(buf, item_type::STRING, n);
                for unit in v.encode_utf16().chain(std::iter::once(0)) {
                    buf.write_u16::<LittleEndian>(unit).unwrap();
                }
            }
            Item::Bytes(n, v) => {
                name(buf, item_type::BYTE_ARRAY, n);
                buf.write_u64::<LittleEndian>(v.len() as u64).unwrap();
                buf.extend_from_slice(v);
            }
            Item::Level(n, children) => {
                let start = buf.len();
                name(buf, item_type::LEVEL, n);
                let nested = encode(children);
                let header_len = (buf.len() - start) + 12;
                buf.write_u32::<LittleEndian>(children.len() as u32).unwrap();
                buf.write_u64::<LittleEndian>((header_len + nested.len()) as u64)
                    .unwrap();
                buf.extend_from_slice(&nested);
                for _ in children {
                    buf.write_u64::<LittleEndian>(0).unwrap();
                }
            }
        }
    }

    #[test]
    fn test_decodes_scalars_and_levels() {
        let data = encode(&[Item::Level(
            "SLxImageAttributes",
            vec![
                Item::UInt("uiWidth", 512),
                Item::Int("iOffset", -3),
                Item::Double("dCalibration", 0.1625),
                Item::Text("wsName", "Ex µ"),
                Item::Bytes("pBlob", vec![1, 2, 3]),
                Item::Level("sInner", vec![Item::UInt("uiCount", 4)]),
                Item::UInt("uiHeight", 256),
            ],
        )]);
        let tree = decode(&data).unwrap();
        let attrs = tree.get("SLxImageAttributes").unwrap();

        assert_eq!(attrs.get("uiWidth"), Some(&RawNode::Int(512)));
        assert_eq!(attrs.get("iOffset"), Some(&RawNode::Int(-3)));
        assert_eq!(attrs.get("dCalibration"), Some(&RawNode::Float(0.1625)));
        assert_eq!(attrs.get("wsName"), Some(&RawNode::text("Ex µ")));
        assert_eq!(attrs.get("pBlob"), Some(&RawNode::Absent));
        assert_eq!(attrs.path(&["sInner", "uiCount"]), Some(&RawNode::Int(4)));
        assert_eq!(attrs.get("uiHeight"), Some(&RawNode::Int(256)));
    }

    #[test]
    fn test_repeated_names_become_a_sequence() {
        let data = encode(&[
            Item::Text("a", "x"),
            Item::Text("a", "y"),
            Item::Text("b", "z"),
        ]);
        let tree = decode(&data).unwrap();
        assert_eq!(
            tree.get("a"),
            Some(&RawNode::Seq(vec![RawNode::text("x"), RawNode::text("y")]))
        );
        assert_eq!(tree.get("b"), Some(&RawNode::text("z")));
    }

    #[test]
    fn test_truncated_value_is_an_error() {
        let mut data = encode(&[Item::Double("dZoom", 2.0)]);
        data.truncate(data.len() - 2);
        assert!(matches!(decode(&data), Err(ExtractionCause::InvalidContainer(_))));
    }

    #[test]
    fn test_level_length_past_end_is_an_error() {
        let mut data = encode(&[Item::Level("s", vec![Item::UInt("u", 1)])]);
        // Corrupt the level length, stored after the 2 header bytes, name and item count
        let length_at = 2 + 2 * 2 + 4;
        data[length_at..length_at + 8].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(decode(&data), Err(ExtractionCause::InvalidContainer(_))));
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let mut data = Vec::new();
        name(&mut data, 42, "x");
        assert!(matches!(decode(&data), Err(ExtractionCause::InvalidContainer(_))));
    }

    #[test]
    fn test_compressed_payload() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let inner = encode(&[Item::UInt("uiCount", 7)]);
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&inner).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut data = Vec::new();
        name(&mut data, item_type::COMPRESSED, "z");
        data.extend_from_slice(&[0u8; COMPRESSED_PREFIX_LEN]);
        data.extend_from_slice(&compressed);

        let tree = decode(&data).unwrap();
        assert_eq!(tree.path(&["z", "uiCount"]), Some(&RawNode::Int(7)));
    }

    #[test]
    fn test_empty_descriptor() {
        assert_eq!(decode(&[]).unwrap(), RawNode::Map(RawMap::new()));
    }
}
