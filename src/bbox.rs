//! Generic ISO BMFF box-tree walker shared by the MP4/MOV parser.
//!
//! Grounded on the box-walk shape implied by
//! `sceneforged-probe/src/container/mp4.rs` (which previously delegated to
//! `mp4parse`); rewritten here as a direct reader since the box walk is
//! itself a named component.

use crate::reader::ByteReader;

/// One box header: its 4-character type and the byte range of its payload
/// (excluding the header) within the buffer that was walked.
#[derive(Debug, Clone, Copy)]
pub struct BoxHeader {
    pub box_type: [u8; 4],
    pub payload_start: usize,
    pub payload_end: usize,
}

impl BoxHeader {
    pub fn payload<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.payload_start..self.payload_end]
    }

    pub fn type_str(&self) -> String {
        String::from_utf8_lossy(&self.box_type).into_owned()
    }
}

/// Walk the top-level boxes of `data`, stopping at the first box whose
/// declared size is smaller than the header it would need, or that
/// extends past the end of `data`.
pub fn walk_boxes(data: &[u8]) -> Vec<BoxHeader> {
    let mut boxes = Vec::new();
    let mut offset = 0usize;

    while offset + 8 <= data.len() {
        let mut r = ByteReader::new(&data[offset..]);
        let Ok(size32) = r.read_u32() else { break };
        let Ok(box_type) = r.read_tag() else { break };

        let (header_len, size) = if size32 == 1 {
            let Ok(size64) = r.read_u64() else { break };
            (16usize, size64 as usize)
        } else if size32 == 0 {
            (8usize, data.len() - offset)
        } else {
            (8usize, size32 as usize)
        };

        if size < header_len || offset + size > data.len() {
            break;
        }

        boxes.push(BoxHeader {
            box_type,
            payload_start: offset + header_len,
            payload_end: offset + size,
        });

        offset += size;
    }

    boxes
}

/// Find the first top-level box of a given type.
pub fn find_box<'a>(boxes: &'a [BoxHeader], box_type: &[u8; 4]) -> Option<&'a BoxHeader> {
    boxes.iter().find(|b| &b.box_type == box_type)
}

/// Walk `stsd`'s children: its payload starts with a 4-byte version+flags
/// field and a 4-byte entry count before the first sample-entry box, so
/// the effective box-walk root is 8 bytes into the payload (16 from the
/// box start).
pub fn walk_stsd_entries(stsd_payload: &[u8]) -> Vec<BoxHeader> {
    if stsd_payload.len() < 8 {
        return Vec::new();
    }
    walk_boxes(&stsd_payload[8..])
        .into_iter()
        .map(|mut b| {
            b.payload_start += 8;
            b.payload_end += 8;
            b
        })
        .collect()
}

/// Walk the child boxes of a video sample entry (`avc1`, `hev1`, `hvc1`,
/// `vp08`, `vp09`, `av01`, `mp4v`), skipping its 78-byte fixed prefix.
pub const VIDEO_SAMPLE_ENTRY_PREFIX: usize = 78;
/// Same, for an audio sample entry (`mp4a`, ...): 28-byte fixed prefix.
pub const AUDIO_SAMPLE_ENTRY_PREFIX: usize = 28;

pub fn walk_sample_entry_children(entry_payload: &[u8], prefix: usize) -> Vec<BoxHeader> {
    if entry_payload.len() < prefix {
        return Vec::new();
    }
    walk_boxes(&entry_payload[prefix..])
        .into_iter()
        .map(|mut b| {
            b.payload_start += prefix;
            b.payload_end += prefix;
            b
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_box(box_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&((8 + payload.len()) as u32).to_be_bytes());
        out.extend_from_slice(box_type);
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn walks_two_sibling_boxes() {
        let mut data = make_box(b"ftyp", b"isom");
        data.extend(make_box(b"free", b""));
        let boxes = walk_boxes(&data);
        assert_eq!(boxes.len(), 2);
        assert_eq!(&boxes[0].box_type, b"ftyp");
        assert_eq!(boxes[0].payload(&data), b"isom");
        assert_eq!(&boxes[1].box_type, b"free");
    }

    #[test]
    fn extended_size_64_bit() {
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(b"mdat");
        data.extend_from_slice(&24u64.to_be_bytes());
        data.extend_from_slice(&[0u8; 8]);
        let boxes = walk_boxes(&data);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].payload_end - boxes[0].payload_start, 8);
    }

    #[test]
    fn size_zero_extends_to_eof() {
        let mut data = Vec::new();
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(b"mdat");
        data.extend_from_slice(&[1, 2, 3, 4]);
        let boxes = walk_boxes(&data);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].payload(&data), &[1, 2, 3, 4]);
    }

    #[test]
    fn truncated_size_stops_walk() {
        let mut data = Vec::new();
        data.extend_from_slice(&4u32.to_be_bytes()); // smaller than header
        data.extend_from_slice(b"ftyp");
        let boxes = walk_boxes(&data);
        assert!(boxes.is_empty());
    }

    #[test]
    fn oversized_box_stops_walk() {
        let mut data = Vec::new();
        data.extend_from_slice(&1000u32.to_be_bytes());
        data.extend_from_slice(b"ftyp");
        let boxes = walk_boxes(&data);
        assert!(boxes.is_empty());
    }
}
