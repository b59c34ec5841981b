//! Encoding normalization for historical file content.
//!
//! Content read back from the backend is in whatever encoding the file was
//! committed with. Callers work in UTF-8, so declared non-UTF-8 content is
//! stripped of its byte-order mark and transcoded line by line.
//!
//! 16-bit and 32-bit fixed-width encodings are declared-but-not-transcoded:
//! splitting on `\n` bytes is meaningless for them, so they pass through
//! as-is.

use encoding_rs::{Encoding, GB18030, UTF_8, UTF_16BE, UTF_16LE};

/// The encoding callers process text in.
pub const CANONICAL: &str = "utf-8";

/// Look up the transcoder for `declared`, if one applies.
///
/// Returns `None` for the canonical encoding, for fixed-width 16/32-bit
/// encodings and for labels the transcoder does not know.
#[must_use]
pub fn transcoder_for(declared: &str) -> Option<&'static Encoding> {
    let label = declared.trim().to_ascii_lowercase();
    if is_fixed_width(&label) {
        return None;
    }

    let encoding = Encoding::for_label(label.as_bytes())?;
    if encoding == UTF_8 || encoding == UTF_16LE || encoding == UTF_16BE {
        return None;
    }
    Some(encoding)
}

fn is_fixed_width(label: &str) -> bool {
    let compact: String = label.chars().filter(|c| *c != '-' && *c != '_').collect();
    ["utf16", "utf32", "ucs2", "ucs4", "unicode"]
        .iter()
        .any(|prefix| compact.starts_with(prefix))
}

/// The byte-order mark for a transcoded `encoding`, if it has one.
///
/// Only encodings [`transcoder_for`] can return are covered; UTF-8 and UTF-16
/// never reach transcoding.
#[must_use]
pub fn bom_for(encoding: &'static Encoding) -> Option<&'static [u8]> {
    (encoding == GB18030).then_some(&b"\x84\x31\x95\x33"[..])
}

/// Decode raw content lines into canonical text.
///
/// When `declared` needs transcoding, a BOM at the start of the first line is
/// removed and every line is converted. Otherwise lines are decoded as UTF-8,
/// replacing invalid sequences.
#[must_use]
pub fn normalize(lines: Vec<Vec<u8>>, declared: &str) -> Vec<String> {
    let Some(encoding) = transcoder_for(declared) else {
        return lines
            .into_iter()
            .map(|line| String::from_utf8_lossy(&line).into_owned())
            .collect();
    };

    let bom = bom_for(encoding);
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let bytes = match bom {
                Some(bom) if i == 0 && line.starts_with(bom) => &line[bom.len()..],
                _ => &line[..],
            };
            encoding.decode_without_bom_handling(bytes).0.into_owned()
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use encoding_rs::{SHIFT_JIS, WINDOWS_1252};
    use proptest::prelude::*;

    #[test]
    fn test_canonical_is_noop() {
        assert!(transcoder_for("utf-8").is_none());
        assert!(transcoder_for("UTF8").is_none());
        let lines = vec![b"caf\xC3\xA9".to_vec()];
        assert_eq!(normalize(lines, "utf-8"), vec!["café".to_string()]);
    }

    #[test]
    fn test_fixed_width_encodings_are_not_transcoded() {
        for label in ["utf-16", "utf-16le", "UTF-16BE", "utf-32", "utf-32le", "ucs-2", "ucs-4"] {
            assert!(transcoder_for(label).is_none(), "{label} should be skipped");
        }
        let raw = b"a\x00".to_vec();
        assert_eq!(normalize(vec![raw], "utf-16le"), vec!["a\u{0}".to_string()]);
    }

    #[test]
    fn test_unknown_label_is_noop() {
        assert!(transcoder_for("klingon-8").is_none());
    }

    #[test]
    fn test_latin1_transcodes() {
        let lines = vec![b"caf\xE9".to_vec(), b"na\xEFve".to_vec()];
        assert_eq!(
            normalize(lines, "latin1"),
            vec!["café".to_string(), "naïve".to_string()]
        );
    }

    #[test]
    fn test_gb18030_bom_stripped_from_first_line_only() {
        let lines = vec![
            b"\x84\x31\x95\x33\xD6\xD0".to_vec(),
            b"\x84\x31\x95\x33\xCE\xC4".to_vec(),
        ];
        let out = normalize(lines, "gb18030");
        assert_eq!(out[0], "中");
        assert_eq!(out[1], "\u{FEFF}文");
    }

    #[test]
    fn test_bom_for() {
        assert_eq!(bom_for(UTF_8), None);
        assert_eq!(bom_for(GB18030), Some(&b"\x84\x31\x95\x33"[..]));
        assert_eq!(bom_for(WINDOWS_1252), None);
    }

    #[test]
    fn test_shift_jis_roundtrip() {
        let original = "日本語のテキスト";
        let (encoded, _, _) = SHIFT_JIS.encode(original);
        let out = normalize(vec![encoded.into_owned()], "shift_jis");
        assert_eq!(out, vec![original.to_string()]);
    }

    proptest! {
        #[test]
        fn prop_gb18030_bom_strip_roundtrip(text in "[a-z\u{4e00}-\u{4e80}]{0,16}") {
            let (encoded, _, _) = GB18030.encode(&text);
            let mut line = b"\x84\x31\x95\x33".to_vec();
            line.extend_from_slice(&encoded);

            let out = normalize(vec![line], "gb18030");
            let (reencoded, _, _) = GB18030.encode(&out[0]);
            prop_assert_eq!(reencoded.as_ref(), encoded.as_ref());
        }

        #[test]
        fn prop_windows_1252_roundtrip(
            bytes in prop::collection::vec(
                prop_oneof![0x20u8..0x7F, 0xA0u8..=0xFF],
                0..64,
            ),
        ) {
            let out = normalize(vec![bytes.clone()], "windows-1252");
            let (reencoded, _, _) = WINDOWS_1252.encode(&out[0]);
            prop_assert_eq!(reencoded.as_ref(), &bytes[..]);
        }
    }
}
