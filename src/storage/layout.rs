//! File naming inside an index directory.
//!
//! ```text
//! segments_<gen>            published manifest, highest generation wins
//! pending_segments_<gen>    manifest being written, renamed on publish
//! _<n>.<ext>                one file per segment, extension set by the codec
//! write.lock                held by the single IndexWriter
//! ```

pub const MANIFEST_PREFIX: &str = "segments_";
pub const PENDING_MANIFEST_PREFIX: &str = "pending_segments_";
pub const WRITE_LOCK_NAME: &str = "write.lock";

pub fn manifest_file_name(generation: u64) -> String {
    format!("{}{}", MANIFEST_PREFIX, to_base36(generation))
}

pub fn pending_manifest_file_name(generation: u64) -> String {
    format!("{}{}", PENDING_MANIFEST_PREFIX, to_base36(generation))
}

/// Generation of a published manifest file name
pub fn parse_manifest_generation(name: &str) -> Option<u64> {
    let suffix = name.strip_prefix(MANIFEST_PREFIX)?;
    u64::from_str_radix(suffix, 36).ok()
}

/// Highest published manifest generation among `names`
pub fn latest_generation<'a>(names: impl IntoIterator<Item = &'a String>) -> Option<u64> {
    names.into_iter()
        .filter_map(|n| parse_manifest_generation(n))
        .max()
}

pub fn segment_name(counter: u64) -> String {
    format!("_{}", to_base36(counter))
}

/// Counter of a segment file name such as `_1z.stx`
pub fn parse_segment_counter(file_name: &str) -> Option<u64> {
    let stem = file_name.strip_prefix('_')?;
    let stem = stem.split('.').next()?;
    u64::from_str_radix(stem, 36).ok()
}

pub fn segment_file_name(segment: &str, extension: &str) -> String {
    format!("{}.{}", segment, extension)
}

pub fn is_index_file(name: &str) -> bool {
    name.starts_with(MANIFEST_PREFIX)
        || name.starts_with(PENDING_MANIFEST_PREFIX)
        || name.starts_with('_')
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
