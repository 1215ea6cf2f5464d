//! Sliding-window chunking.
//!
//! Content up to `SINGLE_CHUNK_MAX` characters is stored as one chunk.
//! Longer content slides a `TARGET_SIZE`-character window with
//! `OVERLAP`-character back-step, preferring to cut on a paragraph,
//! line, sentence, or word boundary found in the tail of the window
//! before falling back to a hard cut.

pub const SINGLE_CHUNK_MAX: usize = 8000;
pub const TARGET_SIZE: usize = 4000;
pub const OVERLAP: usize = 200;
/// How far back from the window end we'll search for a separator.
const BACK_SHIFT_WINDOW: usize = 800;

/// Split `content` into chunks. Returns `vec![content]` unchanged when
/// it already fits in one chunk.
pub fn chunk_content(content: &str) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    let len = chars.len();

    if len <= SINGLE_CHUNK_MAX {
        return vec![content.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        let mut end = (start + TARGET_SIZE).min(len);

        if end < len {
            let region_start = (start + TARGET_SIZE).saturating_sub(BACK_SHIFT_WINDOW).max(start);
            if let Some(cut) = find_separator_cut(&chars, region_start, end) {
                end = cut;
            }
        }

        chunks.push(chars[start..end].iter().collect());

        let next_start = end.saturating_sub(OVERLAP);
        if next_start + OVERLAP >= len || next_start <= start {
            break;
        }
        start = next_start;
    }

    chunks
}

/// Search `[region_start, region_end]` of `chars` for the last
/// occurrence of a preferred separator, returning the index immediately
/// after it. Preference order: `"\n\n"`, `"\n"`, `". "`, `" "`.
fn find_separator_cut(chars: &[char], region_start: usize, region_end: usize) -> Option<usize> {
    let region: String = chars[region_start..region_end].iter().collect();

    let candidates: [&str; 4] = ["\n\n", "\n", ". ", " "];
    for sep in candidates {
        if let Some(byte_pos) = region.rfind(sep) {
            let char_pos = region[..byte_pos].chars().count();
            let sep_len = sep.chars().count();
            return Some(region_start + char_pos + sep_len);
        }
    }
    None
}
