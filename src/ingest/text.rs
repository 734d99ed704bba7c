/// How far back from a window end to look for a sentence or line boundary.
pub const BOUNDARY_LOOKBACK: usize = 100;

fn is_boundary(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\n')
}

/// Split text into overlapping windows of at most `size` characters.
///
/// Text that already fits is returned whole. Otherwise each window is cut
/// just after the last `.`, `!`, `?` or newline found within the final
/// [`BOUNDARY_LOOKBACK`] characters of the window, and the next window starts
/// `overlap` characters before that cut. Pieces are trimmed and empty pieces
/// dropped. The start position strictly increases, so the loop terminates
/// even for degenerate `overlap >= size` arguments.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= size {
        return vec![text.to_string()];
    }

    let size = size.max(1);
    let stride = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let mut end = (start + size).min(chars.len());

        if end < chars.len() {
            let floor = end.saturating_sub(BOUNDARY_LOOKBACK).max(start);
            if let Some(i) = (floor..end).rev().find(|&i| is_boundary(chars[i])) {
                end = i + 1;
            }
        }

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }

        if end >= chars.len() {
            break;
        }

        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { start + stride };
    }

    chunks
}
