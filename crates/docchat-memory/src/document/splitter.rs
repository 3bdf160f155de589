use super::types::{Chunk, Document};

/// Preferred break points, strongest first.
const SEPARATORS: [&[char]; 3] = [&['\n', '\n'], &['\n'], &[' ']];

#[derive(Debug, Clone)]
pub struct SplitterConfig {
    /// Window size in characters.
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Shorten windows to end on a paragraph, line, or word boundary.
    pub boundary_aware: bool,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
            boundary_aware: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitterConfig,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(SplitterConfig::default())
    }
}

impl TextSplitter {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    #[must_use]
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        let chars: Vec<char> = document.content.chars().collect();
        split_windows(&chars, &self.config)
            .into_iter()
            .enumerate()
            .map(|(i, (start, end))| Chunk {
                content: chars[start..end].iter().collect(),
                metadata: document.metadata.clone(),
                chunk_index: i,
                char_offset: start,
            })
            .collect()
    }
}

/// Half-open `(start, end)` char ranges. Window ends strictly increase, and
/// each window starts at most `chunk_overlap` chars before its predecessor ends.
fn split_windows(chars: &[char], config: &SplitterConfig) -> Vec<(usize, usize)> {
    let len = chars.len();
    let size = config.chunk_size.max(1);
    let overlap = config.chunk_overlap.min(size - 1);

    let mut windows = Vec::new();
    let mut start = 0;
    let mut prev_end = 0;

    while start < len {
        let mut end = (start + size).min(len);
        if end < len && config.boundary_aware {
            let floor = (start + (end - start) / 2).max(prev_end);
            if let Some(at) = find_break(chars, start, floor, end) {
                end = at;
            }
        }
        windows.push((start, end));
        if end == len {
            break;
        }

        prev_end = end;
        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { end };
    }

    windows
}

/// Latest position in `(floor, end]` that sits right after a separator
/// lying entirely inside the window.
fn find_break(chars: &[char], start: usize, floor: usize, end: usize) -> Option<usize> {
    SEPARATORS.iter().find_map(|sep| {
        (floor + 1..=end)
            .rev()
            .find(|&at| at >= start + sep.len() && chars[at - sep.len()..at] == **sep)
    })
}
