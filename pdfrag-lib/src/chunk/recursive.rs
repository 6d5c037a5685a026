use std::collections::VecDeque;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::chunk::{generate_id, Chunk, ChunkMetadata, Chunker};
use crate::document::Document;
use crate::{Error, Result};

/// Paragraph, line, word, then character boundaries.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Parameters for [`RecursiveCharacterSplitter`]
///
/// All sizes are measured in characters, not bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitterConfig {
    /// Maximum characters per chunk
    pub chunk_size: usize,
    /// Maximum characters shared by consecutive chunks
    pub chunk_overlap: usize,
    /// Boundaries to try, coarsest first
    pub separators: Vec<String>,
    /// Trim surrounding whitespace from every chunk
    pub strip_whitespace: bool,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: DEFAULT_SEPARATORS.iter().map(|s| (*s).to_string()).collect(),
            strip_whitespace: false,
        }
    }
}

impl SplitterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidInput("chunk_size must be > 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidInput(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.separators.is_empty() {
            return Err(Error::InvalidInput("at least one separator is required".into()));
        }
        Ok(())
    }
}

/// Recursive character splitter - splits on the coarsest boundary that works
///
/// Text is cut at the first separator that occurs in it and the pieces are
/// packed greedily into chunks of at most `chunk_size` characters. A piece
/// that is too big on its own is split again with the next, finer separator.
/// When a chunk is emitted, its trailing pieces (up to `chunk_overlap`
/// characters) start the next chunk.
///
/// Separators stay attached to the piece they end, so every chunk is an
/// exact slice of the source text.
#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    config: SplitterConfig,
}

impl RecursiveCharacterSplitter {
    pub fn new(config: SplitterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split a bare string into chunk texts.
    #[must_use]
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.spans(text)
            .into_iter()
            .map(|span| text[span].to_string())
            .collect()
    }

    /// Byte ranges of every chunk, in source order.
    fn spans(&self, text: &str) -> Vec<Range<usize>> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut spans = Vec::new();
        if char_len(text) <= self.config.chunk_size {
            spans.push(0..text.len());
        } else {
            self.split_span(text, 0..text.len(), &self.config.separators, &mut spans);
        }

        if self.config.strip_whitespace {
            spans = spans
                .into_iter()
                .filter_map(|span| trim_span(text, span))
                .collect();
        }
        spans
    }

    fn split_span(
        &self,
        text: &str,
        span: Range<usize>,
        separators: &[String],
        out: &mut Vec<Range<usize>>,
    ) {
        let slice = &text[span.clone()];

        // first separator present in this span; "" always matches
        let (separator, finer) = match separators
            .iter()
            .position(|sep| sep.is_empty() || slice.contains(sep.as_str()))
        {
            Some(i) => (Some(separators[i].as_str()), &separators[i + 1..]),
            None => (None, &separators[..0]),
        };

        let mut pending = Vec::new();
        for piece in pieces(slice, span.start, separator) {
            let len = char_len(&text[piece.clone()]);
            if len <= self.config.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                self.merge(text, &pending, out);
                pending.clear();
            }

            if finer.is_empty() {
                tracing::warn!(
                    len,
                    chunk_size = self.config.chunk_size,
                    "no finer separator left, keeping oversized piece"
                );
                out.push(piece);
            } else {
                self.split_span(text, piece, finer, out);
            }
        }

        if !pending.is_empty() {
            self.merge(text, &pending, out);
        }
    }

    /// Pack contiguous pieces into chunks, carrying trailing pieces over as
    /// overlap.
    fn merge(&self, text: &str, pieces: &[Range<usize>], out: &mut Vec<Range<usize>>) {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut window: VecDeque<(Range<usize>, usize)> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(&text[piece.clone()]);

            if total + len > size && !window.is_empty() {
                out.push(window_span(&window));

                while total > overlap || (total + len > size && total > 0) {
                    let Some((_, dropped)) = window.pop_front() else {
                        break;
                    };
                    total -= dropped;
                }
            }

            window.push_back((piece.clone(), len));
            total += len;
        }

        if !window.is_empty() {
            out.push(window_span(&window));
        }
    }
}

impl Default for RecursiveCharacterSplitter {
    fn default() -> Self {
        Self {
            config: SplitterConfig::default(),
        }
    }
}

impl Chunker for RecursiveCharacterSplitter {
    fn name(&self) -> &str {
        "recursive"
    }

    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = document.content.as_str();
        let spans = self.spans(text);

        // set common chunking related metadata
        let mut metadata = ChunkMetadata::from_document(document);
        metadata.total_chunks = Some(spans.len());

        // spans start in increasing order, so char offsets can be counted forward
        let mut chunks = Vec::with_capacity(spans.len());
        let mut byte_pos = 0;
        let mut char_pos = 0;
        for (position, span) in spans.into_iter().enumerate() {
            char_pos += char_len(&text[byte_pos..span.start]);
            byte_pos = span.start;

            let content = &text[span];

            // clone metadata and add chunk specific info
            let mut m = metadata.clone();
            m.position = position;
            m.start_index = char_pos;

            chunks.push(Chunk {
                id: generate_id(&document.metadata, char_pos, content),
                content: content.to_string(),
                metadata: m,
            });
        }
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Cut `slice` (which starts at byte `offset` of the text) after every
/// occurrence of `separator`. No separator means one piece; the empty
/// separator means one piece per character.
fn pieces(slice: &str, offset: usize, separator: Option<&str>) -> Vec<Range<usize>> {
    match separator {
        None => vec![offset..offset + slice.len()],
        Some("") => slice
            .char_indices()
            .map(|(i, c)| offset + i..offset + i + c.len_utf8())
            .collect(),
        Some(sep) => {
            let mut start = offset;
            slice
                .split_inclusive(sep)
                .map(|piece| {
                    let range = start..start + piece.len();
                    start = range.end;
                    range
                })
                .collect()
        }
    }
}

fn window_span(window: &VecDeque<(Range<usize>, usize)>) -> Range<usize> {
    match (window.front(), window.back()) {
        (Some((first, _)), Some((last, _))) => first.start..last.end,
        _ => 0..0,
    }
}

fn trim_span(text: &str, span: Range<usize>) -> Option<Range<usize>> {
    let slice = &text[span.clone()];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lead = slice.len() - slice.trim_start().len();
    Some(span.start + lead..span.start + lead + trimmed.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Metadata;
    use serde_json::json;

    fn splitter(chunk_size: usize, chunk_overlap: usize, separators: &[&str]) -> RecursiveCharacterSplitter {
        RecursiveCharacterSplitter::new(SplitterConfig {
            chunk_size,
            chunk_overlap,
            separators: separators.iter().map(|s| (*s).to_string()).collect(),
            strip_whitespace: false,
        })
        .unwrap()
    }

    fn doc(content: &str) -> Document {
        let mut metadata = Metadata::new();
        metadata.insert("source".into(), json!("PDFs/BERT.pdf"));
        metadata.insert("page".into(), json!(4));
        Document::with_metadata(content, metadata)
    }

    /// Rebuild the document text from chunks using their start offsets.
    fn reassemble(chunks: &[Chunk]) -> String {
        let mut out = String::new();
        let mut covered = 0;
        for chunk in chunks {
            let start = chunk.metadata.start_index;
            assert!(start <= covered, "gap before chunk at {start}");
            let skip = covered - start;
            out.extend(chunk.content.chars().skip(skip));
            covered = covered.max(start + chunk.content.chars().count());
        }
        out
    }

    fn sample_text() -> String {
        let mut text = String::new();
        for p in 0..12 {
            for s in 0..6 {
                text.push_str(&format!(
                    "Paragraph {p} sentence {s} talks about scaled dot-product attention. "
                ));
            }
            text.push_str("\nA short trailing line.\n\n");
        }
        text
    }

    #[test]
    fn test_no_separator_scenario() {
        let s = splitter(1000, 200, &DEFAULT_SEPARATORS);
        let text = "x".repeat(2400);
        let chunks = s.chunk(&doc(&text));

        assert_eq!(chunks.len(), 3);
        let lens: Vec<usize> = chunks.iter().map(|c| c.content.len()).collect();
        assert_eq!(lens, vec![1000, 1000, 800]);
        let starts: Vec<usize> = chunks.iter().map(|c| c.metadata.start_index).collect();
        assert_eq!(starts, vec![0, 800, 1600]);
    }

    #[test]
    fn test_short_document_single_chunk() {
        let s = splitter(1000, 200, &DEFAULT_SEPARATORS);
        let text = "Attention is all you need.\n\nNo, really: it is.  ";
        let chunks = s.chunk(&doc(text));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, text);
        assert_eq!(chunks[0].metadata.start_index, 0);
        assert_eq!(chunks[0].metadata.total_chunks, Some(1));
    }

    #[test]
    fn test_empty_document() {
        let s = splitter(10, 2, &DEFAULT_SEPARATORS);
        assert!(s.chunk(&doc("")).is_empty());
    }

    #[test]
    fn test_word_overlap() {
        let s = splitter(15, 5, &[" "]);
        let chunks = s.split_text("Hello world this is a test message");

        assert_eq!(chunks, vec!["Hello world ", "this is a test ", "test message"]);
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let s = splitter(30, 0, &DEFAULT_SEPARATORS);
        let text = "First paragraph here.\n\nSecond paragraph here.\n\nThird.";
        let chunks = s.split_text(text);

        assert_eq!(
            chunks,
            vec!["First paragraph here.\n\n", "Second paragraph here.\n\nThird."]
        );
    }

    #[test]
    fn test_recurses_into_long_paragraph() {
        let s = splitter(20, 0, &DEFAULT_SEPARATORS);
        let text = "tiny\n\none two three four five six seven eight";
        let chunks = s.split_text(text);

        assert_eq!(chunks[0], "tiny\n\n");
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20, "{chunk:?} too long");
        }
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_oversized_unit_kept_whole() {
        let s = splitter(10, 2, &[" "]);
        let chunks = s.split_text("short supercalifragilisticexpialidocious end");

        assert!(chunks.contains(&"supercalifragilisticexpialidocious ".to_string()));
        assert_eq!(chunks.concat(), "short supercalifragilisticexpialidocious end");
    }

    #[test]
    fn test_separator_missing_keeps_span() {
        let s = splitter(5, 0, &["\n"]);
        let chunks = s.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcdefghij"]);
    }

    #[test]
    fn test_size_bound() {
        let s = splitter(120, 30, &DEFAULT_SEPARATORS);
        let chunks = s.chunk(&doc(&sample_text()));

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 120);
            assert!(!chunk.content.is_empty());
        }
    }

    #[test]
    fn test_overlap_bound() {
        let s = splitter(120, 30, &DEFAULT_SEPARATORS);
        let chunks = s.chunk(&doc(&sample_text()));

        for pair in chunks.windows(2) {
            let prev_end = pair[0].metadata.start_index + pair[0].content.chars().count();
            let overlap = prev_end.saturating_sub(pair[1].metadata.start_index);
            assert!(overlap <= 30, "overlap {overlap} exceeds budget");
            assert!(pair[1].metadata.start_index > pair[0].metadata.start_index);
        }
    }

    #[test]
    fn test_overlap_present_between_word_chunks() {
        let s = splitter(100, 20, &[" "]);
        let text = "word ".repeat(100);
        let chunks = s.chunk(&doc(&text));

        for pair in chunks.windows(2) {
            let prev_end = pair[0].metadata.start_index + pair[0].content.chars().count();
            assert_eq!(prev_end - pair[1].metadata.start_index, 20);
        }
    }

    #[test]
    fn test_lossless_coverage() {
        let text = sample_text();
        let s = splitter(120, 30, &DEFAULT_SEPARATORS);
        let chunks = s.chunk(&doc(&text));

        assert_eq!(reassemble(&chunks), text);
    }

    #[test]
    fn test_lossless_coverage_multibyte() {
        let text = "Größe der Aufmerksamkeit 🧠 ist wichtig. ".repeat(40);
        let s = splitter(64, 16, &DEFAULT_SEPARATORS);
        let chunks = s.chunk(&doc(&text));

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 64);
        }
        assert_eq!(reassemble(&chunks), text);
    }

    #[test]
    fn test_deterministic() {
        let s = splitter(120, 30, &DEFAULT_SEPARATORS);
        let d = doc(&sample_text());
        assert_eq!(s.chunk(&d), s.chunk(&d));
    }

    #[test]
    fn test_metadata_propagation() {
        let s = splitter(120, 30, &DEFAULT_SEPARATORS);
        let d = doc(&sample_text());
        let chunks = s.chunk(&d);
        let total = chunks.len();

        for (i, chunk) in chunks.iter().enumerate() {
            for (key, value) in &d.metadata {
                assert_eq!(chunk.metadata.get(key), Some(value));
            }
            assert_eq!(chunk.metadata.position, i);
            assert_eq!(chunk.metadata.total_chunks, Some(total));
        }
    }

    #[test]
    fn test_strip_whitespace() {
        let s = RecursiveCharacterSplitter::new(SplitterConfig {
            chunk_size: 12,
            chunk_overlap: 0,
            separators: vec!["\n\n".into(), " ".into(), "".into()],
            strip_whitespace: true,
        })
        .unwrap();
        let text = "alpha beta\n\n   \n\ngamma delta";
        let chunks = s.chunk(&doc(text));
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();

        assert_eq!(contents, vec!["alpha beta", "gamma delta"]);
        assert_eq!(chunks[1].metadata.start_index, text.find("gamma").unwrap());
    }

    #[test]
    fn test_unique_ids() {
        let s = splitter(15, 5, &[" "]);
        let chunks = s.chunk(&doc("Hello world this is a test message"));

        let mut ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), chunks.len());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let err = RecursiveCharacterSplitter::new(SplitterConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..SplitterConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
