//! Recursive character text splitter.
//!
//! Splits text on the coarsest separator that occurs in it (`"\n\n"`,
//! `"\n"`, `" "`, then individual characters), merges the pieces back into
//! chunks of at most `chunk_size` characters, and carries up to
//! `chunk_overlap` characters of trailing pieces into the next chunk.
//! Lengths are measured in `char`s, not bytes.

use std::collections::VecDeque;

use crate::error::{AppError, AppResult};

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(AppError::Configuration(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|piece| !piece.is_empty())
                .map(String::from)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<String> = Vec::new();

        for piece in pieces {
            if char_len(&piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting, separator));
                fitting.clear();
            }
            if finer.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, finer));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting, separator));
        }

        chunks
    }

    /// Joins small pieces into chunks, keeping an overlapping tail
    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(piece);
            let joiner = if current.is_empty() { 0 } else { separator_len };

            if total + len + joiner > self.chunk_size && !current.is_empty() {
                push_joined(&mut chunks, &current, separator);

                while total > self.chunk_overlap
                    || (total + len + if current.is_empty() { 0 } else { separator_len }
                        > self.chunk_size
                        && total > 0)
                {
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    total -= char_len(first) + if current.is_empty() { 0 } else { separator_len };
                }
            }

            total += len + if current.is_empty() { 0 } else { separator_len };
            current.push_back(piece);
        }

        push_joined(&mut chunks, &current, separator);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, current: &VecDeque<&str>, separator: &str) {
    let joined = current.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
