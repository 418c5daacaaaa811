use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel region the OCR engine associates with a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub bbox: BoundingBox,
    /// Engine confidence, 0 to 100.
    pub confidence: f32,
}

/// One OCR'd unit of input: a single image or one rendered PDF page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    index: usize,
    words: Vec<Word>,
    failed: bool,
}

impl Page {
    pub fn new(index: usize, words: Vec<Word>) -> Self {
        Self {
            index,
            words,
            failed: false,
        }
    }

    /// Placeholder for a page the OCR engine could not read.
    pub fn failed(index: usize) -> Self {
        Self {
            index,
            words: Vec::new(),
            failed: true,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Words with surrounding newlines stripped, joined by single spaces.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.trim_matches('\n'))
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Arithmetic mean of word confidences, `None` for an empty page.
    pub fn mean_confidence(&self) -> Option<f32> {
        if self.words.is_empty() {
            return None;
        }
        let total: f32 = self.words.iter().map(|w| w.confidence).sum();
        Some(total / self.words.len() as f32)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed {
            return write!(f, "Page {}: <ocr failed>", self.index);
        }
        match self.mean_confidence() {
            Some(conf) => write!(f, "Page {} ({:.1}%): {}", self.index, conf, self.text()),
            None => write!(f, "Page {}: <empty>", self.index),
        }
    }
}

#[cfg(test)]
pub(crate) fn word(text: &str, confidence: f32) -> Word {
    Word {
        text: text.to_string(),
        bbox: BoundingBox {
            left: 0,
            top: 0,
            width: 10,
            height: 10,
        },
        confidence,
    }
}
