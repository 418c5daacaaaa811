use std::path::Path;
use tesseract::Tesseract;
use thiserror::Error;

use crate::document::page::{BoundingBox, Page, Word};

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR engine error: {0}")]
    Engine(String),
}

/// Word-level text recognition over a single image file.
pub trait OcrEngine {
    fn recognize_words(&mut self, image: &Path) -> Result<Vec<Word>, OcrError>;
}

/// Tesseract-backed engine. The native handle is kept between pages and
/// rebuilt lazily after a failure consumed it.
pub struct TesseractEngine {
    datapath: Option<String>,
    language: String,
    handle: Option<Tesseract>,
}

impl TesseractEngine {
    pub fn new(datapath: Option<String>, language: String) -> Self {
        Self {
            datapath,
            language,
            handle: None,
        }
    }

    fn take_handle(&mut self) -> Result<Tesseract, OcrError> {
        match self.handle.take() {
            Some(handle) => Ok(handle),
            None => Tesseract::new(self.datapath.as_deref(), Some(&self.language))
                .map_err(|e| OcrError::Engine(format!("failed to initialise tesseract: {}", e))),
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize_words(&mut self, image: &Path) -> Result<Vec<Word>, OcrError> {
        let image = image
            .to_str()
            .ok_or_else(|| OcrError::Engine(format!("non UTF-8 image path: {}", image.display())))?;

        let mut handle = self
            .take_handle()?
            .set_image(image)
            .map_err(|e| OcrError::Engine(e.to_string()))?
            .recognize()
            .map_err(|e| OcrError::Engine(e.to_string()))?;

        let tsv = handle
            .get_tsv_text(0)
            .map_err(|e| OcrError::Engine(e.to_string()))?;

        self.handle = Some(handle);
        Ok(parse_tsv_words(&tsv))
    }
}

const WORD_LEVEL: &str = "5";

/// Parses Tesseract TSV output, keeping only non-empty word rows.
///
/// Columns: level, page, block, paragraph, line, word, left, top, width,
/// height, conf, text.
pub fn parse_tsv_words(tsv: &str) -> Vec<Word> {
    tsv.lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.splitn(12, '\t').collect();
            if cols.len() < 12 || cols[0] != WORD_LEVEL {
                return None;
            }
            let text = cols[11].trim();
            if text.is_empty() {
                return None;
            }
            let bbox = BoundingBox {
                left: cols[6].parse().ok()?,
                top: cols[7].parse().ok()?,
                width: cols[8].parse().ok()?,
                height: cols[9].parse().ok()?,
            };
            let confidence: f32 = cols[10].parse().ok()?;
            Some(Word {
                text: text.to_string(),
                bbox,
                confidence: confidence.max(0.0),
            })
        })
        .collect()
}

/// Runs OCR on one image and appends the resulting page. Engine failures are
/// recorded on the page instead of being returned.
pub fn extract_words_to_pages(
    engine: &mut dyn OcrEngine,
    image: &Path,
    pages: &mut Vec<Page>,
    index: usize,
) {
    match engine.recognize_words(image) {
        Ok(words) => {
            log::debug!(
                "page {}: recognised {} words from {}",
                index,
                words.len(),
                image.display()
            );
            pages.push(Page::new(index, words));
        }
        Err(e) => {
            log::warn!("page {}: OCR failed for {}: {}", index, image.display(), e);
            pages.push(Page::failed(index));
        }
    }
}
