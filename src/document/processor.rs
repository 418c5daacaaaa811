use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

use crate::document::ocr::{extract_words_to_pages, OcrEngine};
use crate::document::page::Page;
use crate::document::rasterizer::{page_number_from_path, PageRasterizer, RasterizeError};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("format {0} not supported yet")]
    UnsupportedFormat(String),
    #[error("format JPEG is disabled in configuration")]
    JpegDisabled,
    #[error("error creating temp folder: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("error converting file: {0}")]
    Rasterize(#[from] RasterizeError),
    #[error("error reading rendered pages in {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Png,
    Jpeg,
    Pdf,
}

impl InputFormat {
    pub fn detect(path: &Path) -> Result<Self, ProcessError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "pdf" => Ok(Self::Pdf),
            "" => Err(ProcessError::UnsupportedFormat("(none)".to_string())),
            other => Err(ProcessError::UnsupportedFormat(format!(".{}", other))),
        }
    }
}

/// Pages extracted from one résumé. The rendered-page directory, if any, is
/// removed when this value is dropped.
#[derive(Debug)]
pub struct ProcessedResume {
    pub pages: Vec<Page>,
    pub workdir: Option<TempDir>,
}

impl ProcessedResume {
    pub fn workdir_path(&self) -> Option<&Path> {
        self.workdir.as_ref().map(|dir| dir.path())
    }
}

pub struct ResumeProcessor<E, R> {
    engine: E,
    rasterizer: R,
    jpeg_enabled: bool,
}

impl<E: OcrEngine, R: PageRasterizer> ResumeProcessor<E, R> {
    pub fn new(engine: E, rasterizer: R, jpeg_enabled: bool) -> Self {
        Self {
            engine,
            rasterizer,
            jpeg_enabled,
        }
    }

    pub fn process(&mut self, path: &Path) -> Result<ProcessedResume, ProcessError> {
        match InputFormat::detect(path)? {
            InputFormat::Jpeg if !self.jpeg_enabled => Err(ProcessError::JpegDisabled),
            InputFormat::Png | InputFormat::Jpeg => {
                let mut pages = Vec::with_capacity(1);
                extract_words_to_pages(&mut self.engine, path, &mut pages, 0);
                Ok(ProcessedResume {
                    pages,
                    workdir: None,
                })
            }
            InputFormat::Pdf => self.process_pdf(path),
        }
    }

    fn process_pdf(&mut self, path: &Path) -> Result<ProcessedResume, ProcessError> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "resume".to_string());

        let workdir = tempfile::Builder::new()
            .prefix(&stem)
            .tempdir()
            .map_err(ProcessError::TempDir)?;

        println!("[+] Processing PDF @ {} [+]", workdir.path().display());

        let rendered = self.rasterizer.rasterize(path, workdir.path())?;
        let images = rendered_pages(workdir.path())?;
        if images.len() != rendered {
            log::warn!(
                "rasterizer reported {} pages but {} images were found",
                rendered,
                images.len()
            );
        }

        let mut pages = Vec::with_capacity(images.len());
        for (index, image) in images.iter().enumerate() {
            extract_words_to_pages(&mut self.engine, image, &mut pages, index);
        }

        Ok(ProcessedResume {
            pages,
            workdir: Some(workdir),
        })
    }
}

/// Regular, non-empty files in `dir`, ordered by embedded page number.
/// Files without a page number sort last, by name.
fn rendered_pages(dir: &Path) -> Result<Vec<PathBuf>, ProcessError> {
    let read_err = |source| ProcessError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut images = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let metadata = entry.metadata().map_err(read_err)?;
        if metadata.is_file() && metadata.len() > 0 {
            images.push(entry.path());
        }
    }

    images.sort_by_key(|path| {
        let number = page_number_from_path(path);
        (number.is_none(), number, path.file_name().map(|n| n.to_os_string()))
    });
    Ok(images)
}
