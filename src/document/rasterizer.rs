use image::{ImageFormat, RgbaImage};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PAGE_PREFIX: &str = "page_";
const PAGE_EXTENSION: &str = "png";

#[derive(Error, Debug)]
pub enum RasterizeError {
    #[error("Failed to load PDFium library: {0}")]
    Library(String),
    #[error("Failed to open {path}: {message}")]
    Open { path: PathBuf, message: String },
    #[error("Failed to render page {page}: {message}")]
    Render { page: usize, message: String },
    #[error("Failed to encode page {page}: {message}")]
    Encode { page: usize, message: String },
}

/// Renders every page of a PDF into `out_dir` as one image per page and
/// returns the page count.
pub trait PageRasterizer {
    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<usize, RasterizeError>;
}

/// File name for the image of the zero-based page `index`.
pub fn page_image_name(index: usize) -> String {
    format!("{}{:03}.{}", PAGE_PREFIX, index, PAGE_EXTENSION)
}

/// Recovers the page number embedded by [`page_image_name`].
pub fn page_number_from_path(path: &Path) -> Option<usize> {
    path.file_stem()?
        .to_str()?
        .strip_prefix(PAGE_PREFIX)?
        .parse()
        .ok()
}

pub struct PdfiumRasterizer {
    target_width: i32,
}

impl PdfiumRasterizer {
    pub fn new(target_width: i32) -> Self {
        Self { target_width }
    }

    // Local copies first, then the system library path.
    fn bind() -> Result<Pdfium, RasterizeError> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| RasterizeError::Library(format!("{:?}", e)))?;
        Ok(Pdfium::new(bindings))
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<usize, RasterizeError> {
        let pdfium = Self::bind()?;
        let document = pdfium
            .load_pdf_from_file(pdf, None)
            .map_err(|e| RasterizeError::Open {
                path: pdf.to_path_buf(),
                message: format!("{:?}", e),
            })?;

        let render_config = PdfRenderConfig::new().set_target_width(self.target_width);

        let pages = document.pages();
        let mut count = 0;
        for (index, page) in pages.iter().enumerate() {
            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| RasterizeError::Render {
                    page: index,
                    message: format!("{:?}", e),
                })?;

            let image = RgbaImage::from_raw(
                bitmap.width() as u32,
                bitmap.height() as u32,
                bitmap.as_rgba_bytes(),
            )
            .ok_or_else(|| RasterizeError::Encode {
                page: index,
                message: "bitmap size does not match its dimensions".to_string(),
            })?;

            let target = out_dir.join(page_image_name(index));
            image
                .save_with_format(&target, ImageFormat::Png)
                .map_err(|e| RasterizeError::Encode {
                    page: index,
                    message: e.to_string(),
                })?;

            log::debug!("rendered page {} to {}", index, target.display());
            count += 1;
        }

        Ok(count)
    }
}
