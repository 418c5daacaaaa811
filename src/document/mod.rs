pub mod ocr;
pub mod page;
pub mod processor;
pub mod rasterizer;

pub use ocr::{OcrEngine, OcrError, TesseractEngine};
pub use page::{BoundingBox, Page, Word};
pub use processor::{InputFormat, ProcessError, ProcessedResume, ResumeProcessor};
pub use rasterizer::{PageRasterizer, PdfiumRasterizer, RasterizeError};
