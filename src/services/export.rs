use crate::core::config::RenderConfig;
use crate::core::io::Storage;
use crate::core::model::Carousel;
use crate::services::render::{render_slide_svg, RenderMode, SlideStatus};
use crate::utils::pdf::{PageImage, PdfDocument};
use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, ImageFormat, RgbaImage};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

pub const JSON_FILE: &str = "carousel.json";
pub const PDF_FILE: &str = "carousel.pdf";

pub fn slide_png_name(slide_number: u32) -> String {
    format!("slide-{}.png", slide_number)
}

fn output_path(output_folder: &str, file_name: &str) -> String {
    Path::new(output_folder)
        .join(file_name)
        .to_string_lossy()
        .into_owned()
}

#[derive(Serialize)]
struct ExportRef<'a> {
    #[serde(flatten)]
    carousel: &'a Carousel,
    #[serde(rename = "_images")]
    images: &'a BTreeMap<u32, String>,
}

#[derive(Deserialize)]
struct ExportOwned {
    #[serde(flatten)]
    carousel: Carousel,
    #[serde(rename = "_images", default)]
    images: BTreeMap<String, String>,
}

/// Pretty-printed carousel plus its generated images under `_images`.
pub fn export_json(carousel: &Carousel, images: &BTreeMap<u32, String>) -> Result<String> {
    serde_json::to_string_pretty(&ExportRef { carousel, images })
        .context("Failed to serialize carousel")
}

/// Reads a document produced by [`export_json`]; id and timestamp are kept.
pub fn import_json(content: &str) -> Result<(Carousel, BTreeMap<u32, String>)> {
    let doc: ExportOwned =
        serde_json::from_str(content).context("Failed to parse carousel document")?;
    doc.carousel.validate()?;
    let mut images = BTreeMap::new();
    for (key, data_uri) in doc.images {
        match key.parse::<u32>() {
            Ok(n) if doc.carousel.slide(n).is_some() => {
                images.insert(n, data_uri);
            }
            _ => warn!("Ignoring image entry '{}' with no matching slide", key),
        }
    }
    Ok((doc.carousel, images))
}

/// Turns slide SVG scenes into pixels at a fixed device pixel ratio.
pub struct Rasterizer {
    options: usvg::Options<'static>,
    pixel_ratio: f32,
}

impl Rasterizer {
    pub fn new(config: &RenderConfig) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if let Some(dir) = &config.fonts_dir {
            load_fonts_from_dir(&mut db, Path::new(dir));
        }
        info!("Rasterizer loaded {} font faces", db.len());
        Self {
            options: usvg::Options {
                fontdb: Arc::new(db),
                ..Default::default()
            },
            pixel_ratio: config.pixel_ratio.clamp(1.0, 4.0),
        }
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn rasterize(&self, svg: &str) -> Result<RgbaImage> {
        let tree = usvg::Tree::from_str(svg, &self.options).context("Failed to parse slide scene")?;
        let size = tree.size();
        let width = (size.width() * self.pixel_ratio).ceil() as u32;
        let height = (size.height() * self.pixel_ratio).ceil() as u32;
        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("Failed to allocate {}x{} pixmap", width, height))?;
        let transform = resvg::tiny_skia::Transform::from_scale(self.pixel_ratio, self.pixel_ratio);
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for pixel in pixmap.pixels() {
            let c = pixel.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(width, height, rgba).ok_or_else(|| anyhow!("Pixel buffer size mismatch"))
    }

    /// Read-only render of one slide; status affordances never reach the output.
    pub fn rasterize_slide(&self, carousel: &Carousel, slide_number: u32, image: Option<&str>) -> Result<RgbaImage> {
        let slide = carousel
            .slide(slide_number)
            .ok_or_else(|| anyhow!("Slide {} not found", slide_number))?;
        let svg = render_slide_svg(
            slide,
            carousel.language(),
            carousel.aspect_ratio(),
            SlideStatus {
                image,
                ..Default::default()
            },
            RenderMode::Export,
        );
        self.rasterize(&svg)
            .with_context(|| format!("Failed to rasterize slide {}", slide_number))
    }
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        warn!("Fonts directory {} is not readable", dir.display());
        return;
    };
    for entry in rd.flatten() {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        if matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc") {
            if let Err(e) = db.load_font_file(&path) {
                warn!("Skipping font {}: {}", path.display(), e);
            }
        }
    }
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(buf)
}

fn to_page_image(image: RgbaImage) -> PageImage {
    let rgb = DynamicImage::ImageRgba8(image).to_rgb8();
    PageImage {
        width: rgb.width(),
        height: rgb.height(),
        rgb: rgb.into_raw(),
    }
}

/// Builds the whole document in memory. A slide that fails to rasterize
/// becomes a blank page.
pub fn build_pdf(
    rasterizer: &Rasterizer,
    carousel: &Carousel,
    images: Option<&BTreeMap<u32, String>>,
) -> Result<Vec<u8>> {
    let (w, h) = carousel.aspect_ratio().dimensions();
    let mut doc = PdfDocument::new();

    let pb = ProgressBar::new(carousel.slides.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages")?
            .progress_chars("#>-"),
    );

    for slide in &carousel.slides {
        let image = images
            .and_then(|m| m.get(&slide.slide_number))
            .map(String::as_str);
        let page = match rasterizer.rasterize_slide(carousel, slide.slide_number, image) {
            Ok(raster) => Some(to_page_image(raster)),
            Err(e) => {
                error!("Leaving page {} blank: {:#}", slide.slide_number, e);
                None
            }
        };
        doc.add_page(w as f32, h as f32, page)?;
        pb.inc(1);
    }
    let bytes = doc.finish()?;
    pb.finish_with_message("PDF ready");
    Ok(bytes)
}

pub async fn write_json(
    storage: &dyn Storage,
    output_folder: &str,
    carousel: &Carousel,
    images: &BTreeMap<u32, String>,
) -> Result<String> {
    let path = output_path(output_folder, JSON_FILE);
    let content = export_json(carousel, images)?;
    storage.write(&path, content.as_bytes()).await?;
    info!("Exported {}", path);
    Ok(path)
}

pub async fn read_json(storage: &dyn Storage, path: &str) -> Result<(Carousel, BTreeMap<u32, String>)> {
    let bytes = storage.read(path).await?;
    let content = String::from_utf8(bytes).context("Carousel document is not UTF-8")?;
    import_json(&content)
}

pub async fn write_slide_png(
    storage: &dyn Storage,
    output_folder: &str,
    rasterizer: &Rasterizer,
    carousel: &Carousel,
    slide_number: u32,
    image: Option<&str>,
) -> Result<String> {
    let raster = rasterizer.rasterize_slide(carousel, slide_number, image)?;
    let png = encode_png(&raster)?;
    let path = output_path(output_folder, &slide_png_name(slide_number));
    storage.write(&path, &png).await?;
    info!("Exported {}", path);
    Ok(path)
}

/// Nothing is written unless the whole document was assembled.
pub async fn write_pdf(
    storage: &dyn Storage,
    output_folder: &str,
    rasterizer: &Rasterizer,
    carousel: &Carousel,
    images: Option<&BTreeMap<u32, String>>,
) -> Result<String> {
    let bytes = build_pdf(rasterizer, carousel, images).context("PDF export failed")?;
    let path = output_path(output_folder, PDF_FILE);
    storage.write(&path, &bytes).await?;
    info!("Exported {} ({} pages)", path, carousel.slides.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::sample_carousel;
    use crate::core::io::NativeStorage;
    use tempfile::tempdir;

    fn rasterizer() -> Rasterizer {
        Rasterizer::new(&RenderConfig {
            pixel_ratio: 1.0,
            fonts_dir: None,
        })
    }

    #[test]
    fn test_json_document_shape() -> Result<()> {
        let carousel = sample_carousel("c1", 2);
        let mut images = BTreeMap::new();
        images.insert(2, "data:image/png;base64,AAAA".to_string());
        let json = export_json(&carousel, &images)?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        assert_eq!(value["id"], "c1");
        assert_eq!(value["createdAt"], 1_700_000_000_000i64);
        assert_eq!(value["_images"]["2"], "data:image/png;base64,AAAA");
        assert!(json.contains("\n  "));

        let (back, back_images) = import_json(&json)?;
        assert_eq!(back, carousel);
        assert_eq!(back_images, images);
        Ok(())
    }

    #[test]
    fn test_import_rejects_bad_numbering() -> Result<()> {
        let mut carousel = sample_carousel("c1", 2);
        carousel.slides[1].slide_number = 5;
        let json = export_json(&carousel, &BTreeMap::new())?;
        assert!(import_json(&json).is_err());
        assert!(import_json("{\"id\": 3}").is_err());
        Ok(())
    }

    #[test]
    fn test_import_without_images() -> Result<()> {
        let carousel = sample_carousel("c1", 1);
        let json = serde_json::to_string(&carousel)?;
        let (_, images) = import_json(&json)?;
        assert!(images.is_empty());
        Ok(())
    }

    #[test]
    fn test_rasterize_slide_size() -> Result<()> {
        let carousel = sample_carousel("c1", 1);
        let raster = rasterizer().rasterize_slide(&carousel, 1, None)?;
        assert_eq!(raster.dimensions(), (340, 425));
        // Opaque placeholder background.
        assert_eq!(raster.get_pixel(0, 0).0[3], 255);

        let scaled = Rasterizer::new(&RenderConfig { pixel_ratio: 2.0, fonts_dir: None });
        assert_eq!(scaled.rasterize_slide(&carousel, 1, None)?.dimensions(), (680, 850));
        assert!(rasterizer().rasterize_slide(&carousel, 4, None).is_err());
        Ok(())
    }

    #[test]
    fn test_png_signature() -> Result<()> {
        let png = encode_png(&RgbaImage::new(2, 2))?;
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_write_exports() -> Result<()> {
        let dir = tempdir()?;
        let out = dir.path().to_string_lossy().into_owned();
        let storage = NativeStorage::new();
        let carousel = sample_carousel("c1", 2);

        let json_path = write_json(&storage, &out, &carousel, &BTreeMap::new()).await?;
        assert!(json_path.ends_with("carousel.json"));
        let (loaded, _) = read_json(&storage, &json_path).await?;
        assert_eq!(loaded.id, "c1");

        let png_path = write_slide_png(&storage, &out, &rasterizer(), &carousel, 2, None).await?;
        assert!(png_path.ends_with("slide-2.png"));
        assert!(storage.exists(&png_path).await?);

        let pdf_path = write_pdf(&storage, &out, &rasterizer(), &carousel, None).await?;
        let bytes = storage.read(&pdf_path).await?;
        assert!(bytes.starts_with(b"%PDF-1.4"));
        let text = String::from_utf8_lossy(&bytes);
        assert_eq!(text.matches("/Type /Page ").count(), 2);
        assert!(text.contains("/MediaBox [0 0 340 425]"));
        Ok(())
    }
}
