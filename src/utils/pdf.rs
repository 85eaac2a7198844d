use anyhow::{Context, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

/// Raw 8-bit RGB pixels for a page image.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

#[derive(Debug, Clone)]
struct Page {
    width_pt: f32,
    height_pt: f32,
    image: Option<PageImage>,
}

/// In-memory multi-page document; nothing touches disk until the caller
/// writes the bytes returned by [`PdfDocument::finish`].
#[derive(Debug, Clone, Default)]
pub struct PdfDocument {
    pages: Vec<Page>,
}

impl PdfDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Adds a page; `image` is stretched over the whole page, `None` leaves it blank.
    pub fn add_page(&mut self, width_pt: f32, height_pt: f32, image: Option<PageImage>) -> Result<()> {
        if let Some(img) = &image {
            let expected = img.width as usize * img.height as usize * 3;
            if img.rgb.len() != expected {
                anyhow::bail!(
                    "page image is {} bytes, expected {} for {}x{}",
                    img.rgb.len(),
                    expected,
                    img.width,
                    img.height
                );
            }
        }
        self.pages.push(Page {
            width_pt,
            height_pt,
            image,
        });
        Ok(())
    }

    pub fn finish(&self) -> Result<Vec<u8>> {
        let mut out: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        // 1: catalog, 2: page tree, then three objects per page.
        let page_ids: Vec<usize> = (0..self.pages.len()).map(|i| 3 + i * 3).collect();

        offsets.push(out.len());
        write!(out, "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n")?;

        offsets.push(out.len());
        let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
        write!(
            out,
            "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
            kids.join(" "),
            self.pages.len()
        )?;

        for (page, &page_id) in self.pages.iter().zip(&page_ids) {
            let content_id = page_id + 1;
            let image_id = page_id + 2;

            offsets.push(out.len());
            let resources = if page.image.is_some() {
                format!("<< /XObject << /Im0 {} 0 R >> >>", image_id)
            } else {
                "<< >>".to_string()
            };
            write!(
                out,
                "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources {} /Contents {} 0 R >>\nendobj\n",
                page_id,
                fmt_num(page.width_pt),
                fmt_num(page.height_pt),
                resources,
                content_id
            )?;

            let content = if page.image.is_some() {
                format!(
                    "q {} 0 0 {} 0 0 cm /Im0 Do Q",
                    fmt_num(page.width_pt),
                    fmt_num(page.height_pt)
                )
            } else {
                String::new()
            };
            offsets.push(out.len());
            write!(out, "{} 0 obj\n<< /Length {} >>\nstream\n", content_id, content.len())?;
            out.extend_from_slice(content.as_bytes());
            write!(out, "\nendstream\nendobj\n")?;

            // Blank pages keep their image slot as a null object.
            offsets.push(out.len());
            match &page.image {
                Some(img) => {
                    let data = deflate(&img.rgb)?;
                    write!(
                        out,
                        "{} 0 obj\n<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode /Length {} >>\nstream\n",
                        image_id,
                        img.width,
                        img.height,
                        data.len()
                    )?;
                    out.extend_from_slice(&data);
                    write!(out, "\nendstream\nendobj\n")?;
                }
                None => {
                    write!(out, "{} 0 obj\nnull\nendobj\n", image_id)?;
                }
            }
        }

        let xref_offset = out.len();
        write!(out, "xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1)?;
        for offset in &offsets {
            write!(out, "{:010} 00000 n \n", offset)?;
        }
        write!(
            out,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            offsets.len() + 1,
            xref_offset
        )?;
        Ok(out)
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).context("Failed to compress page image")?;
    encoder.finish().context("Failed to compress page image")
}

fn fmt_num(v: f32) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}
