use ab_glyph::{FontVec, PxScale};
use image::{ImageFormat, Rgb};
use imageproc::drawing::{draw_text_mut, text_size};
use std::io::Cursor;

/// Text drawn onto the base certificate image.
#[derive(Debug, Clone)]
pub struct CertificateOverlay {
    pub programme: String,
    pub level: String,
    pub certificate_id: String,
}

/// Renders the textual overlay onto a base image and encodes the result.
/// Pure CPU work, so the seam is synchronous.
pub trait Renderer: Send + Sync {
    fn render(&self, base_image: &[u8], overlay: &CertificateOverlay)
        -> Result<Vec<u8>, RenderError>;
}

/// Layout constants carried over from the certificate template: 80px margin,
/// programme name bottom-left, level mid-left, id tag bottom-right.
const MARGIN: i32 = 80;
const FONT_SIZE: f32 = 64.0;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Programme name and id tag share the bottom margin line.
fn bottom_baseline(height: i32) -> i32 {
    height - MARGIN
}

/// Achievement level sits one and a half margins below the vertical midpoint.
fn level_baseline(height: i32) -> i32 {
    height / 2 + MARGIN * 3 / 2
}

/// Draws certificate text with the programme's Montserrat fonts and encodes
/// the result as JPEG.
#[derive(Debug)]
pub struct CertificateRenderer {
    regular: FontVec,
    semibold: FontVec,
}

impl CertificateRenderer {
    /// Load both TTFs up front so a missing font fails at startup, not in
    /// the middle of a batch.
    pub fn from_font_paths(regular_path: &str, semibold_path: &str) -> Result<Self, RenderError> {
        Ok(Self {
            regular: load_font(regular_path)?,
            semibold: load_font(semibold_path)?,
        })
    }
}

fn load_font(path: &str) -> Result<FontVec, RenderError> {
    let bytes = std::fs::read(path).map_err(|e| RenderError::Font {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    FontVec::try_from_vec(bytes).map_err(|e| RenderError::Font {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// `#<certificate id>` tag stamped in the lower-right corner.
pub fn certificate_tag(certificate_id: &str) -> String {
    format!("#{certificate_id}")
}

impl Renderer for CertificateRenderer {
    fn render(
        &self,
        base_image: &[u8],
        overlay: &CertificateOverlay,
    ) -> Result<Vec<u8>, RenderError> {
        let mut canvas = image::load_from_memory(base_image)?.to_rgb8();
        let (width, height) = canvas.dimensions();
        let (width, height) = (width as i32, height as i32);
        let scale = PxScale::from(FONT_SIZE);

        let programme = overlay.programme.to_uppercase();
        draw_text_mut(
            &mut canvas,
            TEXT_COLOR,
            MARGIN,
            bottom_baseline(height),
            scale,
            &self.semibold,
            &programme,
        );

        let level = overlay.level.to_uppercase();
        draw_text_mut(
            &mut canvas,
            TEXT_COLOR,
            MARGIN,
            level_baseline(height),
            scale,
            &self.regular,
            &level,
        );

        let tag = certificate_tag(&overlay.certificate_id);
        let (tag_width, _) = text_size(scale, &self.semibold, &tag);
        draw_text_mut(
            &mut canvas,
            TEXT_COLOR,
            width - tag_width as i32 - MARGIN,
            bottom_baseline(height),
            scale,
            &self.semibold,
            &tag,
        );

        let mut out = Cursor::new(Vec::new());
        canvas.write_to(&mut out, ImageFormat::Jpeg)?;
        Ok(out.into_inner())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to load font {path}: {message}")]
    Font { path: String, message: String },

    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),
}
