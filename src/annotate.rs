//! Drawing tally annotations onto frames.

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::RgbImage;
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::rect::Rect as PixelRect;

use crate::error::{Error, Result};
use crate::tally::{Annotation, TrackHistory};

/// Label baseline offset above the box, in pixels.
const LABEL_GAP: i32 = 10;

/// DejaVu Sans Mono (Bitstream Vera license, see `assets/font/`).
static BUNDLED_FONT: &[u8] = include_bytes!("../assets/font/DejaVuSansMono.ttf");

pub struct Annotator {
    font: Option<FontArc>,
    scale: PxScale,
    thickness: u32,
    draw_trails: bool,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator {
    /// 2 px boxes labelled with the bundled font.
    pub fn new() -> Self {
        Self {
            font: FontArc::try_from_slice(BUNDLED_FONT).ok(),
            scale: PxScale::from(16.0),
            thickness: 2,
            draw_trails: false,
        }
    }

    pub fn load_font(path: &Path) -> Result<FontArc> {
        let bytes = std::fs::read(path)?;
        FontArc::try_from_vec(bytes).map_err(|e| Error::Font {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    /// Draw boxes without labels.
    pub fn without_labels(mut self) -> Self {
        self.font = None;
        self
    }

    pub fn has_labels(&self) -> bool {
        self.font.is_some()
    }

    pub fn with_trails(mut self, draw_trails: bool) -> Self {
        self.draw_trails = draw_trails;
        self
    }

    pub fn with_scale(mut self, px: f32) -> Self {
        self.scale = PxScale::from(px);
        self
    }

    pub fn draw(&self, image: &mut RgbImage, annotations: &[Annotation], history: &TrackHistory) {
        for annotation in annotations {
            self.draw_box(image, annotation);
            if let Some(font) = &self.font {
                let (x, y) = annotation.bbox.top_left();
                let text_top = (y as i32 - LABEL_GAP - self.scale.y as i32).max(0);
                draw_text_mut(
                    image,
                    annotation.color,
                    x as i32,
                    text_top,
                    self.scale,
                    font,
                    &annotation.label,
                );
            }
            if self.draw_trails {
                if let Some(points) = history.get(annotation.track_id) {
                    let points: Vec<_> = points.iter().copied().collect();
                    for pair in points.windows(2) {
                        draw_line_segment_mut(image, pair[0], pair[1], annotation.color);
                    }
                }
            }
        }
    }

    fn draw_box(&self, image: &mut RgbImage, annotation: &Annotation) {
        let (x, y) = annotation.bbox.top_left();
        let (x, y) = (x as i32, y as i32);
        let w = (annotation.bbox.width as u32).max(1);
        let h = (annotation.bbox.height as u32).max(1);

        // grow outwards one pixel per ring
        for t in 0..self.thickness {
            let rect = PixelRect::at(x - t as i32, y - t as i32).of_size(w + 2 * t, h + 2 * t);
            draw_hollow_rect_mut(image, rect, annotation.color);
        }
    }
}
