//! Burn inference backend for object detection.
//!
//! `BurnDetector` adapts a detection model built with the Burn framework to
//! [`DetectionSource`], so it can be wrapped in a
//! [`TrackingOracle`](super::TrackingOracle). Frames of any size are
//! stretched to the model input and boxes are mapped back to frame pixels.
//!
//! # Example
//!
//! ```ignore
//! use traffic_tally::{BurnDetector, BurnModel, RawDetection, TrackingOracle};
//! use burn::backend::NdArray;
//!
//! struct MyYoloModel { /* ... */ }
//!
//! impl BurnModel<NdArray> for MyYoloModel {
//!     fn forward(&self, input: burn::tensor::Tensor<NdArray, 4>) -> Vec<RawDetection> {
//!         // Run inference
//!     }
//! }
//!
//! let detector = BurnDetector::new(MyYoloModel::load("yolo.bin"), Default::default());
//! let oracle = TrackingOracle::with_default_config(detector);
//! ```

use burn::prelude::*;
use burn::tensor::Tensor;
use image::imageops::{self, FilterType};

use super::{DetectionBuilder, DetectionSource};
use crate::tracker::Detection;
use crate::video::Frame;

#[derive(Debug, Clone, thiserror::Error)]
pub enum BurnDetectorError {
    #[error("cannot run the model on an empty {0}x{1} frame")]
    EmptyFrame(u32, u32),
}

/// Model output before confidence filtering, in model input coordinates.
#[derive(Debug, Clone)]
pub struct RawDetection {
    /// `[x1, y1, x2, y2]` or `[cx, cy, w, h]` depending on the model
    pub bbox: [f32; 4],
    pub score: f32,
    pub class_id: u32,
}

/// Detection model runnable on a Burn backend.
pub trait BurnModel<B: Backend>: Send + Sync {
    /// Forward pass over a `[1, 3, height, width]` tensor scaled to `[0, 1]`.
    fn forward(&self, input: Tensor<B, 4>) -> Vec<RawDetection>;

    /// Expected input (width, height).
    fn input_size(&self) -> (u32, u32) {
        (640, 640)
    }

    /// Whether bbox output is center-based (vs corner-based).
    fn bbox_is_xywh(&self) -> bool {
        true
    }
}

pub struct BurnDetector<B: Backend, M: BurnModel<B>> {
    model: M,
    device: B::Device,
    conf_threshold: f32,
}

impl<B: Backend, M: BurnModel<B>> BurnDetector<B, M> {
    pub fn new(model: M, device: B::Device) -> Self {
        Self {
            model,
            device,
            conf_threshold: 0.25,
        }
    }

    /// Scores below this never reach the tracker.
    pub fn with_conf_threshold(mut self, threshold: f32) -> Self {
        self.conf_threshold = threshold;
        self
    }

    /// Stretch the frame to the model size and lay it out as a planar
    /// `[1, 3, H, W]` tensor.
    pub fn preprocess(&self, frame: &Frame) -> Result<Tensor<B, 4>, BurnDetectorError> {
        let (frame_w, frame_h) = frame.image.dimensions();
        if frame_w == 0 || frame_h == 0 {
            return Err(BurnDetectorError::EmptyFrame(frame_w, frame_h));
        }
        let (width, height) = self.model.input_size();
        let resized;
        let image = if (frame_w, frame_h) == (width, height) {
            &frame.image
        } else {
            resized = imageops::resize(&frame.image, width, height, FilterType::Triangle);
            &resized
        };

        let plane = (width * height) as usize;
        let mut data = vec![0f32; plane * 3];
        for (i, pixel) in image.pixels().enumerate() {
            for c in 0..3 {
                data[c * plane + i] = pixel.0[c] as f32 / 255.0;
            }
        }

        Ok(Tensor::<B, 1>::from_floats(data.as_slice(), &self.device).reshape([
            1,
            3,
            height as usize,
            width as usize,
        ]))
    }

    /// Filter by score and map boxes from model to frame coordinates.
    fn postprocess(&self, raw_detections: Vec<RawDetection>, scale: (f32, f32)) -> Vec<Detection> {
        let (sx, sy) = scale;
        let xywh = self.model.bbox_is_xywh();
        raw_detections
            .into_iter()
            .filter(|d| d.score >= self.conf_threshold)
            .map(|d| {
                let [a, b, c, e] = d.bbox;
                let (a, b, c, e) = (a * sx, b * sy, c * sx, e * sy);
                let builder = DetectionBuilder::new().score(d.score).class_id(d.class_id);
                if xywh {
                    builder.xywh(a, b, c, e).build()
                } else {
                    builder.tlbr(a, b, c, e).build()
                }
            })
            .collect()
    }
}

impl<B: Backend, M: BurnModel<B>> DetectionSource for BurnDetector<B, M> {
    type Error = BurnDetectorError;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
        let tensor = self.preprocess(frame)?;
        let raw_detections = self.model.forward(tensor);

        let (frame_w, frame_h) = frame.image.dimensions();
        let (model_w, model_h) = self.model.input_size();
        let scale = (
            frame_w as f32 / model_w as f32,
            frame_h as f32 / model_h as f32,
        );
        Ok(self.postprocess(raw_detections, scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use image::{Rgb, RgbImage};

    /// Emits one confident and one weak box, in a 32x64 input space.
    struct FixedModel {
        xywh: bool,
    }

    impl BurnModel<NdArray> for FixedModel {
        fn forward(&self, input: Tensor<NdArray, 4>) -> Vec<RawDetection> {
            assert_eq!(input.dims(), [1, 3, 64, 32]);
            let bbox = if self.xywh {
                [16.0, 32.0, 8.0, 16.0]
            } else {
                [12.0, 24.0, 20.0, 40.0]
            };
            vec![
                RawDetection {
                    bbox,
                    score: 0.9,
                    class_id: 2,
                },
                RawDetection {
                    bbox,
                    score: 0.1,
                    class_id: 0,
                },
            ]
        }

        fn input_size(&self) -> (u32, u32) {
            (32, 64)
        }

        fn bbox_is_xywh(&self) -> bool {
            self.xywh
        }
    }

    #[test]
    fn test_boxes_mapped_back_to_frame() {
        for xywh in [true, false] {
            let mut detector = BurnDetector::<NdArray, _>::new(FixedModel { xywh }, Default::default());
            // 10x wider and 5x taller than the model input
            let frame = Frame::new(0, RgbImage::new(320, 320));
            let detections = detector.detect(&frame).unwrap();

            assert_eq!(detections.len(), 1);
            assert_eq!(detections[0].class_id, 2);
            let tlbr = detections[0].bbox.to_tlbr();
            for (got, want) in tlbr.iter().zip([120.0, 120.0, 200.0, 200.0]) {
                assert!((got - want).abs() < 1e-3, "{tlbr:?}");
            }
        }
    }

    #[test]
    fn test_preprocess_planar_layout() {
        let detector = BurnDetector::<NdArray, _>::new(FixedModel { xywh: true }, Default::default());
        let mut image = RgbImage::new(32, 64);
        image.put_pixel(0, 0, Rgb([255, 0, 51]));
        let values = detector
            .preprocess(&Frame::new(0, image))
            .unwrap()
            .into_data()
            .to_vec::<f32>()
            .unwrap();

        let plane = 32 * 64;
        assert_eq!(values.len(), plane * 3);
        assert_eq!(values[0], 1.0);
        assert_eq!(values[plane], 0.0);
        assert!((values[2 * plane] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_empty_frame_rejected() {
        let mut detector = BurnDetector::<NdArray, _>::new(FixedModel { xywh: true }, Default::default());
        let err = detector.detect(&Frame::new(0, RgbImage::new(0, 0))).unwrap_err();
        assert!(matches!(err, BurnDetectorError::EmptyFrame(0, 0)));
    }
}
