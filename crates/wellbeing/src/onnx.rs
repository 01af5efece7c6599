//! ONNX-backed face detector and emotion classifier (tract)

use std::path::Path;

use camera_capture::VideoFrame;
use image::imageops::{self, FilterType};
use tract_onnx::prelude::*;
use tracing::{debug, info};

use crate::detector::{Classification, EmotionClassifier, FaceDetector, FaceRegion};
use crate::DetectionError;

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// UltraFace input resolution (width, height)
const FACE_INPUT: (usize, usize) = (320, 240);

/// NMS IoU threshold for overlapping face boxes
const NMS_IOU_THRESH: f32 = 0.3;

/// FER+ input side (grayscale, square)
const EMOTION_INPUT: usize = 64;

/// FER+ output classes, mapped to the raw labels the emotion table knows
const EMOTION_LABELS: [&str; 8] = [
    "neutral", "happy", "surprise", "sad", "angry", "disgust", "fear", "contempt",
];

fn load_plan(path: &Path, shape: [usize; 4]) -> Result<OnnxPlan, DetectionError> {
    info!("Loading ONNX model from {}", path.display());
    tract_onnx::onnx()
        .model_for_path(path)
        .and_then(|model| model.with_input_fact(0, f32::fact(shape).into()))
        .and_then(|model| model.into_optimized())
        .and_then(|model| model.into_runnable())
        .map_err(|e| DetectionError::ModelLoad(format!("{}: {}", path.display(), e)))
}

/// UltraFace-style detector: `scores [1, N, 2]` and normalised `boxes [1, N, 4]`
pub struct OnnxFaceDetector {
    plan: OnnxPlan,
    confidence_threshold: f32,
}

impl OnnxFaceDetector {
    pub fn new(model_path: &Path, confidence_threshold: f32) -> Result<Self, DetectionError> {
        let (w, h) = FACE_INPUT;
        Ok(Self {
            plan: load_plan(model_path, [1, 3, h, w])?,
            confidence_threshold,
        })
    }
}

impl FaceDetector for OnnxFaceDetector {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<FaceRegion>, DetectionError> {
        let (w, h) = FACE_INPUT;
        let image = frame
            .to_image()
            .map_err(|e| DetectionError::ImageProcessing(e.to_string()))?;
        let resized = imageops::resize(&image, w as u32, h as u32, FilterType::Triangle);

        let input: Tensor = tract_ndarray::Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
            (resized.get_pixel(x as u32, y as u32)[c] as f32 - 127.0) / 128.0
        })
        .into();

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| DetectionError::Inference(e.to_string()))?;
        if outputs.len() < 2 {
            return Err(DetectionError::Inference(format!(
                "face model produced {} outputs, expected 2",
                outputs.len()
            )));
        }
        let scores = outputs[0]
            .as_slice::<f32>()
            .map_err(|e| DetectionError::Inference(e.to_string()))?;
        let boxes = outputs[1]
            .as_slice::<f32>()
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        let (fw, fh) = (frame.width as f32, frame.height as f32);
        let candidates: Vec<FaceRegion> = scores
            .chunks_exact(2)
            .zip(boxes.chunks_exact(4))
            .filter(|(score, _)| score[1] >= self.confidence_threshold)
            .map(|(score, bbox)| {
                let x1 = bbox[0].clamp(0.0, 1.0) * fw;
                let y1 = bbox[1].clamp(0.0, 1.0) * fh;
                let x2 = bbox[2].clamp(0.0, 1.0) * fw;
                let y2 = bbox[3].clamp(0.0, 1.0) * fh;
                FaceRegion {
                    x: x1,
                    y: y1,
                    width: (x2 - x1).max(0.0),
                    height: (y2 - y1).max(0.0),
                    confidence: score[1],
                }
            })
            .collect();

        let faces = non_max_suppression(candidates, NMS_IOU_THRESH);
        debug!("Detected {} face(s)", faces.len());
        Ok(faces)
    }
}

/// FER+-style classifier: 64x64 grayscale in, 8 logits out
pub struct OnnxEmotionClassifier {
    id: String,
    plan: OnnxPlan,
}

impl OnnxEmotionClassifier {
    pub fn new(id: impl Into<String>, model_path: &Path) -> Result<Self, DetectionError> {
        Ok(Self {
            id: id.into(),
            plan: load_plan(model_path, [1, 1, EMOTION_INPUT, EMOTION_INPUT])?,
        })
    }
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn id(&self) -> &str {
        &self.id
    }

    fn classify(&mut self, face: &VideoFrame) -> Result<Classification, DetectionError> {
        let image = face
            .to_image()
            .map_err(|e| DetectionError::ImageProcessing(e.to_string()))?;
        let gray = imageops::grayscale(&image);
        let side = EMOTION_INPUT as u32;
        let resized = imageops::resize(&gray, side, side, FilterType::Triangle);

        let input: Tensor =
            tract_ndarray::Array4::from_shape_fn((1, 1, EMOTION_INPUT, EMOTION_INPUT), |(_, _, y, x)| {
                resized.get_pixel(x as u32, y as u32)[0] as f32
            })
            .into();

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| DetectionError::Inference(e.to_string()))?;
        let logits = outputs
            .first()
            .ok_or_else(|| DetectionError::Inference("emotion model produced no outputs".into()))?
            .as_slice::<f32>()
            .map_err(|e| DetectionError::Inference(e.to_string()))?;

        top_label(logits)
    }
}

/// Softmax over `logits` and pick the most likely label
fn top_label(logits: &[f32]) -> Result<Classification, DetectionError> {
    if logits.len() != EMOTION_LABELS.len() {
        return Err(DetectionError::Inference(format!(
            "emotion model produced {} classes, expected {}",
            logits.len(),
            EMOTION_LABELS.len()
        )));
    }

    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    let (best, weight) = exps
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |acc, (i, e)| if e > acc.1 { (i, e) } else { acc });

    Ok(Classification {
        label: EMOTION_LABELS[best].to_string(),
        confidence: (weight / sum) as f64,
    })
}

/// IoU between two boxes represented as `[x1, y1, x2, y2]`
fn bbox_iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// Greedy NMS, highest confidence first
fn non_max_suppression(mut candidates: Vec<FaceRegion>, iou_thresh: f32) -> Vec<FaceRegion> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<FaceRegion> = Vec::new();
    for candidate in candidates {
        let corners = candidate.corners();
        if kept.iter().all(|k| bbox_iou(&k.corners(), &corners) <= iou_thresh) {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(x: f32, y: f32, size: f32, confidence: f32) -> FaceRegion {
        FaceRegion {
            x,
            y,
            width: size,
            height: size,
            confidence,
        }
    }

    #[test]
    fn test_bbox_iou() {
        let a = [0.0, 0.0, 10.0, 10.0];
        let b = [5.0, 5.0, 15.0, 15.0];
        assert!((bbox_iou(&a, &b) - 25.0 / 175.0).abs() < 1e-6);
        assert_eq!(bbox_iou(&a, &[20.0, 20.0, 30.0, 30.0]), 0.0);
    }

    #[test]
    fn test_nms_keeps_best_of_overlapping() {
        let faces = non_max_suppression(
            vec![
                region(0.0, 0.0, 10.0, 0.8),
                region(1.0, 1.0, 10.0, 0.95),
                region(50.0, 50.0, 10.0, 0.75),
            ],
            NMS_IOU_THRESH,
        );
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].confidence, 0.95);
        assert_eq!(faces[1].x, 50.0);
    }

    #[test]
    fn test_top_label_softmax() {
        let mut logits = [0.0f32; 8];
        logits[3] = 4.0;
        let result = top_label(&logits).unwrap();
        assert_eq!(result.label, "sad");
        let expected = 4.0f64.exp() / (4.0f64.exp() + 7.0);
        assert!((result.confidence - expected).abs() < 1e-4);
    }

    #[test]
    fn test_top_label_rejects_wrong_arity() {
        assert!(matches!(top_label(&[1.0, 2.0]), Err(DetectionError::Inference(_))));
    }

    #[test]
    fn test_missing_model_fails_to_load() {
        let result = OnnxEmotionClassifier::new("ferplus", Path::new("/nonexistent/ferplus.onnx"));
        assert!(matches!(result, Err(DetectionError::ModelLoad(_))));
    }
}
