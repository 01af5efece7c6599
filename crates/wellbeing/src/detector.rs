//! Face detection and emotion classification capabilities

use camera_capture::VideoFrame;

use crate::DetectionError;

/// Face bounding box in frame pixel coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct FaceRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

impl FaceRegion {
    /// Cut this region out of `frame`, clamped to the frame bounds
    pub fn crop(&self, frame: &VideoFrame) -> Option<VideoFrame> {
        frame.crop(
            self.x.round() as i64,
            self.y.round() as i64,
            self.width.round() as i64,
            self.height.round() as i64,
        )
    }

    /// Corners as `[x1, y1, x2, y2]`
    pub fn corners(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }
}

/// Raw classifier output for one face
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Classifier label (e.g. "sad", "neutral")
    pub label: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

/// Finds faces in a frame.
///
/// Implementations may keep state between frames, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<FaceRegion>, DetectionError>;
}

/// Classifies a cropped face into a raw emotion label
pub trait EmotionClassifier: Send {
    /// Identifier reported as the observation source
    fn id(&self) -> &str;

    fn classify(&mut self, face: &VideoFrame) -> Result<Classification, DetectionError>;
}
