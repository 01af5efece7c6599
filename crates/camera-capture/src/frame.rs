//! Video frame types and processing

use image::RgbImage;

use crate::CameraError;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds since the Unix epoch)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Wrap a decoded RGB image
    pub fn from_image(image: RgbImage, timestamp_ns: u64, sequence: u32) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, timestamp_ns, sequence)
    }

    /// Copy the pixel buffer into an `image` RGB buffer
    pub fn to_image(&self) -> Result<RgbImage, CameraError> {
        RgbImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            CameraError::Decode(format!(
                "buffer of {} bytes does not hold a {}x{} RGB frame",
                self.data.len(),
                self.width,
                self.height
            ))
        })
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        self.data.get(idx..idx + 3).map(|p| [p[0], p[1], p[2]])
    }

    /// Crop a region of the frame, clamped to the frame bounds.
    ///
    /// Returns `None` when the clamped region is empty.
    pub fn crop(&self, x: i64, y: i64, w: i64, h: i64) -> Option<VideoFrame> {
        let x0 = x.clamp(0, self.width as i64) as u32;
        let y0 = y.clamp(0, self.height as i64) as u32;
        let x1 = x.saturating_add(w).clamp(0, self.width as i64) as u32;
        let y1 = y.saturating_add(h).clamp(0, self.height as i64) as u32;
        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        let (cw, ch) = (x1 - x0, y1 - y0);
        let mut cropped = Vec::with_capacity((cw * ch * 3) as usize);
        for row in y0..y1 {
            let start = ((row * self.width + x0) * 3) as usize;
            let end = start + (cw * 3) as usize;
            cropped.extend_from_slice(self.data.get(start..end)?);
        }

        Some(VideoFrame {
            data: cropped,
            width: cw,
            height: ch,
            timestamp_ns: self.timestamp_ns,
            sequence: self.sequence,
        })
    }
}
