//! Video frames and the camera seam.

use crate::error::GestureError;

/// One RGBA8 frame, row-major, top-left origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoFrame {
    width:  u32,
    height: u32,
    data:   Vec<u8>,
}

impl VideoFrame {
    /// Wrap a raw buffer, checking it holds exactly `width * height` pixels.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, GestureError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected || width == 0 || height == 0 {
            return Err(GestureError::InvalidFrame { width, height, expected, actual: data.len() });
        }
        Ok(VideoFrame { width, height, data })
    }

    /// Uniform frame of one colour.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        VideoFrame { width, height, data }
    }

    pub fn width(&self) -> u32  { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn data(&self) -> &[u8] { &self.data }

    /// RGB at `(x, y)`; out-of-range coordinates return `None`.
    pub fn rgb(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    pub fn set_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data[i..i + 3].copy_from_slice(&rgb);
    }
}

/// A live camera.  Implementations are moved onto the gesture worker
/// thread, which opens the device, grabs frames at its own cadence, and
/// closes it when gesture control is turned off.
pub trait FrameSource: Send + 'static {
    fn name(&self) -> &str;

    /// Acquire the device at (approximately) the requested resolution.
    fn open(&mut self, width: u32, height: u32) -> Result<(), GestureError>;

    /// Most recent frame, or `None` when no new frame is ready.
    fn grab(&mut self) -> Result<Option<VideoFrame>, GestureError>;

    /// Release the device.  Must be safe to call more than once.
    fn close(&mut self);
}
