//! Frame type and pixel conversion — YUYV to RGB, JPEG encoding.

use image::ImageEncoder;
use thiserror::Error;

/// JPEG quality used for frames sent to the recognition service.
/// Reduced quality keeps request payloads small.
pub const JPEG_QUALITY: u8 = 70;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("buffer length {actual} below expected {expected}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("jpeg encoding failed: {0}")]
    EncodingFailed(String),
}

/// A captured camera still, JPEG-compressed for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl JpegFrame {
    /// Encode raw RGB pixels (width * height * 3 bytes) as JPEG.
    pub fn from_rgb(rgb: &[u8], width: u32, height: u32) -> Result<Self, FrameError> {
        let expected = (width * height * 3) as usize;
        if rgb.len() < expected {
            return Err(FrameError::InvalidLength { expected, actual: rgb.len() });
        }

        let mut data = Vec::new();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY);
        encoder
            .write_image(&rgb[..expected], width, height, image::ExtendedColorType::Rgb8)
            .map_err(|e| FrameError::EncodingFailed(e.to_string()))?;

        Ok(Self { data, width, height })
    }
}

/// Convert packed YUYV (4:2:2) to RGB using the BT.601 transform.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V]; U and V are
/// shared by the pixel pair.
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height * 2) as usize;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength { expected, actual: yuyv.len() });
    }

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for chunk in yuyv[..expected].chunks_exact(4) {
        let [y0, u, y1, v] = [chunk[0], chunk[1], chunk[2], chunk[3]];
        push_yuv_pixel(&mut rgb, y0, u, v);
        push_yuv_pixel(&mut rgb, y1, u, v);
    }
    Ok(rgb)
}

fn push_yuv_pixel(rgb: &mut Vec<u8>, y: u8, u: u8, v: u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = y + 1.402 * v;
    let g = y - 0.344 * u - 0.714 * v;
    let b = y + 1.772 * u;

    rgb.push(r.clamp(0.0, 255.0) as u8);
    rgb.push(g.clamp(0.0, 255.0) as u8);
    rgb.push(b.clamp(0.0, 255.0) as u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_to_rgb_neutral_gray() {
        // Y=128, U=V=128 (no chroma) -> mid gray for both pixels
        let yuyv = [128u8, 128, 128, 128];
        let rgb = yuyv_to_rgb(&yuyv, 2, 1).unwrap();
        assert_eq!(rgb.len(), 6);
        assert_eq!(&rgb[..3], &rgb[3..]);
        for &c in &rgb {
            assert!((126..=130).contains(&c), "channel {c} not neutral");
        }
    }

    #[test]
    fn test_yuyv_short_buffer_rejected() {
        let err = yuyv_to_rgb(&[0u8; 3], 2, 1).unwrap_err();
        assert!(matches!(err, FrameError::InvalidLength { expected: 4, actual: 3 }));
    }

    #[test]
    fn test_jpeg_frame_from_rgb() {
        let rgb = vec![200u8; 8 * 8 * 3];
        let frame = JpegFrame::from_rgb(&rgb, 8, 8).unwrap();
        assert_eq!(frame.width, 8);
        assert_eq!(frame.height, 8);
        // JPEG SOI marker
        assert_eq!(&frame.data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_jpeg_frame_short_rgb_rejected() {
        assert!(JpegFrame::from_rgb(&[0u8; 10], 8, 8).is_err());
    }
}
