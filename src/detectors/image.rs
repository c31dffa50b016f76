use std::io::Cursor;

use ::image::{DynamicImage, ImageDecoder, ImageReader, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::core::error::RadarError;
use crate::core::hash::image_fingerprint;
use crate::core::signal::{codes, ScoreResult};
use crate::detectors::{evaluate, Hit, Rule, Ruleset};
use crate::pipeline::scorer::{aggregate, image_category, image_notes};

const MIN_SIDE: u32 = 500;
const MIN_VARIANCE: f64 = 150.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageFeatures {
    pub width: u32,
    pub height: u32,
    pub exif_present: bool,
    /// Population variance of the grayscale intensities.
    pub variance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageReport {
    #[serde(flatten)]
    pub result: ScoreResult,
    pub width: u32,
    pub height: u32,
    pub exif_present: bool,
    pub fingerprint: String,
}

/// Decode `bytes` and measure them. Fails only when the bytes are not a
/// supported image; truncated input is a decode failure too.
pub fn extract_features(bytes: &[u8]) -> Result<ImageFeatures, RadarError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(decode_error)?;
    if reader.format().is_none() {
        return Err(RadarError::Decode("unrecognized image format".to_string()));
    }
    let mut decoder = reader.into_decoder().map_err(decode_error)?;
    let exif_present = match decoder.exif_metadata() {
        Ok(Some(exif)) => !exif.is_empty(),
        Ok(None) => false,
        Err(err) => {
            tracing::debug!("reading exif metadata failed: {err}");
            false
        }
    };
    let img = DynamicImage::from_decoder(decoder).map_err(decode_error)?;

    Ok(ImageFeatures {
        width: img.width(),
        height: img.height(),
        exif_present,
        variance: luma_variance(&img.to_rgb8()),
    })
}

fn decode_error(err: impl std::fmt::Display) -> RadarError {
    RadarError::Decode(err.to_string())
}

/// ITU-R 601-2 luma, rounded to the nearest integer.
pub fn luma_601(px: &Rgb<u8>) -> u8 {
    let [r, g, b] = px.0;
    let weighted = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
    ((weighted + 500) / 1000) as u8
}

/// Population variance of the 601-2 luma of every pixel.
pub fn luma_variance(img: &RgbImage) -> f64 {
    let n = (img.width() as u64 * img.height() as u64) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let (sum, sum_sq) = img.pixels().fold((0f64, 0f64), |(s, sq), px| {
        let v = luma_601(px) as f64;
        (s + v, sq + v * v)
    });
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

pub const RULES: &[Rule<ImageFeatures>] = &[
    Rule {
        code: codes::NO_EXIF,
        check: |f| {
            (!f.exif_present).then(|| {
                Hit::once(
                    "no EXIF metadata: common in re-saved, re-shared or AI-generated images, \
                     but also after normal compression",
                )
            })
        },
    },
    Rule {
        code: codes::LOW_RES,
        check: |f| {
            (f.width < MIN_SIDE || f.height < MIN_SIDE)
                .then(|| Hit::once(format!("{}x{}", f.width, f.height)))
        },
    },
    Rule {
        code: codes::LOW_DETAIL,
        check: |f| {
            (f.variance < MIN_VARIANCE).then(|| {
                Hit::once(format!(
                    "var={:.1}: unnaturally flat image, may indicate synthetic generation or heavy compression",
                    f.variance
                ))
            })
        },
    },
];

/// Score already-decoded features.
pub fn score_features(features: &ImageFeatures, ruleset: &Ruleset) -> ScoreResult {
    let signals = evaluate(RULES, features, ruleset);
    let (score, level) = aggregate(&signals, &ruleset.thresholds.image);
    ScoreResult {
        score,
        level,
        signals,
        category: image_category(level).to_string(),
        advice: image_notes(),
    }
}

pub fn score(bytes: &[u8], ruleset: &Ruleset) -> Result<ImageReport, RadarError> {
    let features = extract_features(bytes)?;
    let result = score_features(&features, ruleset);
    tracing::debug!(
        width = features.width,
        height = features.height,
        variance = features.variance,
        score = result.score,
        "image scored"
    );
    Ok(ImageReport {
        result,
        width: features.width,
        height: features.height,
        exif_present: features.exif_present,
        fingerprint: image_fingerprint(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RadarConfig;
    use crate::core::signal::RiskLevel;
    use ::image::{GrayImage, ImageFormat, Luma};

    fn rules() -> Ruleset {
        Ruleset::from_config(&RadarConfig::default()).unwrap()
    }

    fn png(img: GrayImage) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn jpeg_with_exif(img: GrayImage) -> Vec<u8> {
        let mut jpeg = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();
        // APP1 "Exif" segment: little-endian TIFF header with one empty IFD.
        let mut payload = b"Exif\0\0II*\0".to_vec();
        payload.extend_from_slice(&8u32.to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes());
        payload.extend_from_slice(&0u32.to_le_bytes());
        let len = (payload.len() + 2) as u16;
        let mut segment = vec![0xFF, 0xE1];
        segment.extend_from_slice(&len.to_be_bytes());
        segment.extend_from_slice(&payload);
        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&segment);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn variance_of_two_tone_image() {
        let img = GrayImage::from_fn(4, 4, |x, _| Luma([if x % 2 == 0 { 100 } else { 114 }]));
        let rgb = DynamicImage::ImageLuma8(img).to_rgb8();
        assert!((luma_variance(&rgb) - 49.0).abs() < 1e-9);
        let flat = RgbImage::from_pixel(3, 3, Rgb([7, 7, 7]));
        assert_eq!(luma_variance(&flat), 0.0);
    }

    #[test]
    fn colour_luma_uses_601_weights() {
        assert_eq!(luma_601(&Rgb([255, 0, 0])), 76);
        assert_eq!(luma_601(&Rgb([0, 255, 0])), 150);
        assert_eq!(luma_601(&Rgb([0, 0, 255])), 29);
        assert_eq!(luma_601(&Rgb([255, 255, 255])), 255);

        let stripes = RgbImage::from_fn(8, 8, |x, _| {
            if x % 2 == 0 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 255, 0])
            }
        });
        assert!((luma_variance(&stripes) - 1369.0).abs() < 1e-9);
    }

    #[test]
    fn colour_image_detail_is_measured_on_601_luma() {
        let img = RgbImage::from_fn(600, 600, |x, _| {
            if x % 2 == 0 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 255, 0])
            }
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        let features = extract_features(&bytes).unwrap();
        assert!((features.variance - 1369.0).abs() < 1e-9);
        assert!(!score(&bytes, &rules()).unwrap().result.has(codes::LOW_DETAIL));
    }

    #[test]
    fn jpeg_exif_segment_is_detected() {
        let img = GrayImage::from_fn(64, 64, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        let report = score(&jpeg_with_exif(img), &rules()).unwrap();
        assert!(report.exif_present);
        assert!(!report.result.has(codes::NO_EXIF));
        assert!(report.result.has(codes::LOW_RES));
    }

    #[test]
    fn small_flat_image_without_exif_is_medium() {
        let img = GrayImage::from_fn(300, 200, |x, _| Luma([if x % 2 == 0 { 100 } else { 114 }]));
        let report = score(&png(img), &rules()).unwrap();
        assert!(!report.exif_present);
        assert_eq!((report.width, report.height), (300, 200));
        assert_eq!(report.result.score, 10 + 8 + 10);
        assert_eq!(report.result.level, RiskLevel::Medium);
        assert_eq!(report.result.category, "deepfake_suspected");
        let low_res = &report.result.signals[1];
        assert_eq!(low_res.code, codes::LOW_RES);
        assert_eq!(low_res.evidence, "300x200");
        assert_eq!(report.result.advice.len(), 3);
        assert_eq!(report.fingerprint.len(), 64);
    }

    #[test]
    fn large_detailed_image_is_low() {
        let img = GrayImage::from_fn(600, 600, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        let report = score(&png(img), &rules()).unwrap();
        assert_eq!(report.result.score, 10);
        assert_eq!(report.result.level, RiskLevel::Low);
        assert_eq!(report.result.category, "image_check");
        assert_eq!(report.result.signals.len(), 1);
        assert_eq!(report.result.signals[0].code, codes::NO_EXIF);
    }

    #[test]
    fn exif_present_skips_no_exif_rule() {
        let features = ImageFeatures {
            width: 1024,
            height: 768,
            exif_present: true,
            variance: 2000.0,
        };
        let result = score_features(&features, &rules());
        assert_eq!(result.score, 0);
        assert!(result.signals.is_empty());
        assert_eq!(result.level, RiskLevel::Low);
    }

    #[test]
    fn resolution_boundary() {
        let mut features = ImageFeatures {
            width: 500,
            height: 500,
            exif_present: true,
            variance: 150.0,
        };
        assert!(score_features(&features, &rules()).signals.is_empty());
        features.height = 499;
        assert_eq!(score_features(&features, &rules()).score, 8);
    }

    #[test]
    fn garbage_bytes_are_decode_error() {
        let err = score(b"definitely not an image", &rules()).unwrap_err();
        assert!(matches!(err, RadarError::Decode(_)));
    }

    #[test]
    fn truncated_png_is_decode_error() {
        let img = GrayImage::from_pixel(50, 50, Luma([1]));
        let bytes = png(img);
        for cut in [bytes.len() / 2, 20] {
            let err = score(&bytes[..cut], &rules()).unwrap_err();
            assert!(matches!(err, RadarError::Decode(_)), "{err:?}");
        }
    }
}
