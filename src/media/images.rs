//! Модуль нормализации изображений
//!
//! Приводит произвольные изображения к одному соотношению сторон и разрешению:
//! центрированная обрезка, масштабирование Lanczos3 и кодирование в JPEG.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::OutputConfig;
use crate::error::{ReelSyncError, Result};
use crate::utils::artifact::ArtifactGuard;

/// Прямоугольник обрезки в координатах исходного изображения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Обрезка совпадает с исходным изображением
    pub fn is_identity(&self, source_width: u32, source_height: u32) -> bool {
        self.x == 0 && self.y == 0 && self.width == source_width && self.height == source_height
    }
}

/// Вычисляет центрированную обрезку исходника под соотношение сторон `target_width:target_height`
pub fn crop_region(
    source_width: u32,
    source_height: u32,
    target_width: u32,
    target_height: u32,
) -> CropRegion {
    let source_ratio = source_width as f64 / source_height.max(1) as f64;
    let target_ratio = target_width as f64 / target_height.max(1) as f64;

    if source_ratio > target_ratio {
        let width = ((target_ratio * source_height as f64) as u32).clamp(1, source_width.max(1));
        CropRegion {
            x: source_width.saturating_sub(width) / 2,
            y: 0,
            width,
            height: source_height,
        }
    } else {
        let height = ((source_width as f64 / target_ratio) as u32).clamp(1, source_height.max(1));
        CropRegion {
            x: 0,
            y: source_height.saturating_sub(height) / 2,
            width: source_width,
            height,
        }
    }
}

/// Накладывает изображение на сплошной фон, убирая альфа-канал
fn flatten(image: &DynamicImage, background: [u8; 3]) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let px = rgba.get_pixel(x, y).0;
        let alpha = px[3] as u32;
        let blend = |c: u8, bg: u8| ((c as u32 * alpha + bg as u32 * (255 - alpha) + 127) / 255) as u8;
        Rgb([
            blend(px[0], background[0]),
            blend(px[1], background[1]),
            blend(px[2], background[2]),
        ])
    })
}

/// Имя нормализованного кадра
pub fn normalized_name(index: usize) -> String {
    format!("proc_{}.jpg", index)
}

/// Нормализатор изображений
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    output: OutputConfig,
}

impl ImageNormalizer {
    pub fn new(output: OutputConfig) -> Self {
        Self { output }
    }

    /// Обрабатывает одно изображение и сохраняет его в `destination`
    pub fn normalize_one(&self, source: &Path, destination: &Path) -> Result<()> {
        if !source.exists() {
            return Err(ReelSyncError::FileNotFound(format!(
                "Image not found: {}",
                source.display()
            )));
        }

        let image = image::open(source).map_err(|e| {
            ReelSyncError::ImageProcessing(format!("Failed to decode {}: {}", source.display(), e))
        })?;
        if image.width() == 0 || image.height() == 0 {
            return Err(ReelSyncError::ImageProcessing(format!(
                "Image {} has zero size",
                source.display()
            )));
        }
        let (tw, th) = (self.output.width, self.output.height);
        let region = crop_region(image.width(), image.height(), tw, th);
        debug!(
            "Cropping {} ({}x{}) to {:?}",
            source.display(),
            image.width(),
            image.height(),
            region
        );

        let cropped = if region.is_identity(image.width(), image.height()) {
            image
        } else {
            image.crop_imm(region.x, region.y, region.width, region.height)
        };
        let resized = cropped.resize_exact(tw, th, FilterType::Lanczos3);
        let frame = flatten(&resized, self.output.background);

        let writer = BufWriter::new(File::create(destination)?);
        let mut encoder = JpegEncoder::new_with_quality(writer, self.output.jpeg_quality);
        encoder.encode_image(&frame)?;
        Ok(())
    }

    /// Нормализует все изображения в `output_dir`, сохраняя порядок.
    ///
    /// Ошибка в любом исходнике прерывает пакет; уже записанные кадры удаляются.
    pub fn normalize(&self, sources: &[PathBuf], output_dir: &Path) -> Result<Vec<PathBuf>> {
        if sources.is_empty() {
            return Err(ReelSyncError::InvalidInput(
                "No images provided for normalization".to_string(),
            ));
        }
        std::fs::create_dir_all(output_dir)?;

        let destinations: Vec<PathBuf> = (0..sources.len())
            .map(|i| output_dir.join(normalized_name(i)))
            .collect();
        let mut guard = ArtifactGuard::new();
        for destination in &destinations {
            guard.track(destination);
        }

        info!(
            "Normalizing {} images to {}x{}",
            sources.len(),
            self.output.width,
            self.output.height
        );

        sources
            .par_iter()
            .zip(destinations.par_iter())
            .try_for_each(|(source, destination)| self.normalize_one(source, destination))?;

        info!("Images normalized into {}", output_dir.display());
        Ok(guard.commit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba, RgbaImage};

    fn small_output() -> OutputConfig {
        OutputConfig {
            width: 90,
            height: 160,
            ..OutputConfig::default()
        }
    }

    fn write_png(dir: &Path, name: &str, width: u32, height: u32, pixel: Rgba<u8>) -> PathBuf {
        let path = dir.join(name);
        let img: RgbaImage = ImageBuffer::from_pixel(width, height, pixel);
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_crop_landscape_source() {
        let region = crop_region(2000, 1000, 1080, 1920);
        assert_eq!(
            region,
            CropRegion {
                x: 719,
                y: 0,
                width: 562,
                height: 1000
            }
        );
    }

    #[test]
    fn test_crop_tall_source() {
        let region = crop_region(1000, 4000, 1080, 1920);
        assert_eq!(region.x, 0);
        assert_eq!(region.width, 1000);
        assert_eq!(region.height, 1777);
        assert_eq!(region.y, (4000 - 1777) / 2);
    }

    #[test]
    fn test_crop_target_ratio_is_identity() {
        let region = crop_region(540, 960, 1080, 1920);
        assert!(region.is_identity(540, 960));
    }

    #[test]
    fn test_crop_degenerate_source() {
        let region = crop_region(1, 1000, 1920, 1080);
        assert_eq!(region.width, 1);
        assert!(region.height >= 1);
    }

    #[test]
    fn test_normalize_outputs_target_resolution_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let sources = vec![
            write_png(dir.path(), "wide.png", 300, 100, Rgba([255, 0, 0, 255])),
            write_png(dir.path(), "tall.png", 100, 400, Rgba([0, 255, 0, 255])),
            write_png(dir.path(), "exact.png", 90, 160, Rgba([0, 0, 255, 255])),
        ];

        let normalizer = ImageNormalizer::new(small_output());
        let outputs = normalizer.normalize(&sources, &out).unwrap();

        assert_eq!(outputs.len(), 3);
        for (i, path) in outputs.iter().enumerate() {
            assert_eq!(path.file_name().unwrap().to_str().unwrap(), normalized_name(i));
            let img = image::open(path).unwrap();
            assert_eq!((img.width(), img.height()), (90, 160));
        }

        let second = image::open(&outputs[1]).unwrap().to_rgb8();
        let px = second.get_pixel(45, 80).0;
        assert!(px[1] > 200 && px[0] < 50, "unexpected pixel {:?}", px);
    }

    #[test]
    fn test_transparency_is_flattened_onto_background() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_png(dir.path(), "clear.png", 90, 160, Rgba([255, 0, 0, 0]));
        let output = OutputConfig {
            background: [255, 255, 255],
            ..small_output()
        };

        let outputs = ImageNormalizer::new(output)
            .normalize(&[source], &dir.path().join("out"))
            .unwrap();

        let img = image::open(&outputs[0]).unwrap().to_rgb8();
        let px = img.get_pixel(10, 10).0;
        assert!(px.iter().all(|c| *c > 240), "unexpected pixel {:?}", px);
    }

    #[test]
    fn test_corrupt_image_aborts_batch_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let good = write_png(dir.path(), "good.png", 90, 160, Rgba([1, 2, 3, 255]));
        let bad = dir.path().join("bad.png");
        std::fs::write(&bad, b"definitely not a png").unwrap();

        let err = ImageNormalizer::new(small_output())
            .normalize(&[good, bad], &out)
            .unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Processing);
        match &err {
            ReelSyncError::ImageProcessing(message) => assert!(message.contains("bad.png")),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!out.join(normalized_name(0)).exists());
        assert!(!out.join(normalized_name(1)).exists());
    }

    #[test]
    fn test_missing_and_empty_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let normalizer = ImageNormalizer::new(small_output());

        let err = normalizer.normalize(&[], dir.path()).unwrap_err();
        assert!(err.is_input_error());

        let err = normalizer
            .normalize(&[dir.path().join("missing.jpg")], dir.path())
            .unwrap_err();
        assert!(matches!(err, ReelSyncError::FileNotFound(_)));
    }
}
