//! 输出端: 帧序列写出 + 分屏显示
//!
//! 视频编码不在本crate范围内, 帧以编号PNG写出, 可用外部工具合成视频

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::RgbImage;

/// 视频输出端
pub trait FrameSink {
    fn is_open(&self) -> bool;

    fn write(&mut self, frame: &RgbImage) -> Result<()>;

    fn close(&mut self) {}
}

/// 显示端
pub trait Display {
    fn show(&mut self, image: &RgbImage) -> Result<()>;
}

/// 编号PNG帧序列: `<dir>/<prefix>_000000.png`, `<dir>/<prefix>_000001.png` ...
pub struct ImageSequenceWriter {
    dir: PathBuf,
    prefix: String,
    size: Option<(u32, u32)>,
    frames_written: u64,
    open: bool,
}

impl ImageSequenceWriter {
    pub fn create(dir: &Path, prefix: &str) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("创建输出目录失败: {}", dir.display()))?;
        log::info!("💾 帧序列输出: {}/{}_*.png", dir.display(), prefix);
        Ok(Self {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
            size: None,
            frames_written: 0,
            open: true,
        })
    }

    /// 固定帧尺寸, 尺寸不符的帧写入失败
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl FrameSink for ImageSequenceWriter {
    fn is_open(&self) -> bool {
        self.open
    }

    fn write(&mut self, frame: &RgbImage) -> Result<()> {
        if !self.open {
            bail!("{} 已关闭", self.prefix);
        }
        if let Some(size) = self.size {
            if frame.dimensions() != size {
                bail!(
                    "帧尺寸 {:?} 与输出尺寸 {:?} 不一致",
                    frame.dimensions(),
                    size
                );
            }
        }
        let path = self
            .dir
            .join(format!("{}_{:06}.png", self.prefix, self.frames_written));
        frame
            .save(&path)
            .with_context(|| format!("写入帧失败: {}", path.display()))?;
        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            log::info!("💾 {} 共写出 {} 帧", self.prefix, self.frames_written);
        }
        self.open = false;
    }
}

/// 快照显示: 每 `every` 帧覆盖写一张图片
pub struct SnapshotDisplay {
    path: PathBuf,
    every: u32,
    shown: u64,
}

impl SnapshotDisplay {
    pub fn new(path: PathBuf, every: u32) -> Self {
        Self {
            path,
            every: every.max(1),
            shown: 0,
        }
    }
}

impl Display for SnapshotDisplay {
    fn show(&mut self, image: &RgbImage) -> Result<()> {
        let index = self.shown;
        self.shown += 1;
        if index % self.every as u64 != 0 {
            return Ok(());
        }
        image
            .save(&self.path)
            .with_context(|| format!("写入分屏快照失败: {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_writer_numbers_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ImageSequenceWriter::create(dir.path(), "heatmap").unwrap();
        let frame = RgbImage::new(4, 3);
        writer.write(&frame).unwrap();
        writer.write(&frame).unwrap();
        assert_eq!(writer.frames_written(), 2);
        assert!(dir.path().join("heatmap_000000.png").exists());
        assert!(dir.path().join("heatmap_000001.png").exists());

        writer.close();
        assert!(!writer.is_open());
        assert!(writer.write(&frame).is_err());
    }

    #[test]
    fn test_sequence_writer_rejects_wrong_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ImageSequenceWriter::create(dir.path(), "det")
            .unwrap()
            .with_size(4, 3);
        assert!(writer.write(&RgbImage::new(5, 3)).is_err());
        assert_eq!(writer.frames_written(), 0);
    }

    #[test]
    fn test_snapshot_display_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("split.png");
        let mut display = SnapshotDisplay::new(path.clone(), 2);
        display.show(&RgbImage::new(2, 2)).unwrap();
        assert!(path.exists());
        fs::remove_file(&path).unwrap();
        display.show(&RgbImage::new(2, 2)).unwrap();
        assert!(!path.exists());
        display.show(&RgbImage::new(2, 2)).unwrap();
        assert!(path.exists());
    }
}
