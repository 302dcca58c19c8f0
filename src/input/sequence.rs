//! 图片序列输入
//!
//! 目录中的图片按文件名排序作为连续帧, 所有帧尺寸须与第一帧一致

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::RgbImage;

const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// 图片序列解码器
pub struct ImageSequenceSource {
    files: Vec<PathBuf>,
    next: usize,
    size: Option<(u32, u32)>,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut files = Vec::new();
        for entry in
            fs::read_dir(dir).with_context(|| format!("读取输入目录失败: {}", dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && is_image(&path) {
                files.push(path);
            }
        }
        if files.is_empty() {
            bail!("输入目录中没有图片: {}", dir.display());
        }
        files.sort();
        log::info!("📹 输入: {} ({} 帧)", dir.display(), files.len());
        Ok(Self {
            files,
            next: 0,
            size: None,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn decode(&mut self, path: &Path) -> Result<RgbImage> {
        let frame = image::open(path)
            .with_context(|| format!("解码帧失败: {}", path.display()))?
            .to_rgb8();
        match self.size {
            None => self.size = Some(frame.dimensions()),
            Some(size) if size != frame.dimensions() => bail!(
                "帧尺寸不一致: {} 为 {:?}, 期望 {:?}",
                path.display(),
                frame.dimensions(),
                size
            ),
            Some(_) => {}
        }
        Ok(frame)
    }
}

impl Iterator for ImageSequenceSource {
    type Item = Result<RgbImage>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.files.get(self.next)?.clone();
        self.next += 1;
        Some(self.decode(&path))
    }
}
