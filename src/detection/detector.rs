//! 检测器 (Detector)
//! 职责: 输入帧 → 检测框列表
//!
//! 模型推理不在本crate范围内, `ReplayDetector` 回放离线检测结果 (JSON Lines)

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use anyhow::{Context, Result};
use image::RgbImage;
use serde::Deserialize;

use super::names::ClassNames;
use super::types::BBox;

/// 统一的检测器接口
pub trait Detector {
    /// 对单帧做检测
    fn infer(&mut self, frame: &RgbImage) -> Result<Vec<BBox>>;

    /// 类别名称表
    fn names(&self) -> &ClassNames;
}

/// 单个检测记录
#[derive(Debug, Deserialize)]
struct DetectionRecord {
    bbox: [f32; 4],
    confidence: f32,
    class_id: u32,
}

/// 一行: `{"frame": 0, "detections": [...]}` 或直接 `[...]`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FrameRecord {
    Frame {
        #[allow(dead_code)]
        #[serde(default)]
        frame: Option<u64>,
        detections: Vec<DetectionRecord>,
    },
    List(Vec<DetectionRecord>),
}

impl FrameRecord {
    fn into_detections(self) -> Vec<DetectionRecord> {
        match self {
            FrameRecord::Frame { detections, .. } => detections,
            FrameRecord::List(detections) => detections,
        }
    }
}

/// 回放检测器: 每次 `infer` 读取一行
pub struct ReplayDetector {
    lines: Lines<BufReader<File>>,
    names: ClassNames,
    conf_threshold: f32,
    line_no: usize,
    exhausted: bool,
}

impl ReplayDetector {
    pub fn open(path: &Path, names: ClassNames, conf_threshold: f32) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("打开检测结果文件失败: {}", path.display()))?;
        log::info!("🎯 检测结果回放: {}", path.display());
        Ok(Self {
            lines: BufReader::new(file).lines(),
            names,
            conf_threshold,
            line_no: 0,
            exhausted: false,
        })
    }

    fn parse_line(&self, line: &str) -> Result<Vec<BBox>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Vec::new());
        }
        let record: FrameRecord = serde_json::from_str(line)
            .with_context(|| format!("检测结果第 {} 行解析失败", self.line_no))?;

        Ok(record
            .into_detections()
            .into_iter()
            .filter(|d| d.confidence >= self.conf_threshold)
            .map(|d| {
                let [x1, y1, x2, y2] = d.bbox;
                BBox::new(x1, y1, x2, y2, d.confidence, d.class_id)
            })
            .collect())
    }
}

impl Detector for ReplayDetector {
    fn infer(&mut self, _frame: &RgbImage) -> Result<Vec<BBox>> {
        if self.exhausted {
            return Ok(Vec::new());
        }
        match self.lines.next() {
            Some(line) => {
                self.line_no += 1;
                let line = line.context("读取检测结果失败")?;
                self.parse_line(&line)
            }
            None => {
                log::debug!("检测结果已读完 ({} 行), 后续帧无检测", self.line_no);
                self.exhausted = true;
                Ok(Vec::new())
            }
        }
    }

    fn names(&self) -> &ClassNames {
        &self.names
    }
}
