//! 单帧处理 (Frame processor)
//!
//! 检测 → 计数 → 热力图累积 → 热力图着色/写出 → 叠加绘制 → 分屏显示 → 检测视频写出
//!
//! 热力图写出与分屏显示失败只跳过对应输出, 不影响本帧的检测/计数/绘制

use anyhow::{bail, Context, Result};
use image::{GenericImage, RgbImage};

use crate::config::HeatmapSettings;
use crate::detection::{ClassNames, Detector};
use crate::heatmap::{parse_decay, resolve_kernel, HeatmapRenderer, SpatialAccumulator};
use crate::overlay::{Overlay, BOX_COLOR};
use crate::sink::{Display, FrameSink};
use crate::stats::{CountTracker, FpsMeter};

/// 跨帧传递的热力图写出状态
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeatmapProgress {
    /// 成功写出的热力图帧数
    pub frames_written: u64,
    /// 已经报过写出失败 (整个流只警告一次)
    pub warned: bool,
}

/// 检测标签: `<name> <conf>`, 未登记的类别为 `id<class_id>`
pub fn detection_label(names: &ClassNames, class_id: u32, confidence: f32) -> String {
    format!("{} {:.2}", names.display_name(class_id), confidence)
}

/// 左右拼接: [检测帧 | 热力图], 热力图尺寸须与检测帧一致
pub fn compose_split_view(frame: &RgbImage, heat: &RgbImage) -> Result<RgbImage> {
    if frame.dimensions() != heat.dimensions() {
        bail!(
            "分屏尺寸不一致: 检测帧 {:?}, 热力图 {:?}",
            frame.dimensions(),
            heat.dimensions()
        );
    }
    let (w, h) = frame.dimensions();
    let width = w.checked_mul(2).context("分屏宽度溢出")?;
    let mut combined = RgbImage::new(width, h);
    combined.copy_from(frame, 0, 0)?;
    combined.copy_from(heat, w, 0)?;
    Ok(combined)
}

pub struct FrameProcessor {
    detector: Box<dyn Detector>,
    overlay: Overlay,
    counter: CountTracker,
    fps: FpsMeter,
    accumulator: SpatialAccumulator,
    renderer: HeatmapRenderer,
    settings: HeatmapSettings,

    heatmap_sink: Option<Box<dyn FrameSink>>,
    detection_sink: Option<Box<dyn FrameSink>>,
    display: Option<Box<dyn Display>>,

    last_centers: Vec<(f32, f32)>,
    last_labels: Vec<String>,
}

impl FrameProcessor {
    pub fn new(
        detector: Box<dyn Detector>,
        overlay: Overlay,
        accumulator: SpatialAccumulator,
        settings: HeatmapSettings,
    ) -> Self {
        Self {
            detector,
            overlay,
            counter: CountTracker::new(),
            fps: FpsMeter::default(),
            accumulator,
            renderer: HeatmapRenderer::new(1),
            settings,
            heatmap_sink: None,
            detection_sink: None,
            display: None,
            last_centers: Vec::new(),
            last_labels: Vec::new(),
        }
    }

    pub fn with_heatmap_sink(mut self, sink: Box<dyn FrameSink>) -> Self {
        self.heatmap_sink = Some(sink);
        self
    }

    pub fn with_detection_sink(mut self, sink: Box<dyn FrameSink>) -> Self {
        self.detection_sink = Some(sink);
        self
    }

    pub fn with_display(mut self, display: Box<dyn Display>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn accumulator(&self) -> &SpatialAccumulator {
        &self.accumulator
    }

    pub fn counter(&self) -> &CountTracker {
        &self.counter
    }

    pub fn settings_mut(&mut self) -> &mut HeatmapSettings {
        &mut self.settings
    }

    /// 上一帧的检测中心点 (未取整)
    pub fn last_centers(&self) -> &[(f32, f32)] {
        &self.last_centers
    }

    /// 上一帧的检测标签
    pub fn last_labels(&self) -> &[String] {
        &self.last_labels
    }

    /// 当前配置下的衰减系数
    pub fn decay(&self) -> f32 {
        parse_decay(&self.settings.heatmap_decay.to_string())
    }

    /// 当前配置下热力图视频的平滑核
    pub fn kernel(&self) -> u32 {
        let video = self
            .settings
            .heatmap_video_kernel
            .as_ref()
            .map(|k| k.to_string());
        resolve_kernel(video.as_deref(), &self.settings.heatmap_kernel.to_string())
    }

    /// 处理一帧, 返回更新后的热力图写出状态
    pub fn process_frame(
        &mut self,
        frame: &mut RgbImage,
        mut progress: HeatmapProgress,
    ) -> Result<HeatmapProgress> {
        let (w, h) = frame.dimensions();

        // 1. 检测
        let dets = self.detector.infer(frame).context("检测失败")?;
        self.counter.update(dets.len());

        // 2. 检测框 + 中心点
        self.last_centers.clear();
        self.last_labels.clear();
        for bbox in &dets {
            let label = detection_label(self.detector.names(), bbox.class_id, bbox.confidence);
            self.overlay.draw_box(frame, bbox, &label, BOX_COLOR);
            self.last_centers.push(bbox.centroid());
            self.last_labels.push(label);
        }

        // 3. 热力图累积 (decay = 1 时保留全部历史)
        let decay = self.decay();
        self.accumulator.update(decay, &self.last_centers);

        // 4. 热力图帧
        let mut heat = None;
        if self.heatmap_sink.is_some() {
            let kernel = self.kernel();
            self.renderer.set_kernel(kernel);
            let heat_col = self.renderer.colorize_to(self.accumulator.grid(), w, h);

            if let Some(sink) = self.heatmap_sink.as_mut().filter(|s| s.is_open()) {
                match sink.write(&heat_col) {
                    Ok(()) => progress.frames_written += 1,
                    Err(e) => {
                        if !progress.warned {
                            log::warn!("⚠️ 热力图帧写入失败: {:#}", e);
                            progress.warned = true;
                        }
                    }
                }
            }
            heat = Some(heat_col);
        }

        // 5. 计数面板 + FPS
        self.overlay.draw_counts(
            frame,
            self.counter.current(),
            self.counter.average(),
            self.counter.max_count(),
        );
        let fps = self.fps.tick();
        self.overlay.draw_fps(frame, fps);

        // 6. 分屏 (检测 | 热力图)
        if let Some(heat_col) = heat {
            if let Err(e) = self.show_split_view(frame, heat_col) {
                log::warn!("⚠️ 分屏显示失败: {:#}", e);
            }
        }

        // 7. 检测视频
        if let Some(sink) = self.detection_sink.as_mut().filter(|s| s.is_open()) {
            sink.write(frame).context("检测帧写入失败")?;
        }

        Ok(progress)
    }

    fn show_split_view(&mut self, frame: &RgbImage, heat_col: RgbImage) -> Result<()> {
        let Some(display) = self.display.as_mut() else {
            return Ok(());
        };
        let (w, h) = frame.dimensions();
        let heat_col = self.renderer.resize(heat_col, w, h);
        let combined = compose_split_view(frame, &heat_col)?;
        display.show(&combined)
    }

    /// 流结束: 关闭所有输出
    pub fn finish(&mut self) {
        if let Some(sink) = self.heatmap_sink.as_mut() {
            sink.close();
        }
        if let Some(sink) = self.detection_sink.as_mut() {
            sink.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_label_for_unmapped_class() {
        let names = ClassNames::coco();
        assert_eq!(detection_label(&names, 0, 0.876), "person 0.88");
        let label = detection_label(&names, 1234, 0.5);
        assert!(label.starts_with("id1234"));
    }

    #[test]
    fn test_split_view_layout() {
        let frame = RgbImage::from_pixel(3, 2, Rgb([10, 0, 0]));
        let heat = RgbImage::from_pixel(3, 2, Rgb([0, 0, 200]));
        let combined = compose_split_view(&frame, &heat).unwrap();
        assert_eq!(combined.dimensions(), (6, 2));
        assert_eq!(*combined.get_pixel(2, 1), Rgb([10, 0, 0]));
        assert_eq!(*combined.get_pixel(3, 0), Rgb([0, 0, 200]));
    }

    #[test]
    fn test_split_view_size_mismatch() {
        let frame = RgbImage::new(3, 2);
        let heat = RgbImage::new(4, 2);
        assert!(compose_split_view(&frame, &heat).is_err());
    }
}
