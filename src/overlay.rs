//! 叠加绘制: 检测框 + 标签, FPS, 计数面板 (Current / Avg / Max)

use std::fs;
use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::pixelops::interpolate;
use imageproc::rect::Rect;

use crate::detection::BBox;

/// 检测框默认颜色 (蓝)
pub const BOX_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const FPS_COLOR: Rgb<u8> = Rgb([100, 255, 0]);
const PANEL_COLOR: Rgb<u8> = Rgb([30, 30, 30]);
const PANEL_BORDER: Rgb<u8> = Rgb([200, 200, 200]);
/// 面板背景不透明度
const PANEL_ALPHA: f32 = 0.45;

/// 裁剪到画布内的矩形, 完全在画布外时返回 None
fn clipped_rect(frame: &RgbImage, x1: i32, y1: i32, x2: i32, y2: i32) -> Option<Rect> {
    let (w, h) = (frame.width() as i32, frame.height() as i32);
    let (l, t) = (x1.max(0), y1.max(0));
    let (r, b) = (x2.min(w - 1), y2.min(h - 1));
    if r < l || b < t {
        return None;
    }
    Some(Rect::at(l, t).of_size((r - l + 1) as u32, (b - t + 1) as u32))
}

pub struct Overlay {
    font: Option<FontVec>,
    label_scale: PxScale,
    fps_scale: PxScale,
    panel_scale: PxScale,
}

impl Overlay {
    pub fn new(font: Option<FontVec>) -> Self {
        Self {
            font,
            label_scale: PxScale::from(18.0),
            fps_scale: PxScale::from(24.0),
            panel_scale: PxScale::from(20.0),
        }
    }

    /// 从字体文件创建
    pub fn from_font_file(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("读取字体失败: {}", path.display()))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| anyhow!("字体解析失败 {}: {}", path.display(), e))?;
        Ok(Self::new(Some(font)))
    }

    /// 加载字体, 失败时退化为只画图形
    pub fn load(path: Option<&Path>) -> Self {
        match path {
            Some(path) => match Self::from_font_file(path) {
                Ok(overlay) => {
                    log::info!("✅ 字体加载成功: {}", path.display());
                    overlay
                }
                Err(e) => {
                    log::warn!("⚠️ {:#}, 标签文字将不绘制", e);
                    Self::new(None)
                }
            },
            None => {
                log::info!("📝 未指定字体, 标签文字将不绘制");
                Self::new(None)
            }
        }
    }

    /// 检测框: 2px边框 + 上方实心标签条
    pub fn draw_box(&self, frame: &mut RgbImage, bbox: &BBox, label: &str, color: Rgb<u8>) {
        // 先夹到 [-1, w] / [-1, h], 后续偏移不会溢出
        let (w, h) = (frame.width() as f32, frame.height() as f32);
        let x1 = bbox.x1.clamp(-1.0, w) as i32;
        let y1 = bbox.y1.clamp(-1.0, h) as i32;
        let x2 = bbox.x2.clamp(-1.0, w) as i32;
        let y2 = bbox.y2.clamp(-1.0, h) as i32;
        for inset in 0..2 {
            if let Some(rect) = clipped_rect(frame, x1 + inset, y1 + inset, x2 - inset, y2 - inset) {
                draw_hollow_rect_mut(frame, rect, color);
            }
        }

        let Some(font) = &self.font else {
            return;
        };
        if label.is_empty() {
            return;
        }
        let (tw, th) = text_size(self.label_scale, font, label);
        let (tw, th) = (tw as i32, th as i32);
        if let Some(strip) = clipped_rect(frame, x1, y1 - th - 8, x1 + tw + 6, y1) {
            draw_filled_rect_mut(frame, strip, color);
        }
        draw_text_mut(frame, TEXT_COLOR, x1 + 3, y1 - th - 4, self.label_scale, font, label);
    }

    /// FPS (左上角)
    pub fn draw_fps(&self, frame: &mut RgbImage, fps: f64) {
        if let Some(font) = &self.font {
            let text = format!("{:.1} FPS", fps);
            draw_text_mut(frame, FPS_COLOR, 10, 8, self.fps_scale, font, &text);
        }
    }

    /// 计数面板: 半透明背景 + 边框 + 三行文字
    pub fn draw_counts(&self, frame: &mut RgbImage, current: usize, average: f64, max_count: usize) {
        let lines = [
            format!(" Current : {}", current),
            format!(" Average : {:.1}", average),
            format!(" Maximum : {}", max_count),
        ];
        let (pad_x, pad_y, gap) = (12, 12, 6);

        let sizes: Vec<(i32, i32)> = match &self.font {
            Some(font) => lines
                .iter()
                .map(|l| {
                    let (w, h) = text_size(self.panel_scale, font, l);
                    (w as i32, h as i32)
                })
                .collect(),
            None => vec![(150, 16); lines.len()],
        };
        let panel_w = sizes.iter().map(|s| s.0).max().unwrap_or(0) + pad_x * 2;
        let panel_h = sizes.iter().map(|s| s.1).sum::<i32>()
            + pad_y * 2
            + (lines.len() as i32 - 1) * gap;
        let (x0, y0) = (10, 50);

        let Some(panel) = clipped_rect(frame, x0, y0, x0 + panel_w, y0 + panel_h) else {
            return;
        };
        for y in panel.top()..=panel.bottom() {
            for x in panel.left()..=panel.right() {
                let px = frame.get_pixel_mut(x as u32, y as u32);
                *px = interpolate(PANEL_COLOR, *px, PANEL_ALPHA);
            }
        }
        draw_hollow_rect_mut(frame, panel, PANEL_BORDER);

        if let Some(font) = &self.font {
            let mut y_text = y0 + pad_y;
            for (line, (_, h)) in lines.iter().zip(&sizes) {
                draw_text_mut(frame, TEXT_COLOR, x0 + pad_x, y_text, self.panel_scale, font, line);
                y_text += h + gap;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_box_without_font() {
        let overlay = Overlay::new(None);
        let mut frame = RgbImage::new(20, 20);
        let bbox = BBox::new(2.0, 3.0, 12.0, 15.0, 0.9, 0);
        overlay.draw_box(&mut frame, &bbox, "person 0.90", BOX_COLOR);
        assert_eq!(*frame.get_pixel(2, 3), BOX_COLOR);
        assert_eq!(*frame.get_pixel(3, 4), BOX_COLOR);
        assert_eq!(*frame.get_pixel(7, 9), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_draw_box_outside_frame_is_clipped() {
        let overlay = Overlay::new(None);
        let mut frame = RgbImage::new(10, 10);
        let bbox = BBox::new(-20.0, -20.0, -5.0, -5.0, 0.9, 0);
        overlay.draw_box(&mut frame, &bbox, "x", BOX_COLOR);
        assert!(frame.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_draw_box_extreme_coordinates() {
        let overlay = Overlay::new(None);
        let mut frame = RgbImage::new(10, 10);
        let far_right = BBox::new(3.0e9, 0.0, 3.0e9, 10.0, 0.9, 0);
        overlay.draw_box(&mut frame, &far_right, "x", BOX_COLOR);
        assert!(frame.pixels().all(|p| *p == Rgb([0, 0, 0])));

        // 跨越整个画布的框只画边框
        let huge = BBox::new(-3.0e9, -3.0e9, 3.0e9, 3.0e9, 0.9, 0);
        overlay.draw_box(&mut frame, &huge, "x", BOX_COLOR);
        assert_eq!(*frame.get_pixel(0, 5), BOX_COLOR);
        assert_eq!(*frame.get_pixel(9, 9), BOX_COLOR);
        assert_eq!(*frame.get_pixel(5, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_draw_counts_darkens_panel() {
        let overlay = Overlay::new(None);
        let mut frame = RgbImage::from_pixel(300, 200, Rgb([200, 200, 200]));
        overlay.draw_counts(&mut frame, 3, 1.5, 7);
        let inside = frame.get_pixel(40, 70);
        assert!(inside[0] < 200);
        assert_eq!(*frame.get_pixel(290, 190), Rgb([200, 200, 200]));
    }

    #[test]
    fn test_missing_font_file() {
        assert!(Overlay::from_font_file(Path::new("/nonexistent/font.ttf")).is_err());
        // 无字体时 FPS 不绘制
        let mut frame = RgbImage::new(40, 40);
        Overlay::load(None).draw_fps(&mut frame, 30.0);
        assert!(frame.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
