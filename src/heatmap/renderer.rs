/// 热力图渲染: 累积网格 → (平滑) → 归一化 → JET着色 → (缩放)
///
/// 渲染是尽力而为的: 平滑或高性能缩放失败时退回到更简单的路径, 不向上抛错
use std::borrow::Cow;

use anyhow::{anyhow, bail, Result};
use fast_image_resize as fr;
use image::{imageops, GrayImage, ImageBuffer, Luma, RgbImage};
use ndarray::Array2;

use super::palette::apply_jet;

/// 平滑核规整为正奇数
///
/// 无法解析或 <= 0 → `default`; 偶数 → +1
pub fn ensure_odd_kernel(raw: &str, default: u32) -> u32 {
    let raw = raw.trim();
    let k = match raw.parse::<i64>() {
        Ok(k) => k,
        Err(_) => match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => v.trunc() as i64,
            _ => return default,
        },
    };
    if k <= 0 {
        return default;
    }
    let k = k.min(u32::MAX as i64 - 1) as u32;
    if k % 2 == 0 {
        k + 1
    } else {
        k
    }
}

/// 热力图视频使用的平滑核: 视频专用核 (已配置且非0) 优先, 否则用通用核
pub fn resolve_kernel(video_kernel: Option<&str>, general_kernel: &str) -> u32 {
    match video_kernel.map(str::trim) {
        Some(k) if is_set(k) => ensure_odd_kernel(k, 1),
        _ => ensure_odd_kernel(general_kernel, 1),
    }
}

fn is_set(raw: &str) -> bool {
    !raw.is_empty() && raw.parse::<f64>().map_or(true, |v| v != 0.0)
}

/// 与 OpenCV GaussianBlur(sigma=0) 相同的 sigma 推导
fn kernel_sigma(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// 有效平滑核: 不超过网格较长边 (取奇数)
fn effective_kernel(kernel: u32, w: usize, h: usize) -> u32 {
    let longest = u32::try_from(w.max(h)).unwrap_or(u32::MAX - 1);
    kernel.min(longest | 1)
}

/// 高斯平滑
pub fn smooth(grid: &Array2<f32>, kernel: u32) -> Result<Array2<f32>> {
    let (h, w) = grid.dim();
    if w == 0 || h == 0 {
        bail!("空网格无法平滑");
    }
    if grid.iter().any(|v| !v.is_finite()) {
        bail!("网格包含非有限值");
    }
    let kernel = effective_kernel(kernel, w, h);
    let sigma = kernel_sigma(kernel);
    if !(sigma > 0.0) {
        bail!("平滑核 {} 无效", kernel);
    }

    let img: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_raw(w as u32, h as u32, grid.iter().copied().collect())
            .ok_or_else(|| anyhow!("网格转换为图像失败"))?;
    let blurred = imageproc::filter::gaussian_blur_f32(&img, sigma);
    Ok(Array2::from_shape_vec((h, w), blurred.into_raw())?)
}

/// 归一化到 [0, 255]; 最大值 <= 0 时返回全黑
pub fn normalize(grid: &Array2<f32>) -> GrayImage {
    let (h, w) = grid.dim();
    let maxv = grid
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0f32, f32::max);
    if !(maxv > 0.0) {
        return GrayImage::new(w as u32, h as u32);
    }
    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        let v = grid[(y as usize, x as usize)];
        Luma([(v / maxv * 255.0) as u8])
    })
}

/// 累积网格 → 彩色热力图
pub fn colorize(grid: &Array2<f32>, kernel: u32) -> RgbImage {
    let source: Cow<'_, Array2<f32>> = if kernel > 1 {
        match smooth(grid, kernel) {
            Ok(smoothed) => Cow::Owned(smoothed),
            Err(e) => {
                log::debug!("热力图平滑失败, 使用原始网格: {}", e);
                Cow::Borrowed(grid)
            }
        }
    } else {
        Cow::Borrowed(grid)
    };
    apply_jet(&normalize(&source))
}

/// 双线性缩放 (fast_image_resize)
fn fast_resize(
    resizer: &mut fr::Resizer,
    img: &RgbImage,
    width: u32,
    height: u32,
) -> Result<RgbImage> {
    let src = fr::images::Image::from_vec_u8(
        img.width(),
        img.height(),
        img.as_raw().clone(),
        fr::PixelType::U8x3,
    )
    .map_err(|e| anyhow!("{:?}", e))?;
    let mut dst = fr::images::Image::new(width, height, fr::PixelType::U8x3);
    resizer
        .resize(
            &src,
            &mut dst,
            &fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear)),
        )
        .map_err(|e| anyhow!("{:?}", e))?;
    RgbImage::from_raw(width, height, dst.buffer().to_vec())
        .ok_or_else(|| anyhow!("缩放结果尺寸不匹配"))
}

/// 热力图渲染器
pub struct HeatmapRenderer {
    kernel: u32,
    resizer: fr::Resizer,
}

impl HeatmapRenderer {
    pub fn new(kernel: u32) -> Self {
        Self {
            kernel: kernel.max(1),
            resizer: fr::Resizer::new(),
        }
    }

    pub fn set_kernel(&mut self, kernel: u32) {
        self.kernel = kernel.max(1);
    }

    pub fn colorize(&self, grid: &Array2<f32>) -> RgbImage {
        colorize(grid, self.kernel)
    }

    /// 着色并缩放到目标尺寸
    pub fn colorize_to(&mut self, grid: &Array2<f32>, width: u32, height: u32) -> RgbImage {
        let heat = self.colorize(grid);
        self.resize(heat, width, height)
    }

    /// 尺寸不同才缩放; 高性能缩放失败时退回 image::imageops
    pub fn resize(&mut self, img: RgbImage, width: u32, height: u32) -> RgbImage {
        if img.dimensions() == (width, height) {
            return img;
        }
        if img.width() == 0 || img.height() == 0 || width == 0 || height == 0 {
            return RgbImage::new(width, height);
        }
        match fast_resize(&mut self.resizer, &img, width, height) {
            Ok(resized) => resized,
            Err(e) => {
                log::debug!("fast_image_resize 失败, 使用 imageops: {}", e);
                imageops::resize(&img, width, height, imageops::FilterType::Triangle)
            }
        }
    }
}
