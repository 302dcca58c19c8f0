/// JET 调色板 (蓝 → 青 → 黄 → 红), 256级查找表
use image::{GrayImage, Rgb, RgbImage};
use once_cell::sync::Lazy;

static JET_LUT: Lazy<[Rgb<u8>; 256]> = Lazy::new(|| {
    let mut lut = [Rgb([0u8, 0, 0]); 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let x = i as f32 / 255.0;
        let channel = |center: f32| {
            let v = (1.5 - (4.0 * x - center).abs()).clamp(0.0, 1.0);
            (v * 255.0).round() as u8
        };
        *entry = Rgb([channel(3.0), channel(2.0), channel(1.0)]);
    }
    lut
});

/// 单个灰度值的颜色
pub fn jet(value: u8) -> Rgb<u8> {
    JET_LUT[value as usize]
}

/// 灰度图 → JET彩色图
pub fn apply_jet(gray: &GrayImage) -> RgbImage {
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| jet(gray.get_pixel(x, y)[0]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jet_endpoints() {
        // 0 → 深蓝, 255 → 深红
        assert_eq!(jet(0), Rgb([0, 0, 128]));
        assert_eq!(jet(255), Rgb([128, 0, 0]));
        let mid = jet(128);
        assert!(mid[1] > 200);
    }

    #[test]
    fn test_apply_jet_shape() {
        let gray = GrayImage::new(7, 3);
        let color = apply_jet(&gray);
        assert_eq!(color.dimensions(), (7, 3));
        assert!(color.pixels().all(|p| *p == jet(0)));
    }
}
