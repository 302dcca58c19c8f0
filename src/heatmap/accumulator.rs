/// 空间累积器 (Spatial accumulator)
///
/// 与帧同尺寸的二维计数网格, 每帧叠加检测中心点, 可按系数衰减历史
use ndarray::Array2;

/// 解析衰减系数
///
/// 无法解析 / 非有限 / 非正数 → 1.0 (不衰减, 保留全部历史)
pub fn parse_decay(raw: &str) -> f32 {
    match raw.trim().parse::<f32>() {
        Ok(d) if d.is_finite() && d > 0.0 => d,
        _ => 1.0,
    }
}

/// 中心点取整 (四舍六入五成双)
fn round_coord(v: f32) -> f32 {
    v.round_ties_even()
}

pub struct SpatialAccumulator {
    /// 主网格, 形状 (height, width), 可衰减
    grid: Array2<f32>,
    /// 原始轨迹, 只累加不衰减
    raw_grid: Option<Array2<f32>>,
    width: usize,
    height: usize,
}

impl SpatialAccumulator {
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width as usize, height as usize);
        Self {
            grid: Array2::zeros((height, width)),
            raw_grid: None,
            width,
            height,
        }
    }

    /// 同时保留一份不衰减的原始轨迹
    pub fn with_raw_trace(width: u32, height: u32) -> Self {
        let mut acc = Self::new(width, height);
        acc.raw_grid = Some(Array2::zeros((acc.height, acc.width)));
        acc
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn grid(&self) -> &Array2<f32> {
        &self.grid
    }

    pub fn raw_grid(&self) -> Option<&Array2<f32>> {
        self.raw_grid.as_ref()
    }

    /// 衰减主网格
    ///
    /// 只有 0 < factor < 1 时生效; factor >= 1 (或非法值) 保留全部历史
    pub fn apply_decay(&mut self, factor: f32) {
        if factor > 0.0 && factor < 1.0 {
            self.grid.mapv_inplace(|v| v * factor);
        }
    }

    /// 在 (x, y) 取整后的格子上累加 `amount`, 越界静默丢弃
    pub fn add_point(&mut self, x: f32, y: f32, amount: f32) {
        if !(amount.is_finite() && amount >= 0.0) {
            return;
        }
        let (ix, iy) = (round_coord(x), round_coord(y));
        if !(ix >= 0.0 && iy >= 0.0 && ix < self.width as f32 && iy < self.height as f32) {
            return;
        }
        let idx = (iy as usize, ix as usize);
        self.grid[idx] += amount;
        if let Some(raw) = self.raw_grid.as_mut() {
            raw[idx] += amount;
        }
    }

    /// 单帧更新: 先衰减, 再叠加本帧全部中心点 (每点 1.0)
    pub fn update(&mut self, decay: f32, points: &[(f32, f32)]) {
        self.apply_decay(decay);
        for &(x, y) in points {
            self.add_point(x, y, 1.0);
        }
    }

    pub fn value(&self, x: usize, y: usize) -> Option<f32> {
        self.grid.get((y, x)).copied()
    }

    pub fn sum(&self) -> f32 {
        self.grid.sum()
    }

    pub fn max(&self) -> f32 {
        self.grid.iter().copied().fold(0.0, f32::max)
    }

    /// 清空 (主网格 + 原始轨迹)
    pub fn reset(&mut self) {
        self.grid.fill(0.0);
        if let Some(raw) = self.raw_grid.as_mut() {
            raw.fill(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_parse_decay() {
        assert_eq!(parse_decay("0.95"), 0.95);
        assert_eq!(parse_decay(" 0.5 "), 0.5);
        assert_eq!(parse_decay("1"), 1.0);
        assert_eq!(parse_decay("abc"), 1.0);
        assert_eq!(parse_decay(""), 1.0);
        assert_eq!(parse_decay("NaN"), 1.0);
        assert_eq!(parse_decay("-0.5"), 1.0);
        assert_eq!(parse_decay("0"), 1.0);
    }

    #[test]
    fn test_repeated_point_without_decay() {
        let mut acc = SpatialAccumulator::new(10, 10);
        for _ in 0..3 {
            acc.update(1.0, &[(3.0, 3.0)]);
        }
        assert_eq!(acc.value(3, 3), Some(3.0));
        assert_eq!(acc.sum(), 3.0);
    }

    #[test]
    fn test_decay_then_add() {
        let mut acc = SpatialAccumulator::new(10, 10);
        acc.add_point(2.0, 5.0, 4.0);
        acc.update(0.5, &[(2.0, 5.0)]);
        assert_eq!(acc.value(2, 5), Some(3.0));
    }

    #[test]
    fn test_decay_scales_every_cell() {
        let mut rng = rand::thread_rng();
        let mut acc = SpatialAccumulator::new(16, 12);
        for _ in 0..50 {
            acc.add_point(rng.gen_range(0.0..16.0), rng.gen_range(0.0..12.0), 1.0);
        }
        let before = acc.grid().clone();
        let d = rng.gen_range(0.01..0.99);
        acc.apply_decay(d);
        for (after, prev) in acc.grid().iter().zip(before.iter()) {
            assert!((after - prev * d).abs() < 1e-6);
        }
    }

    #[test]
    fn test_no_decay_sum_never_decreases() {
        let mut rng = rand::thread_rng();
        for raw in ["1.0", "1.5", "x"] {
            let decay = parse_decay(raw);
            let mut acc = SpatialAccumulator::new(20, 20);
            let mut last = 0.0;
            for _ in 0..30 {
                let points: Vec<(f32, f32)> = (0..rng.gen_range(0..5))
                    .map(|_| (rng.gen_range(-5.0..25.0), rng.gen_range(-5.0..25.0)))
                    .collect();
                acc.update(decay, &points);
                assert!(acc.sum() >= last);
                last = acc.sum();
            }
        }
    }

    #[test]
    fn test_out_of_bounds_dropped() {
        let mut acc = SpatialAccumulator::with_raw_trace(10, 8);
        for (x, y) in [(-1.0, 0.0), (0.0, -1.0), (10.0, 0.0), (0.0, 8.0), (9.6, 2.0), (f32::NAN, 1.0)] {
            acc.add_point(x, y, 1.0);
        }
        assert_eq!(acc.sum(), 0.0);
        assert_eq!(acc.raw_grid().map(|g| g.sum()), Some(0.0));

        // -0.4 取整后为 0, 仍在范围内
        acc.add_point(-0.4, 7.4, 1.0);
        assert_eq!(acc.value(0, 7), Some(1.0));
    }

    #[test]
    fn test_round_half_to_even() {
        let mut acc = SpatialAccumulator::new(10, 10);
        acc.add_point(2.5, 3.5, 1.0);
        assert_eq!(acc.value(2, 4), Some(1.0));
    }

    #[test]
    fn test_raw_trace_never_decays() {
        let mut acc = SpatialAccumulator::with_raw_trace(5, 5);
        acc.update(0.5, &[(1.0, 1.0)]);
        acc.update(0.5, &[(1.0, 1.0)]);
        assert_eq!(acc.value(1, 1), Some(1.5));
        assert_eq!(acc.raw_grid().and_then(|g| g.get((1, 1)).copied()), Some(2.0));
    }

    #[test]
    fn test_negative_amount_ignored() {
        let mut acc = SpatialAccumulator::new(4, 4);
        acc.add_point(1.0, 1.0, -2.0);
        assert_eq!(acc.sum(), 0.0);
        acc.apply_decay(-1.0);
        acc.add_point(1.0, 1.0, 2.0);
        acc.apply_decay(-1.0);
        assert_eq!(acc.value(1, 1), Some(2.0));
    }

    #[test]
    fn test_reset() {
        let mut acc = SpatialAccumulator::with_raw_trace(4, 4);
        acc.add_point(1.0, 1.0, 1.0);
        acc.reset();
        assert_eq!(acc.sum(), 0.0);
        assert_eq!(acc.max(), 0.0);
    }
}
