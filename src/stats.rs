//! 统计: 每帧检测数 (当前/平均/最大) + 平滑FPS

use std::time::Instant;

/// 检测数统计
#[derive(Debug, Default, Clone)]
pub struct CountTracker {
    current: usize,
    max_count: usize,
    total: u64,
    frames: u64,
}

impl CountTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, count: usize) {
        self.current = count;
        self.max_count = self.max_count.max(count);
        self.total += count as u64;
        self.frames += 1;
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn average(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.total as f64 / self.frames as f64
        }
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// 指数平滑FPS
pub struct FpsMeter {
    alpha: f64,
    last: Option<Instant>,
    fps: f64,
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl FpsMeter {
    /// `alpha` 越大对最新帧越敏感
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.01, 1.0),
            last: None,
            fps: 0.0,
        }
    }

    /// 记录一帧, 返回平滑后的FPS
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        if let Some(last) = self.last.replace(now) {
            let dt = now.duration_since(last).as_secs_f64();
            if dt > 0.0 {
                let inst = 1.0 / dt;
                self.fps = if self.fps == 0.0 {
                    inst
                } else {
                    self.alpha * inst + (1.0 - self.alpha) * self.fps
                };
            }
        }
        self.fps
    }
}
