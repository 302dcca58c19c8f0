/// 热力图系统 (Heatmap System)
///
/// - SpatialAccumulator: 检测中心点的空间累积 (可衰减 + 原始轨迹)
/// - HeatmapRenderer:    平滑 / 归一化 / 着色 / 缩放
/// - palette:            JET 调色板
pub mod accumulator;
pub mod palette;
pub mod renderer;

pub use accumulator::{parse_decay, SpatialAccumulator};
pub use renderer::{colorize, ensure_odd_kernel, normalize, resolve_kernel, HeatmapRenderer};
