#![forbid(unsafe_code)]
// yolo-heatmap · AGPL-3.0 License - https://www.gnu.org/licenses/agpl-3.0.html
// 检测叠加 + 热力图累积
pub mod config; // 热力图配置参数
pub mod detection; // 检测结果与检测器接口
pub mod heatmap; // 空间累积器 + 着色渲染
pub mod input; // 帧序列输入
pub mod overlay; // 检测框 / FPS / 计数面板绘制
pub mod processor; // 单帧处理编排
pub mod sink; // 视频输出 / 显示
pub mod stats; // 计数统计 + FPS

pub use crate::config::{Args, HeatmapSettings};
pub use crate::detection::{BBox, ClassNames, Detector, ReplayDetector};
pub use crate::heatmap::{HeatmapRenderer, SpatialAccumulator};
pub use crate::overlay::Overlay;
pub use crate::processor::{FrameProcessor, HeatmapProgress};
pub use crate::sink::{Display, FrameSink, ImageSequenceWriter, SnapshotDisplay};
pub use crate::stats::{CountTracker, FpsMeter};

/// 生成时间字符串 (用于输出目录命名)
pub fn gen_time_string(delimiter: &str) -> String {
    let t_now = chrono::Local::now();
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S",
        delimiter, delimiter, delimiter, delimiter, delimiter
    );
    t_now.format(&fmt).to_string()
}
