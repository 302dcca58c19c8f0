/// 检测系统 (Detection System)
///
/// - Detector:   检测器接口 + 离线结果回放
/// - ClassNames: 类别名称表
/// - BBox:       检测框
pub mod detector;
pub mod names;
pub mod types;

pub use detector::{Detector, ReplayDetector};
pub use names::ClassNames;
pub use types::BBox;
