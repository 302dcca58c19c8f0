/// 视频输入系统 (Video Input System)
///
/// - ImageSequenceSource: 图片序列 (按文件名排序的连续帧)
pub mod sequence;

pub use sequence::ImageSequenceSource;
