//! 热力图配置 - 命令行参数 + JSON文件

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

/// 配置值: JSON中可以是数字也可以是字符串 (例如 `0.98` 或 `"0.98"`)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Number(v) => write!(f, "{}", v),
            ConfigValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Text(s.to_string())
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Number(v)
    }
}

/// 热力图参数配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapSettings {
    // === 热力图参数 ===
    pub heatmap_decay: ConfigValue,                // 每帧衰减系数, 1 = 不衰减
    pub heatmap_kernel: ConfigValue,               // 平滑核大小 (奇数)
    pub heatmap_video_kernel: Option<ConfigValue>, // 热力图视频专用平滑核, 优先于 heatmap_kernel
    pub raw_trace: bool,                           // 同时保留不衰减的原始轨迹

    // === 检测参数 ===
    pub conf_threshold: f32, // 检测置信度阈值

    // === 输出参数 ===
    pub heatmap_video: bool,   // 写出热力图帧序列
    pub detection_video: bool, // 写出检测标注帧序列
    pub display_every: u32,    // 分屏快照间隔 (帧), 0 = 关闭
}

impl Default for HeatmapSettings {
    fn default() -> Self {
        Self {
            heatmap_decay: ConfigValue::Number(1.0),
            heatmap_kernel: ConfigValue::Number(1.0),
            heatmap_video_kernel: None,
            raw_trace: true,

            conf_threshold: 0.25,

            heatmap_video: true,
            detection_video: true,
            display_every: 1,
        }
    }
}

impl HeatmapSettings {
    /// 从JSON文件加载配置
    ///
    /// 文件不存在或解析失败时使用默认值, 不会中断启动
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => {
                    log::info!("✅ 配置已从 {} 加载", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("⚠️  配置文件解析失败: {}, 使用默认值", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("📝 配置文件 {} 不存在, 使用默认配置", path.display());
                Self::default()
            }
        }
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        log::info!("🎛️  当前热力图配置:");
        log::info!("  衰减系数: {}", self.heatmap_decay);
        log::info!("  平滑核: {}", self.heatmap_kernel);
        if let Some(k) = &self.heatmap_video_kernel {
            log::info!("  视频平滑核: {}", k);
        }
        log::info!("  原始轨迹: {}", self.raw_trace);
        log::info!("  检测置信度: {:.2}", self.conf_threshold);
    }
}

/// 命令行参数
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "检测叠加 + 热力图累积", long_about = None)]
pub struct Args {
    /// 输入帧目录 (按文件名排序的图片序列)
    #[arg(short, long)]
    pub source: PathBuf,

    /// 检测结果 (JSON Lines, 每行一帧)
    #[arg(short, long)]
    pub detections: PathBuf,

    /// 类别名称表 (JSON: {"0": "person", ...}), 缺省使用COCO
    #[arg(long)]
    pub names: Option<PathBuf>,

    /// 标签字体 (TTF/OTF), 缺省时只画框不写字
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// 输出根目录
    #[arg(short, long, default_value = "runs/heatmap")]
    pub output: PathBuf,

    /// JSON配置文件, 命令行参数优先
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 每帧衰减系数 (0,1], 无法解析时视为 1 (不衰减)
    #[arg(long)]
    pub heatmap_decay: Option<String>,

    /// 平滑核大小
    #[arg(long)]
    pub heatmap_kernel: Option<String>,

    /// 热力图视频专用平滑核
    #[arg(long)]
    pub heatmap_video_kernel: Option<String>,

    /// 检测置信度阈值
    #[arg(long)]
    pub conf: Option<f32>,

    /// 不写热力图帧序列
    #[arg(long, default_value_t = false)]
    pub no_heatmap_video: bool,

    /// 不写检测标注帧序列
    #[arg(long, default_value_t = false)]
    pub no_detection_video: bool,

    /// 不保留原始 (不衰减) 轨迹
    #[arg(long, default_value_t = false)]
    pub no_raw_trace: bool,

    /// 分屏快照间隔 (帧), 0 = 关闭
    #[arg(long)]
    pub display_every: Option<u32>,

    /// 最多处理帧数
    #[arg(long)]
    pub max_frames: Option<usize>,
}

impl Args {
    /// 合并配置文件与命令行参数
    pub fn settings(&self) -> HeatmapSettings {
        let mut settings = match &self.config {
            Some(path) => HeatmapSettings::load(path),
            None => HeatmapSettings::default(),
        };

        if let Some(decay) = &self.heatmap_decay {
            settings.heatmap_decay = decay.as_str().into();
        }
        if let Some(kernel) = &self.heatmap_kernel {
            settings.heatmap_kernel = kernel.as_str().into();
        }
        if let Some(kernel) = &self.heatmap_video_kernel {
            settings.heatmap_video_kernel = Some(kernel.as_str().into());
        }
        if let Some(conf) = self.conf {
            settings.conf_threshold = conf;
        }
        if let Some(every) = self.display_every {
            settings.display_every = every;
        }
        if self.no_heatmap_video {
            settings.heatmap_video = false;
        }
        if self.no_detection_video {
            settings.detection_video = false;
        }
        if self.no_raw_trace {
            settings.raw_trace = false;
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = HeatmapSettings::default();
        assert_eq!(settings.heatmap_decay, ConfigValue::Number(1.0));
        assert!(settings.heatmap_video_kernel.is_none());
        assert!(settings.raw_trace);
    }

    #[test]
    fn test_config_value_accepts_number_or_string() {
        let settings: HeatmapSettings =
            serde_json::from_str(r#"{"heatmap_decay": "0.9", "heatmap_kernel": 7}"#).unwrap();
        assert_eq!(settings.heatmap_decay.to_string(), "0.9");
        assert_eq!(settings.heatmap_kernel.to_string(), "7");
        // 未给出的字段取默认值
        assert_eq!(settings.display_every, 1);
    }

    #[test]
    fn test_cli_overrides_file() {
        let args = Args::parse_from([
            "heatmap",
            "--source",
            "frames",
            "--detections",
            "dets.jsonl",
            "--heatmap-decay",
            "abc",
            "--heatmap-video-kernel",
            "9",
            "--no-raw-trace",
        ]);
        let settings = args.settings();
        assert_eq!(settings.heatmap_decay.to_string(), "abc");
        assert_eq!(
            settings.heatmap_video_kernel.map(|k| k.to_string()),
            Some("9".to_string())
        );
        assert!(!settings.raw_trace);
        assert!(settings.heatmap_video);
    }
}
