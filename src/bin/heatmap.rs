/// 检测叠加 + 热力图累积
///
/// 流程:
/// 1. 读取图片序列帧
/// 2. 回放检测结果, 绘制检测框 / 计数 / FPS
/// 3. 累积检测中心点热力图 (可衰减), 写出热力图帧序列与分屏快照
/// 4. 结束时导出最终热力图与统计摘要
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use yolo_heatmap::detection::{ClassNames, ReplayDetector};
use yolo_heatmap::heatmap::{colorize, SpatialAccumulator};
use yolo_heatmap::input::ImageSequenceSource;
use yolo_heatmap::{
    gen_time_string, Args, FrameProcessor, HeatmapProgress, ImageSequenceWriter, Overlay,
    SnapshotDisplay,
};

/// 统计摘要 (summary.json)
#[derive(Serialize)]
struct Summary {
    frames_total: usize,
    frames_processed: u64,
    heatmap_frames_written: u64,
    heatmap_write_failed: bool,
    average_count: f64,
    max_count: usize,
    peak_heat: f32,
    decay: f32,
    kernel: u32,
    width: u32,
    height: u32,
}

fn save_heatmap(path: &Path, grid: &ndarray::Array2<f32>, kernel: u32) -> Result<()> {
    colorize(grid, kernel)
        .save(path)
        .with_context(|| format!("保存热力图失败: {}", path.display()))?;
    log::info!("🔥 热力图已保存: {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = args.settings();
    settings.print_summary();

    // ========== 输入 ==========
    let mut source = ImageSequenceSource::open(&args.source)?;
    if source.is_empty() {
        anyhow::bail!("输入为空: {}", args.source.display());
    }
    let total = source.len();
    let Some(first) = source.next() else {
        anyhow::bail!("输入为空: {}", args.source.display());
    };
    let first = first?;
    let (w, h) = first.dimensions();
    log::info!("🎞️ 输入: {} 帧 ({}x{})", total, w, h);

    let names = match &args.names {
        Some(path) => ClassNames::load(path)?,
        None => ClassNames::coco(),
    };
    if names.is_empty() {
        log::warn!("⚠️ 类别表为空, 标签将显示为 id<k>");
    } else {
        log::info!("🏷️ 类别数: {}", names.len());
    }
    let detector = ReplayDetector::open(&args.detections, names, settings.conf_threshold)?;

    // ========== 输出 ==========
    let out_dir = args.output.join(gen_time_string("-"));
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("创建输出目录失败: {}", out_dir.display()))?;
    log::info!("📂 输出目录: {}", out_dir.display());
    settings.save(&out_dir.join("settings.json"))?;

    let accumulator = if settings.raw_trace {
        SpatialAccumulator::with_raw_trace(w, h)
    } else {
        SpatialAccumulator::new(w, h)
    };
    let mut processor = FrameProcessor::new(
        Box::new(detector),
        Overlay::load(args.font.as_deref()),
        accumulator,
        settings.clone(),
    );
    if settings.heatmap_video {
        let writer =
            ImageSequenceWriter::create(&out_dir.join("heatmap"), "heatmap")?.with_size(w, h);
        processor = processor.with_heatmap_sink(Box::new(writer));
    }
    if settings.detection_video {
        let writer =
            ImageSequenceWriter::create(&out_dir.join("detections"), "det")?.with_size(w, h);
        processor = processor.with_detection_sink(Box::new(writer));
    }
    if settings.display_every > 0 {
        let display =
            SnapshotDisplay::new(out_dir.join("split_view.png"), settings.display_every);
        processor = processor.with_display(Box::new(display));
    }

    log::info!(
        "✅ 系统就绪 ({}x{}, 衰减 {}, 平滑核 {}), 开始处理...",
        w,
        h,
        processor.decay(),
        processor.kernel()
    );

    // ========== 主循环 ==========
    let max_frames = args.max_frames.unwrap_or(usize::MAX);
    let mut progress = HeatmapProgress::default();
    for frame in std::iter::once(Ok(first)).chain(source).take(max_frames) {
        let mut frame = frame?;
        progress = processor.process_frame(&mut frame, progress)?;
        let processed = processor.counter().frames();
        if processed % 100 == 0 {
            log::info!(
                "🎞️ 已处理 {}/{} 帧, 当前 {} / 平均 {:.1} / 最大 {}",
                processed,
                total,
                processor.counter().current(),
                processor.counter().average(),
                processor.counter().max_count()
            );
        }
    }
    processor.finish();

    // ========== 导出 ==========
    let kernel = processor.kernel();
    save_heatmap(
        &out_dir.join("heatmap_final.png"),
        processor.accumulator().grid(),
        kernel,
    )?;
    if let Some(raw) = processor.accumulator().raw_grid() {
        save_heatmap(&out_dir.join("heatmap_raw.png"), raw, kernel)?;
    }

    let summary = Summary {
        frames_total: total,
        frames_processed: processor.counter().frames(),
        heatmap_frames_written: progress.frames_written,
        heatmap_write_failed: progress.warned,
        average_count: processor.counter().average(),
        max_count: processor.counter().max_count(),
        peak_heat: processor.accumulator().max(),
        decay: processor.decay(),
        kernel,
        width: w,
        height: h,
    };
    let summary_path = out_dir.join("summary.json");
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("写入统计摘要失败: {}", summary_path.display()))?;

    log::info!(
        "🏁 完成: {} 帧, 热力图帧 {}, 平均 {:.1} / 最大 {}",
        summary.frames_processed,
        progress.frames_written,
        summary.average_count,
        summary.max_count
    );
    Ok(())
}
