use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use snap_quiz::clients::{HttpOcrClient, LlmClient};
use snap_quiz::utils::logging;
use snap_quiz::{
    CameraResource, ChannelHandoff, Commit, Config, ExtractionGateway, GenerationGateway,
    PipelineController, StillImageDevice,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(&config);
    logging::log_startup(&config);

    // 第一个参数或 CAMERA_SOURCE 指定的图片充当摄像头
    let source = std::env::args()
        .nth(1)
        .or_else(|| config.camera_source.clone())
        .context("请提供图片路径：snap_quiz <图片> 或设置 CAMERA_SOURCE")?;
    let device = StillImageDevice::open_file(&source)?;
    let camera = CameraResource::new(Arc::new(device)).with_jpeg_quality(config.jpeg_quality);

    let extraction = ExtractionGateway::new(Arc::new(HttpOcrClient::new(&config)?));
    let generation = GenerationGateway::new(Arc::new(LlmClient::new(&config)));
    let (handoff, mut review) = ChannelHandoff::channel();

    let mut controller =
        PipelineController::new(camera, extraction, generation, Arc::new(handoff), &config);

    controller.start_camera().await?;
    controller.capture()?;

    if let Commit::Applied(constraints) = controller.extract_text().await? {
        info!(
            "可选题目数量: {:?} (当前: {})",
            constraints.selectable_counts,
            controller.state().parameters().requested_count
        );
    }

    match controller.generate_questions().await? {
        Commit::Applied(handoff) => {
            if let Some(message) = handoff.warning {
                warn!("{}", message);
            }
        }
        Commit::Stale => warn!("生成结果已过期"),
    }
    controller.shutdown();

    if let Some(payload) = review.recv().await {
        println!("{}", serde_json::to_string_pretty(&payload)?);
    }

    Ok(())
}
