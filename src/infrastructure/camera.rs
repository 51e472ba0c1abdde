//! 摄像头资源 - 基础设施层
//!
//! 唯一持有摄像头流的地方，只暴露"获取 / 拍照 / 释放"三种能力

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CameraError;
use crate::models::CapturedFrame;

/// 摄像头朝向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// 前置
    User,
    /// 后置
    #[default]
    Environment,
}

impl FromStr for Facing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "front" => Ok(Facing::User),
            "environment" | "back" | "rear" => Ok(Facing::Environment),
            other => Err(format!("未知摄像头朝向: {}", other)),
        }
    }
}

/// 平台设备返回的原始错误
#[derive(Debug, Error)]
pub enum DeviceError {
    /// 设备已被其他程序占用
    #[error("设备被占用: {0}")]
    InUse(String),
    /// 用户拒绝授权
    #[error("权限被拒绝: {0}")]
    PermissionDenied(String),
    /// 没有可用设备
    #[error("未找到设备: {0}")]
    NotFound(String),
    #[error("设备错误: {0}")]
    Other(String),
}

impl From<DeviceError> for CameraError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::InUse(reason) => CameraError::Busy(reason),
            other => CameraError::Denied(other.to_string()),
        }
    }
}

/// 平台的摄像头采集能力
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// 请求摄像头访问，成功后返回一路实时预览流
    async fn open(&self, facing: Facing) -> Result<Box<dyn PreviewStream>, DeviceError>;
}

/// 一路已绑定的实时预览流
pub trait PreviewStream: Send {
    /// 当前预览画面；没有可用画面时返回 None
    fn current_frame(&self) -> Option<RgbImage>;

    /// 停止所有轨道
    fn stop(&mut self);
}

/// 已获取的流的标识
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHandle {
    pub id: Uuid,
    pub facing: Facing,
}

struct ActiveStream {
    handle: StreamHandle,
    stream: Box<dyn PreviewStream>,
}

/// 摄像头资源
///
/// 职责：
/// - 独占持有摄像头流，同一时间最多一路
/// - 重新获取前先释放旧流
/// - 每次成功获取恰好对应一次释放（显式释放或 Drop）
pub struct CameraResource {
    device: Arc<dyn CaptureDevice>,
    active: Option<ActiveStream>,
    jpeg_quality: u8,
}

impl CameraResource {
    pub fn new(device: Arc<dyn CaptureDevice>) -> Self {
        Self {
            device,
            active: None,
            jpeg_quality: 90,
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// 获取摄像头并绑定预览
    pub async fn acquire(&mut self, facing: Facing) -> Result<StreamHandle, CameraError> {
        if self.release() {
            debug!("[Camera] 重新获取前已释放旧的流");
        }

        info!("[Camera] 正在请求摄像头访问 ({:?})...", facing);
        match self.device.open(facing).await {
            Ok(stream) => {
                let handle = StreamHandle {
                    id: Uuid::new_v4(),
                    facing,
                };
                self.active = Some(ActiveStream { handle, stream });
                info!("[Camera] ✓ 摄像头已就绪 (流 {})", handle.id);
                Ok(handle)
            }
            Err(e) => {
                warn!("[Camera] ⚠️ 摄像头访问失败: {}", e);
                Err(e.into())
            }
        }
    }

    /// 把当前预览画面编码成 JPEG 静态画面
    pub fn capture(&self) -> Result<CapturedFrame, CameraError> {
        let active = self.active.as_ref().ok_or(CameraError::NotReady)?;
        let image = active.stream.current_frame().ok_or_else(|| {
            warn!("[Camera] 预览流 {} 还没有画面", active.handle.id);
            CameraError::NotReady
        })?;

        let (width, height) = image.dimensions();
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality)
            .encode_image(&image)
            .map_err(|e| {
                warn!("[Camera] ⚠️ JPEG 编码失败: {}", e);
                CameraError::NotReady
            })?;

        let frame = CapturedFrame::new(jpeg, width, height);
        info!("[Camera] ✓ 已拍摄 {}", frame);
        Ok(frame)
    }

    /// 释放摄像头，可重复调用
    ///
    /// 返回本次调用是否真的停止了一路流
    pub fn release(&mut self) -> bool {
        match self.active.take() {
            Some(mut active) => {
                active.stream.stop();
                info!("[Camera] 已释放摄像头流 {}", active.handle.id);
                true
            }
            None => false,
        }
    }

    pub fn is_live(&self) -> bool {
        self.active.is_some()
    }

    pub fn handle(&self) -> Option<StreamHandle> {
        self.active.as_ref().map(|a| a.handle)
    }
}

impl Drop for CameraResource {
    fn drop(&mut self) {
        self.release();
    }
}
