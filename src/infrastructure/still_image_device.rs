//! 静态图片设备
//!
//! 用一张图片文件模拟摄像头，方便在没有摄像头的环境里跑完整流程

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::RgbImage;
use tracing::debug;

use crate::infrastructure::camera::{CaptureDevice, DeviceError, Facing, PreviewStream};

/// 以固定图片作为预览画面的设备
///
/// 与真实摄像头一样是独占的：已被打开时再次打开会返回 `InUse`
pub struct StillImageDevice {
    image: RgbImage,
    claimed: Arc<AtomicBool>,
}

impl StillImageDevice {
    pub fn from_image(image: RgbImage) -> Self {
        Self {
            image,
            claimed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 从图片文件加载
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .with_context(|| format!("无法读取图片: {}", path.display()))?
            .to_rgb8();
        debug!(
            "已加载图片 {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self::from_image(image))
    }

    /// 是否有一路流正在占用
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureDevice for StillImageDevice {
    async fn open(&self, facing: Facing) -> Result<Box<dyn PreviewStream>, DeviceError> {
        if self.claimed.swap(true, Ordering::SeqCst) {
            return Err(DeviceError::InUse(
                "图片设备已被另一个会话占用".to_string(),
            ));
        }
        debug!("静态图片设备忽略朝向参数 {:?}", facing);
        Ok(Box::new(StillImageStream {
            image: self.image.clone(),
            claimed: self.claimed.clone(),
            stopped: false,
        }))
    }
}

struct StillImageStream {
    image: RgbImage,
    claimed: Arc<AtomicBool>,
    stopped: bool,
}

impl PreviewStream for StillImageStream {
    fn current_frame(&self) -> Option<RgbImage> {
        if self.stopped {
            None
        } else {
            Some(self.image.clone())
        }
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.claimed.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for StillImageStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> StillImageDevice {
        StillImageDevice::from_image(RgbImage::from_pixel(4, 4, image::Rgb([255, 255, 255])))
    }

    #[tokio::test]
    async fn test_second_open_reports_in_use() {
        let device = device();
        let _stream = device.open(Facing::Environment).await.unwrap();

        assert!(device.is_claimed());
        assert!(matches!(
            device.open(Facing::Environment).await,
            Err(DeviceError::InUse(_))
        ));
    }

    #[tokio::test]
    async fn test_stop_frees_device() {
        let device = device();
        let mut stream = device.open(Facing::User).await.unwrap();
        assert!(stream.current_frame().is_some());

        stream.stop();
        assert!(stream.current_frame().is_none());
        assert!(!device.is_claimed());
        assert!(device.open(Facing::User).await.is_ok());
    }

    #[test]
    fn test_drop_frees_device() {
        let device = device();
        let stream = tokio_test::block_on(device.open(Facing::Environment)).unwrap();
        drop(stream);

        assert!(!device.is_claimed());
    }

    #[test]
    fn test_missing_file() {
        assert!(StillImageDevice::open_file("/definitely/not/here.png").is_err());
    }
}
