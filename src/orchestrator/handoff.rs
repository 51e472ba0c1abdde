//! 交接目标
//!
//! 生成结果交给下游复核页面后，流水线对本次会话的责任结束

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::PipelineError;
use crate::models::HandoffPayload;

/// 下游接收方（导航目标）
pub trait HandoffTarget: Send + Sync {
    fn deliver(&self, payload: HandoffPayload) -> Result<(), PipelineError>;
}

/// 一次成功交接
#[derive(Debug, Clone, PartialEq)]
pub struct Handoff {
    pub payload: HandoffPayload,
    /// 部分成功时的非致命提示
    pub warning: Option<String>,
}

/// 通过内存通道交接
pub struct ChannelHandoff {
    tx: mpsc::UnboundedSender<HandoffPayload>,
}

impl ChannelHandoff {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HandoffPayload>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl HandoffTarget for ChannelHandoff {
    fn deliver(&self, payload: HandoffPayload) -> Result<(), PipelineError> {
        debug!("[交接] 发送 {} 道题到复核页面", payload.generated_count);
        self.tx
            .send(payload)
            .map_err(|_| PipelineError::handoff_failed("复核页面已关闭"))
    }
}
