use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Decoded RGBA frame handed from the engine's streaming thread to the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub timestamp: Option<Duration>,
}

impl VideoFrame {
    pub fn is_complete(&self) -> bool {
        self.rgba.len() == (self.width as usize) * (self.height as usize) * 4
    }
}

pub type FrameReceiver = watch::Receiver<Option<Arc<VideoFrame>>>;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Where the engine renders. Only the most recent frame is kept; a slow UI
/// simply skips frames.
#[derive(Debug, Clone)]
pub struct OutputSurface {
    id: u64,
    sender: Arc<watch::Sender<Option<Arc<VideoFrame>>>>,
}

impl OutputSurface {
    pub fn new() -> (Self, FrameReceiver) {
        let (sender, receiver) = watch::channel(None);
        let surface = Self {
            id: NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed),
            sender: Arc::new(sender),
        };
        (surface, receiver)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Called from the engine's streaming thread.
    pub fn present(&self, frame: VideoFrame) {
        self.sender.send_replace(Some(Arc::new(frame)));
    }

    pub fn clear(&self) {
        self.sender.send_replace(None);
    }
}
