use tokio::sync::mpsc;

use crate::session::render::DisplayRecord;

/// Nhận bản ghi đã render từ tầng mạng, theo đúng thứ tự đến.
pub trait RenderSink: Send {
    fn append(&mut self, record: DisplayRecord);
}

impl<F> RenderSink for F
where
    F: FnMut(DisplayRecord) + Send,
{
    fn append(&mut self, record: DisplayRecord) {
        self(record)
    }
}

/// Forwards records to a UI that drains them on its own schedule.
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<DisplayRecord>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::UnboundedSender<DisplayRecord>) -> Self {
        Self { sender }
    }
}

impl RenderSink for ChannelSink {
    fn append(&mut self, record: DisplayRecord) {
        if self.sender.send(record).is_err() {
            log::warn!("Presentation layer is gone; dropping rendered record");
        }
    }
}
