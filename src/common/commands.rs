/// Lệnh UI gửi xuống tầng mạng.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// An already serialized, validated JSON frame.
    Transmit(String),
    /// Send a close frame and stop the task.
    Close,
}
