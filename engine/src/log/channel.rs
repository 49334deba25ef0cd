use crossbeam::channel::{Receiver, Sender, unbounded};
use ::log::{Level, Metadata, Record, SetLoggerError};

/// A single log record captured by the [`ChannelLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub level: Level,
    pub target: String,
    pub message: String,
}

/// A [`log::Log`](::log::Log) implementation that forwards every enabled record over a channel.
///
/// Sending never blocks; records are dropped once the receiver is gone.
pub struct ChannelLogger {
    sender: Sender<LogMessage>,
    level: Level,
}

impl ::log::Log for ChannelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = self.sender.try_send(LogMessage {
                level: record.metadata().level(),
                target: record.target().to_string(),
                message: format!("{}", record.args()),
            });
        }
    }

    fn flush(&self) {}
}

impl ChannelLogger {
    pub fn new(sender: Sender<LogMessage>, level: Level) -> Self {
        Self { sender, level }
    }

    pub fn with_receiver(level: Level) -> (Self, Receiver<LogMessage>) {
        let (sender, receiver) = unbounded();
        (Self::new(sender, level), receiver)
    }
}

/// Install a [`ChannelLogger`] as the global logger, returning the receiving end.
///
/// Fails if a global logger has already been installed for this process.
pub fn init(level: Level) -> Result<Receiver<LogMessage>, SetLoggerError> {
    let (logger, receiver) = ChannelLogger::with_receiver(level);
    ::log::set_boxed_logger(Box::new(logger))?;
    ::log::set_max_level(level.to_level_filter());
    Ok(receiver)
}
