//! Push-side destination for output frames.

use std::error::Error;
use std::fmt::{Display, Formatter};

use tokio::sync::mpsc;

use crate::{ChatFuture, OutputFrame};

/// The client stopped reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

impl Display for SinkClosed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("output sink closed")
    }
}

impl Error for SinkClosed {}

pub trait FrameSink: Send + Sync {
    fn send<'a>(&'a self, frame: OutputFrame) -> ChatFuture<'a, Result<(), SinkClosed>>;
}

impl FrameSink for mpsc::Sender<OutputFrame> {
    fn send<'a>(&'a self, frame: OutputFrame) -> ChatFuture<'a, Result<(), SinkClosed>> {
        Box::pin(async move { mpsc::Sender::send(self, frame).await.map_err(|_| SinkClosed) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_sink_reports_closed_receiver() {
        let (sender, mut receiver) = mpsc::channel(4);
        FrameSink::send(&sender, OutputFrame::Close)
            .await
            .expect("receiver is open");
        assert_eq!(receiver.recv().await, Some(OutputFrame::Close));

        drop(receiver);
        assert_eq!(
            FrameSink::send(&sender, OutputFrame::data("late")).await,
            Err(SinkClosed)
        );
    }
}
