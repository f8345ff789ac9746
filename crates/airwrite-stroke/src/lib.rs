pub mod accumulator;
pub mod conditioner;
pub mod euler;
pub mod motion;
pub mod pipeline;
pub mod types;

use airwrite_imu::protocol::RecordParser;
use glam::Vec2;
use pipeline::StrokePipeline;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, watch};
use types::StrokeFrame;

/// Commands sent to the stroke processing task.
enum SessionCommand {
    Reset,
}

/// Handle to a running stroke session.
///
/// A background task reads the sample stream, runs every line through the
/// pipeline and publishes the latest `StrokeFrame`. Readers never touch the
/// pipeline; they get snapshots through a watch channel.
pub struct StrokeSession {
    frame_rx: watch::Receiver<StrokeFrame>,
    command_tx: mpsc::UnboundedSender<SessionCommand>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl StrokeSession {
    /// Start processing `source` on a new task.
    pub fn spawn<R>(source: R, pipeline: StrokePipeline) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (frame_tx, frame_rx) = watch::channel(pipeline.frame());
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(stroke_read_loop(source, pipeline, frame_tx, command_rx));

        Self {
            frame_rx,
            command_tx,
            task: Some(task),
        }
    }

    /// Latest published frame (non-blocking).
    pub fn frame(&self) -> StrokeFrame {
        self.frame_rx.borrow().clone()
    }

    pub fn cursor(&self) -> Vec2 {
        self.frame_rx.borrow().cursor
    }

    pub fn current_path(&self) -> Vec<Vec2> {
        self.frame_rx.borrow().path.clone()
    }

    /// Receiver that wakes on every new frame.
    pub fn subscribe(&self) -> watch::Receiver<StrokeFrame> {
        self.frame_rx.clone()
    }

    /// Start a new stroke.
    pub fn reset(&self) {
        let _ = self.command_tx.send(SessionCommand::Reset);
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Wait for the source to end, then return the final frame.
    pub async fn finished(&mut self) -> StrokeFrame {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::error!(?e, "Stroke task failed");
                }
            }
        }
        self.frame()
    }

    /// Stop ingesting samples. The last frame stays readable.
    pub fn stop(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl Drop for StrokeSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Background task: read lines, run the pipeline, publish frames.
async fn stroke_read_loop<R>(
    mut source: R,
    mut pipeline: StrokePipeline,
    frame_tx: watch::Sender<StrokeFrame>,
    mut command_rx: mpsc::UnboundedReceiver<SessionCommand>,
) where
    R: AsyncRead + Unpin,
{
    let mut parser = RecordParser::new(pipeline.stream_kind());
    let mut buf = [0u8; 4096];

    loop {
        tokio::select! {
            result = source.read(&mut buf) => {
                match result {
                    Ok(0) => {
                        let (samples, skipped) = pipeline.counts();
                        tracing::warn!(samples, skipped, "Sample stream closed");
                        break;
                    }
                    Ok(n) => {
                        parser.push_data(&buf[..n]);

                        // Drain all complete lines, publish once.
                        let mut advanced = false;
                        while let Some(result) = parser.next_record() {
                            match result {
                                Ok(record) => {
                                    pipeline.push_record(record);
                                    advanced = true;
                                }
                                Err(e) => pipeline.skip(&e),
                            }
                        }
                        if advanced {
                            let _ = frame_tx.send(pipeline.frame());
                        }
                    }
                    Err(e) => {
                        tracing::error!(?e, "Sample stream read error");
                        break;
                    }
                }
            }
            Some(cmd) = command_rx.recv() => {
                match cmd {
                    SessionCommand::Reset => {
                        pipeline.reset();
                        let _ = frame_tx.send(pipeline.frame());
                    }
                }
            }
        }
    }
}
