pub mod calibration;
pub mod fusion;
pub mod protocol;
pub mod types;

use airwrite_config::TransportConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialStream};

/// Failures that keep a session from ever starting.
#[derive(Debug, Error)]
pub enum ImuError {
    #[error("Failed to open serial port {port} at {baud_rate} baud")]
    Open {
        port: String,
        baud_rate: u32,
        #[source]
        source: tokio_serial::Error,
    },
    #[error("Failed to open capture file {path:?}")]
    Capture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Open the board's serial port and drop whatever was queued before we attached.
pub fn open_serial(config: &TransportConfig) -> Result<SerialStream, ImuError> {
    let open_err = |source| ImuError::Open {
        port: config.port.clone(),
        baud_rate: config.baud_rate,
        source,
    };

    tracing::info!(port = %config.port, baud = config.baud_rate, "Opening serial port");
    let stream = tokio_serial::new(&config.port, config.baud_rate)
        .open_native_async()
        .map_err(open_err)?;
    stream.clear(ClearBuffer::Input).map_err(open_err)?;
    tracing::info!(port = %config.port, "Serial port opened");

    Ok(stream)
}

/// Open a recorded stream (one record per line) for replay.
pub async fn open_capture(path: impl AsRef<Path>) -> Result<tokio::fs::File, ImuError> {
    let path = path.as_ref();
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| ImuError::Capture {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!(?path, "Replaying capture");
    Ok(file)
}
