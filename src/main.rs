use airwrite_config::{AppConfig, StreamKind};
use airwrite_imu::calibration::GyroBiasCollector;
use airwrite_imu::protocol::{Record, RecordParser};
use airwrite_stroke::pipeline::StrokePipeline;
use airwrite_stroke::StrokeSession;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tracing::{error, info, warn};

/// How often the stroke summary is logged.
const HEARTBEAT: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "airwrite")]
#[command(about = "Draw strokes in the air with a wrist IMU")]
struct Cli {
    /// Without a subcommand, follow the board on the configured serial port.
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Replay a captured sample stream from a file")]
    Replay { path: PathBuf },
    #[command(about = "Measure gyro offsets with the board lying still and save them")]
    Calibrate,
}

/// Follow the board's stroke until Ctrl-C or the stream ends.
///
/// Enter on stdin lifts the pen and starts a new stroke.
async fn run<R>(config: &AppConfig, source: R) -> Result<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut session = StrokeSession::spawn(source, StrokePipeline::new(config));
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut heartbeat = tokio::time::interval(HEARTBEAT);

    info!("Press Enter to start a new stroke, Ctrl-C to quit");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping");
                session.stop();
                break;
            }
            line = stdin.next_line(), if stdin_open => {
                match line {
                    Ok(Some(_)) => session.reset(),
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        warn!(?e, "Failed to read stdin, reset disabled");
                        stdin_open = false;
                    }
                }
            }
            _ = heartbeat.tick() => {
                let frame = session.frame();
                info!(
                    x = frame.cursor.x,
                    y = frame.cursor.y,
                    points = frame.path.len(),
                    state = ?frame.state,
                    "Stroke"
                );
                if session.is_finished() {
                    break;
                }
            }
        }
    }

    let frame = session.finished().await;
    info!(
        x = frame.cursor.x,
        y = frame.cursor.y,
        points = frame.path.len(),
        "Session ended"
    );
    Ok(())
}

/// Average stationary gyro readings and store them as the unit's offsets.
///
/// `config` must be what was read from `path`; it is written back whole.
async fn calibrate<R>(path: &Path, mut config: AppConfig, mut source: R) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    if config.transport.stream != StreamKind::Raw {
        bail!("Calibration needs the raw stream; set transport.stream = \"raw\"");
    }

    info!("Keep the board still");

    let mut parser = RecordParser::new(StreamKind::Raw);
    let mut collector = GyroBiasCollector::default();
    let mut buf = [0u8; 4096];

    let offsets = 'read: loop {
        let n = source.read(&mut buf).await?;
        if n == 0 {
            let (got, target) = collector.progress();
            bail!("Stream ended after {got} of {target} calibration samples");
        }
        parser.push_data(&buf[..n]);
        while let Some(result) = parser.next_record() {
            match result {
                Ok(Record::Raw(sample)) => {
                    if let Some(offsets) = collector.push(sample.gyro) {
                        break 'read offsets;
                    }
                }
                Ok(Record::Quaternion(_)) => {}
                Err(e) => tracing::trace!(%e, "Skipping calibration sample"),
            }
        }
    };

    config.imu.gyro_offsets = offsets.as_vec3();
    airwrite_config::save_config_to(path, &config)?;
    info!(?offsets, "Gyro offsets saved");
    Ok(())
}

fn load_config_or_default() -> AppConfig {
    let config = airwrite_config::load_config().unwrap_or_else(|e| {
        warn!(?e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    info!(
        port = %config.transport.port,
        stream = ?config.transport.stream,
        alpha = config.motion.alpha,
        deadzone = config.motion.deadzone,
        "Config loaded"
    );
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "airwrite=info,airwrite_imu=info,airwrite_stroke=info".into()),
        )
        .init();

    info!("airwrite starting");

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Calibrate) => {
            let path = airwrite_config::config_path()?;
            // The file is rewritten, so a broken one must not be replaced by defaults.
            let config = airwrite_config::load_config_from(&path)?;
            let source = airwrite_imu::open_serial(&config.transport)?;
            calibrate(&path, config, source).await
        }
        Some(Command::Replay { path }) => {
            let config = load_config_or_default();
            let source = airwrite_imu::open_capture(&path).await?;
            run(&config, source).await
        }
        None => {
            let config = load_config_or_default();
            // The device is the only source in live mode; without it there is no session.
            let source = airwrite_imu::open_serial(&config.transport).map_err(|e| {
                error!(error = %e, "Device unavailable");
                e
            })?;
            run(&config, source).await
        }
    }
}
