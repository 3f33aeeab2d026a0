mod config;
mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use config::AppConfig;
use depth_view_adapters::{
    present_metrics, present_saved, present_state, present_turn, DepthMapWriter,
    FolderFrameSource, HttpDepthBackend, ImageCrateCompressor, SavedDepthMap,
};
use depth_view_application::{
    ApplicationError, ApplicationService, AskDepthGptCommand, ChatStateQuery, StartCameraCommand,
    StreamSettings, UploadImageCommand,
};
use depth_view_domain::{
    guess_mime_type, DepthResult, FileUpload, NormalizePolicy, PredictionMessages,
    PredictionState,
};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "depth-view", version, about = "Depth estimation client")]
struct Cli {
    /// Base URL of the depth service; overrides DEPTH_VIEW_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Predict the depth map of one image.
    Upload {
        image: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replay a folder of images as a camera feed.
    Stream {
        folder: PathBuf,
        #[arg(long)]
        interval_ms: Option<u64>,
        #[arg(long, default_value_t = 10)]
        duration_secs: u64,
        #[arg(long)]
        out: Option<PathBuf>,
        /// Send a frame on every tick even while a request is outstanding.
        #[arg(long)]
        no_skip: bool,
    },
    /// Ask DepthGPT about an image, one turn per prompt.
    Chat {
        image: PathBuf,
        #[arg(required = true)]
        prompts: Vec<String>,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CommandError {
    Usage(String),
    Runtime(String),
}

impl From<ApplicationError> for CommandError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Validation(_) | ApplicationError::InvalidInput(_) => {
                Self::Usage(error.to_string())
            }
            other => Self::Runtime(other.to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_logging();
    let cli = Cli::parse();

    let mut config = AppConfig::load();
    if let Some(api_url) = cli.api_url.clone() {
        config.api_url = api_url;
    }

    let result = match build_application_service(&config) {
        Ok(service) => run_command(cli.command, &service, &config).await,
        Err(error) => Err(error),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(CommandError::Usage(msg)) => {
            eprintln!("{msg}");
            ExitCode::from(2)
        }
        Err(CommandError::Runtime(msg)) => {
            eprintln!("{msg}");
            ExitCode::from(1)
        }
    }
}

fn build_application_service(config: &AppConfig) -> Result<ApplicationService, CommandError> {
    let backend = HttpDepthBackend::with_timeout(config.api_url.clone(), config.request_timeout)
        .map_err(|error| CommandError::Runtime(format!("failed to build HTTP client: {error}")))?;

    let mut policy = NormalizePolicy::default();
    policy.compression.offload = config.offload_compression;

    info!(
        api_url = %config.api_url,
        timeout_ms = config.request_timeout.as_millis(),
        "depth service configured"
    );
    Ok(ApplicationService::new(
        Arc::new(backend),
        Arc::new(ImageCrateCompressor),
        policy,
        PredictionMessages::default(),
    ))
}

async fn run_command(
    command: Command,
    service: &ApplicationService,
    config: &AppConfig,
) -> Result<(), CommandError> {
    match command {
        Command::Upload { image, out } => {
            let upload = read_upload(&image).await?;
            let stem = file_stem(&image);
            let state = service.upload_image(UploadImageCommand { upload }).await?;
            println!("{}", present_state(&state));

            match state {
                PredictionState::Succeeded(result) => {
                    let writer = DepthMapWriter::new(output_dir(out, config));
                    let saved = writer.write(&format!("{stem}-depth"), &result.depth_map)?;
                    println!("{}", present_saved(&saved));
                    Ok(())
                }
                PredictionState::Failed(message) => Err(CommandError::Runtime(message)),
                _ => Ok(()),
            }
        }
        Command::Stream {
            folder,
            interval_ms,
            duration_secs,
            out,
            no_skip,
        } => {
            let source = {
                let folder = folder.clone();
                tokio::task::spawn_blocking(move || FolderFrameSource::open(&folder))
                    .await
                    .map_err(|error| CommandError::Runtime(error.to_string()))??
            };
            info!(frames = source.len(), folder = %folder.display(), "replaying folder as camera");

            let settings = StreamSettings {
                interval: interval_ms
                    .map(Duration::from_millis)
                    .unwrap_or(config.capture_interval),
                skip_when_busy: !no_skip,
            };
            let writer = DepthMapWriter::new(output_dir(out, config));
            stream_folder(service, source, settings, &writer, duration_secs).await
        }
        Command::Chat {
            image,
            prompts,
            json,
            out,
        } => {
            let upload = read_upload(&image).await?;
            let stem = file_stem(&image);
            let writer = DepthMapWriter::new(output_dir(out, config));
            let mut last_error = None;

            for prompt in prompts {
                let snapshot = service
                    .ask_depthgpt(AskDepthGptCommand {
                        upload: upload.clone(),
                        prompt,
                    })
                    .await?;

                if !json {
                    for turn in snapshot.transcript.turns().iter().rev().take(2).rev() {
                        println!("{}", present_turn(turn));
                    }
                }
                if let Some(message) = snapshot.state.error() {
                    eprintln!("{message}");
                    last_error = Some(message.to_string());
                }
                if let Some(result) = snapshot.state.result() {
                    for saved in save_chat_images(&writer, &stem, result)? {
                        if !json {
                            println!("{}", present_saved(&saved));
                        }
                    }
                }
            }

            if json {
                let snapshot = service.chat_state(ChatStateQuery);
                let rendered = serde_json::to_string_pretty(&snapshot.transcript)
                    .map_err(|error| CommandError::Runtime(error.to_string()))?;
                println!("{rendered}");
            }

            match last_error {
                Some(message) => Err(CommandError::Runtime(message)),
                None => Ok(()),
            }
        }
    }
}

async fn stream_folder(
    service: &ApplicationService,
    source: FolderFrameSource,
    settings: StreamSettings,
    writer: &DepthMapWriter,
    duration_secs: u64,
) -> Result<(), CommandError> {
    let mut updates = service.subscribe_prediction();
    let capture = service.start_camera(StartCameraCommand { settings }, Box::new(source))?;

    let deadline = tokio::time::sleep(Duration::from_secs(duration_secs));
    tokio::pin!(deadline);
    let mut last_applied = 0;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if snapshot.applied == last_applied {
                    continue;
                }
                last_applied = snapshot.applied;

                match &snapshot.state {
                    PredictionState::Succeeded(result) => {
                        match writer.write(&format!("frame-{:05}", snapshot.applied), &result.depth_map) {
                            Ok(saved) => println!("{}", present_saved(&saved)),
                            Err(error) => warn!(%error, "could not save depth map"),
                        }
                    }
                    state => println!("{}", present_state(state)),
                }
            }
            _ = &mut deadline => {
                info!(duration_secs, "stream duration elapsed");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping capture");
                break;
            }
        }
    }

    let ticks = capture.stop().await?;
    info!(ticks, "capture stopped");
    println!("{}", present_metrics(&service.prediction_metrics()));
    Ok(())
}

/// Writes the depth map and, when the server echoed it, the RGB frame of a
/// DepthGPT answer. Later turns overwrite earlier ones.
fn save_chat_images(
    writer: &DepthMapWriter,
    stem: &str,
    result: &DepthResult,
) -> Result<Vec<SavedDepthMap>, ApplicationError> {
    let mut saved = vec![writer.write(&format!("{stem}-depth"), &result.depth_map)?];
    if let Some(rgb_image) = result.rgb_image.as_deref().filter(|rgb| !rgb.is_empty()) {
        saved.push(writer.write(&format!("{stem}-rgb"), rgb_image)?);
    }
    Ok(saved)
}

async fn read_upload(path: &Path) -> Result<FileUpload, CommandError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|error| CommandError::Usage(format!("cannot read {}: {error}", path.display())))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();

    Ok(FileUpload {
        file_name,
        mime_type: guess_mime_type(path).to_string(),
        bytes,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("image")
        .to_string()
}

fn output_dir(out: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    out.unwrap_or_else(|| PathBuf::from(&config.output_dir))
}
