//! The `sortbin models` command for managing the CLIP model files.

use clap::{Args, Subcommand};
use sortbin_core::classifier::{TEXT_MODEL_FILENAME, TOKENIZER_FILENAME, VISION_MODEL_FILENAME};
use sortbin_core::Config;
use std::path::{Path, PathBuf};

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download the CLIP vision encoder, text encoder and tokenizer
    Download {
        /// Re-download files that already exist
        #[arg(long)]
        force: bool,
    },

    /// List installed model files and verify their checksums
    List,

    /// Show model directory path
    Path,
}

/// One file of the ONNX export on Hugging Face.
struct ModelFile {
    remote_path: &'static str,
    local_name: &'static str,
    label: &'static str,
}

/// Hugging Face repository holding the ONNX export of CLIP ViT-L/14.
const CLIP_REPO: &str = "Xenova/clip-vit-large-patch14";

const MODEL_FILES: &[ModelFile] = &[
    ModelFile {
        remote_path: "onnx/vision_model.onnx",
        local_name: VISION_MODEL_FILENAME,
        label: "Vision encoder",
    },
    ModelFile {
        remote_path: "onnx/text_model.onnx",
        local_name: TEXT_MODEL_FILENAME,
        label: "Text encoder",
    },
    ModelFile {
        remote_path: "tokenizer.json",
        local_name: TOKENIZER_FILENAME,
        label: "Tokenizer",
    },
];

/// State of a model file on disk.
#[derive(Debug, PartialEq, Eq)]
enum FileStatus {
    Missing,
    /// Present, no recorded checksum to compare against
    Unverified,
    Ready,
    Corrupt,
}

impl FileStatus {
    fn label(&self) -> &'static str {
        match self {
            FileStatus::Missing => "not installed",
            FileStatus::Unverified => "present (unverified)",
            FileStatus::Ready => "ready",
            FileStatus::Corrupt => "CHECKSUM MISMATCH",
        }
    }
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: &Config) -> anyhow::Result<()> {
    let model_path = config.model_path();

    match args.command {
        ModelsCommand::Download { force } => {
            std::fs::create_dir_all(&model_path)?;
            let client = reqwest::Client::new();

            for file in MODEL_FILES {
                let dest = model_path.join(file.local_name);
                if dest.exists() && !force {
                    tracing::info!("{} already exists at {:?}", file.label, dest);
                    continue;
                }

                let url = format!(
                    "https://huggingface.co/{}/resolve/main/{}",
                    CLIP_REPO, file.remote_path
                );
                tracing::info!("Downloading {}...", file.label);
                tracing::info!("  Source: {}", url);
                tracing::info!("  Destination: {:?}", dest);

                download_file(&client, &url, &dest).await?;
                let digest = record_checksum(&dest)?;

                let file_size = std::fs::metadata(&dest)?.len();
                tracing::info!(
                    "  {} complete ({:.1} MB, blake3 {}…)",
                    file.label,
                    file_size as f64 / (1024.0 * 1024.0),
                    &digest[..16]
                );
            }

            tracing::info!("All downloads complete.");
        }

        ModelsCommand::List => {
            if !model_path.exists() {
                println!("No models installed.");
                println!("Run `sortbin models download` to download required models.");
                return Ok(());
            }

            println!("Model: {} ({})", config.model.model, CLIP_REPO);
            println!("  Directory: {}\n", model_path.display());

            let mut all_ready = true;
            for file in MODEL_FILES {
                let status = file_status(&model_path.join(file.local_name))?;
                all_ready &= matches!(status, FileStatus::Ready | FileStatus::Unverified);
                println!("    - {:24} {}", file.local_name, status.label());
            }

            if !all_ready {
                println!("\nRun `sortbin models download --force` to repair.");
            }
        }

        ModelsCommand::Path => {
            println!("{}", model_path.display());
        }
    }

    Ok(())
}

/// Download a file from a URL to a local path, streaming to disk with a progress bar.
///
/// Writes to a `.part` file first so an interrupted download never looks installed.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let progress = create_progress_bar(response.content_length());
    let partial = partial_path(dest);
    let mut file = tokio::fs::File::create(&partial).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        progress.inc(chunk.len() as u64);
    }

    file.flush().await?;
    drop(file);
    progress.finish_and_clear();

    tokio::fs::rename(&partial, dest).await?;
    Ok(())
}

fn create_progress_bar(total: Option<u64>) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let Some(total) = total else {
        return ProgressBar::new_spinner();
    };

    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%)",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn checksum_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".blake3");
    PathBuf::from(name)
}

/// BLAKE3 hex digest of a file, streamed.
fn content_hash(path: &Path) -> std::io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    let mut file = std::fs::File::open(path)?;
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// Hash a freshly downloaded file and store the digest next to it.
fn record_checksum(path: &Path) -> anyhow::Result<String> {
    let digest = content_hash(path)?;
    std::fs::write(checksum_path(path), format!("{digest}\n"))?;
    Ok(digest)
}

/// Compare a file against the digest recorded when it was downloaded.
fn file_status(path: &Path) -> anyhow::Result<FileStatus> {
    if !path.exists() {
        return Ok(FileStatus::Missing);
    }
    let Ok(recorded) = std::fs::read_to_string(checksum_path(path)) else {
        return Ok(FileStatus::Unverified);
    };
    if content_hash(path)? == recorded.trim() {
        Ok(FileStatus::Ready)
    } else {
        Ok(FileStatus::Corrupt)
    }
}
