// src/services/ytdlp.rs

//! yt-dlp extraction engine.
//!
//! Runs the `yt-dlp` executable as a child process. `probe` asks for the
//! info JSON only; `fetch` downloads the probed format into the scratch
//! directory and prints the final file path.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tokio::process::Command;
use url::Url;

use crate::models::{ExtractorConfig, MediaMetadata};
use crate::services::extractor::{ExtractionError, MediaExtractor, locate_scratch_file};

/// Output template inside the per-request scratch directory.
const OUTPUT_TEMPLATE: &str = "media.%(ext)s";

/// Substrings (lowercase) meaning the engine cannot handle the source.
const UNSUPPORTED_MARKERS: &[&str] = &[
    "unsupported url",
    "is not a valid url",
    "video unavailable",
    "private video",
    "has been removed",
    "this video is not available",
    "no video formats found",
    "requested format is not available",
    "sign in to confirm",
    "not available in your country",
];

/// Substrings (lowercase) meaning the source could not be reached.
const UNREACHABLE_MARKERS: &[&str] = &[
    "unable to download webpage",
    "failed to resolve",
    "name or service not known",
    "temporary failure in name resolution",
    "nodename nor servname",
    "getaddrinfo failed",
    "no address associated with hostname",
    "connection refused",
    "connection reset",
    "network is unreachable",
    "timed out",
];

/// `HTTP Error 404: Not Found` in lowercased stderr.
static HTTP_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http error (\d{3})").expect("HTTP_STATUS pattern"));

/// `ERROR: [extractor] ` prefix on yt-dlp diagnostics.
static ERROR_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ERROR:\s*(\[[^\]]*\]\s*)?").expect("ERROR_PREFIX pattern")
});

/// Fields of the yt-dlp info JSON this crate cares about.
#[derive(Debug, Deserialize)]
struct ProbeInfo {
    #[serde(default, rename = "_type")]
    kind: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    format_id: Option<String>,
    #[serde(default)]
    format: Option<String>,
}

/// Extraction engine backed by the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    binary: String,
    format: String,
    socket_timeout_secs: u64,
    extra_args: Vec<String>,
}

impl YtDlpExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            format: config.format.clone(),
            socket_timeout_secs: config.socket_timeout_secs,
            extra_args: config.extra_args.clone(),
        }
    }

    /// Report the engine version (`yt-dlp --version`).
    pub async fn version(&self) -> Result<String, ExtractionError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--version");
        let output = self.run(cmd).await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Command with the flags shared by every invocation.
    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--no-playlist").arg("--no-warnings");
        if self.socket_timeout_secs > 0 {
            cmd.arg("--socket-timeout")
                .arg(self.socket_timeout_secs.to_string());
        }
        cmd.args(&self.extra_args);
        cmd
    }

    /// Run a command to completion and map failures.
    async fn run(&self, mut cmd: Command) -> Result<Output, ExtractionError> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExtractionError::engine(format!(
                    "extraction engine '{}' not found",
                    self.binary
                ))
            } else {
                ExtractionError::engine(format!("failed to run '{}': {e}", self.binary))
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::debug!("{} exited with {}: {}", self.binary, output.status, stderr.trim());
            return Err(classify_failure(&stderr, &output.status.to_string()));
        }

        Ok(output)
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn probe(&self, url: &Url) -> Result<MediaMetadata, ExtractionError> {
        let mut cmd = self.base_command();
        cmd.arg("--dump-single-json")
            .arg("-f")
            .arg(&self.format)
            .arg("--")
            .arg(url.as_str());

        let output = self.run(cmd).await?;
        parse_probe_output(&output.stdout)
    }

    async fn fetch(
        &self,
        url: &Url,
        metadata: &MediaMetadata,
        scratch_dir: &Path,
    ) -> Result<PathBuf, ExtractionError> {
        let format = if metadata.raw_format_hint.trim().is_empty() {
            self.format.as_str()
        } else {
            metadata.raw_format_hint.as_str()
        };

        let mut cmd = self.base_command();
        cmd.arg("--no-progress")
            .arg("-f")
            .arg(format)
            .arg("-o")
            .arg(scratch_dir.join(OUTPUT_TEMPLATE))
            .arg("--print")
            .arg("after_move:filepath")
            .arg("--")
            .arg(url.as_str());

        let output = self.run(cmd).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let reported = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(PathBuf::from);

        locate_scratch_file(scratch_dir, reported.as_deref()).await
    }
}

/// Turn `--dump-single-json` output into metadata.
fn parse_probe_output(stdout: &[u8]) -> Result<MediaMetadata, ExtractionError> {
    let info: ProbeInfo = serde_json::from_slice(stdout)
        .map_err(|e| ExtractionError::engine(format!("unreadable engine output: {e}")))?;

    if info.kind.as_deref() == Some("playlist") {
        return Err(ExtractionError::unsupported(
            "playlists are not supported, pass a single media URL",
        ));
    }

    let extension = info
        .ext
        .filter(|ext| !ext.trim().is_empty())
        .ok_or_else(|| ExtractionError::engine("engine output has no file extension"))?;

    let title = info
        .title
        .filter(|t| !t.trim().is_empty())
        .or(info.id)
        .unwrap_or_else(|| "media".to_string());

    let raw_format_hint = info.format_id.or(info.format).unwrap_or_default();

    Ok(MediaMetadata {
        title,
        extension,
        raw_format_hint,
    })
}

/// Map a failed run to an error kind using its stderr.
fn classify_failure(stderr: &str, status: &str) -> ExtractionError {
    let message = diagnostic_line(stderr).unwrap_or_else(|| format!("engine exited with {status}"));
    let lower = stderr.to_lowercase();

    if let Some(code) = http_status(&lower) {
        return if (400..500).contains(&code) {
            ExtractionError::unsupported(message)
        } else {
            ExtractionError::unreachable(message)
        };
    }
    if UNSUPPORTED_MARKERS.iter().any(|m| lower.contains(m)) {
        return ExtractionError::unsupported(message);
    }
    if UNREACHABLE_MARKERS.iter().any(|m| lower.contains(m)) {
        return ExtractionError::unreachable(message);
    }
    ExtractionError::engine(message)
}

/// `HTTP Error 404: Not Found` -> 404
fn http_status(stderr_lower: &str) -> Option<u16> {
    HTTP_STATUS.captures(stderr_lower)?.get(1)?.as_str().parse().ok()
}

/// Pick the most useful stderr line and strip yt-dlp's prefixes.
fn diagnostic_line(stderr: &str) -> Option<String> {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let line = lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())?;

    let cleaned = ERROR_PREFIX.replace(line, "").trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
