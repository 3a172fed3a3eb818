//! Normalization of uploaded documents to PDF.
//!
//! DOCX and ODT inputs are converted through LibreOffice in a scratch
//! directory; PDF inputs only get a well-formedness check. One attempt,
//! no retry; retries belong to the caller.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::detect::FileFormat;
use crate::error::EngineError;

/// Hard wall-clock bound for a single conversion attempt.
pub const CONVERT_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between liveness polls of the converter child process.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// External document-to-PDF conversion.
///
/// Narrow seam so tests can substitute a deterministic fake instead of
/// spawning real processes.
pub trait Converter: Send + Sync {
    /// Convert `input` into a PDF inside `out_dir`, returning the path
    /// of the produced file. Must terminate the underlying work when
    /// `timeout` expires and report `ConversionTimeout`.
    fn convert(
        &self,
        input: &Path,
        out_dir: &Path,
        timeout: Duration,
    ) -> Result<PathBuf, EngineError>;
}

/// Converts via the `soffice` binary (LibreOffice headless mode).
pub struct LibreOfficeConverter {
    binary: String,
}

impl LibreOfficeConverter {
    pub fn new() -> Self {
        Self::with_binary("soffice")
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for LibreOfficeConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for LibreOfficeConverter {
    fn convert(
        &self,
        input: &Path,
        out_dir: &Path,
        timeout: Duration,
    ) -> Result<PathBuf, EngineError> {
        let mut child = Command::new(&self.binary)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg(input)
            .arg("--outdir")
            .arg(out_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => EngineError::ConverterUnavailable(format!(
                    "'{}' not found in PATH",
                    self.binary
                )),
                _ => EngineError::ConverterUnavailable(e.to_string()),
            })?;

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    // The process must never be left running past the bound.
                    child.kill().ok();
                    child.wait().ok();
                    return Err(EngineError::ConversionTimeout(timeout.as_secs()));
                }
                None => std::thread::sleep(POLL_INTERVAL),
            }
        };

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                pipe.read_to_string(&mut stderr).ok();
            }
            return Err(EngineError::ConversionFailed(format!(
                "{}: {}",
                status,
                stderr.trim()
            )));
        }

        let output = output_path(input, out_dir);
        match std::fs::metadata(&output) {
            Ok(meta) if meta.len() > 0 => Ok(output),
            _ => Err(EngineError::ConversionVerificationFailed),
        }
    }
}

/// LibreOffice names the output after the input stem.
fn output_path(input: &Path, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    out_dir.join(format!("{stem}.pdf"))
}

/// Normalize a document of the given format to PDF bytes.
///
/// PDF input is checked for well-formedness (`CorruptDocument` on
/// failure); other formats go through the converter and the produced
/// PDF is then verified (`ConversionFailed` if the converter emitted a
/// malformed file).
pub fn normalize_to_pdf(
    converter: &dyn Converter,
    bytes: &[u8],
    format: FileFormat,
) -> Result<Vec<u8>, EngineError> {
    match format {
        FileFormat::Pdf => {
            check_pdf(bytes)?;
            Ok(bytes.to_vec())
        }
        FileFormat::Docx | FileFormat::Odt => {
            let scratch = tempfile::tempdir()?;
            let input = scratch.path().join(format!("input.{}", format.as_str()));
            std::fs::write(&input, bytes)?;

            let output = converter.convert(&input, scratch.path(), CONVERT_TIMEOUT)?;
            let pdf = std::fs::read(&output)?;
            if pdf.is_empty() {
                return Err(EngineError::ConversionVerificationFailed);
            }
            check_pdf(&pdf).map_err(|e| {
                EngineError::ConversionFailed(format!("converter produced malformed PDF: {e}"))
            })?;

            debug!(
                from = format.as_str(),
                pdf_bytes = pdf.len(),
                "converted document to pdf"
            );
            Ok(pdf)
        }
    }
}

fn check_pdf(bytes: &[u8]) -> Result<(), EngineError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| EngineError::CorruptDocument(e.to_string()))?;
    if doc.get_pages().is_empty() {
        return Err(EngineError::CorruptDocument("PDF has no pages".to_string()));
    }
    Ok(())
}
