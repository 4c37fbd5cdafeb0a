//! Attachment downloader with idempotent-write semantics.
//!
//! A file already present with nonzero size is never re-fetched; that is the
//! pipeline's sole resumption mechanism. Transfers stream to a temp file and
//! rename into place, so an interrupted run never leaves a plausible-looking
//! partial file at the target path.

use std::io::Write;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use indicoharvest_client::IndicoClient;
use indicoharvest_shared::{AttachmentRecord, DownloadOutcome, HarvestError, Result};

/// Downloads attachments through the shared throttled client.
pub struct Downloader<'a> {
    client: &'a IndicoClient,
}

impl<'a> Downloader<'a> {
    pub fn new(client: &'a IndicoClient) -> Self {
        Self { client }
    }

    /// Ensure the attachment exists at `dir/<filename>`.
    ///
    /// Skips when a non-empty file is already there. Errors are returned for
    /// the caller to record; one failed attachment never blocks the next.
    pub async fn fetch(&self, attachment: &AttachmentRecord, dir: &Path) -> Result<DownloadOutcome> {
        let target = dir.join(&attachment.filename);

        if let Ok(meta) = std::fs::metadata(&target) {
            if meta.is_file() && meta.len() > 0 {
                debug!(file = %attachment.filename, "already present, skipping");
                return Ok(DownloadOutcome::SkippedExisting);
            }
        }

        if attachment.download_url.is_empty() {
            return Err(HarvestError::Download(format!(
                "{}: no download URL",
                attachment.filename
            )));
        }

        let url = self.client.resolve(&attachment.download_url)?;
        let response = self.client.get_download(&url).await.map_err(|e| {
            HarvestError::Download(format!("{}: {e}", attachment.filename))
        })?;

        std::fs::create_dir_all(dir).map_err(|e| HarvestError::io(dir, e))?;
        let temp = dir.join(format!(".{}.part", attachment.filename));

        match stream_to_file(response, &temp).await {
            Ok((bytes, sha256)) => {
                std::fs::rename(&temp, &target).map_err(|e| HarvestError::io(&target, e))?;
                info!(file = %attachment.filename, bytes, "downloaded attachment");
                Ok(DownloadOutcome::Downloaded { bytes, sha256 })
            }
            Err(e) => {
                if let Err(cleanup) = std::fs::remove_file(&temp) {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        warn!(temp = %temp.display(), error = %cleanup, "failed to remove partial file");
                    }
                }
                Err(e)
            }
        }
    }
}

/// Stream the response body to `path`, hashing as it goes.
async fn stream_to_file(mut response: reqwest::Response, path: &Path) -> Result<(u64, String)> {
    let mut file = std::fs::File::create(path).map_err(|e| HarvestError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut bytes: u64 = 0;

    loop {
        let chunk = response
            .chunk()
            .await
            .map_err(|e| HarvestError::Download(format!("{}: {e}", path.display())))?;
        let Some(chunk) = chunk else { break };
        file.write_all(&chunk).map_err(|e| HarvestError::io(path, e))?;
        hasher.update(&chunk);
        bytes += chunk.len() as u64;
    }

    file.flush().map_err(|e| HarvestError::io(path, e))?;
    Ok((bytes, format!("{:x}", hasher.finalize())))
}
