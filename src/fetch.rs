//! Streaming download of remote snapshots with coarse progress reporting.
//!
//! The fetcher owns no skip policy: callers decide whether a download is
//! needed before calling [`fetch`]. What the fetcher does guarantee is that
//! a failed transfer leaves no partial file behind.

use reqwest::Client;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::Result;
use crate::shapefile::remove_if_exists;

/// Tracks the last reported download percentage so progress is only logged
/// at coarse increments.
#[derive(Debug)]
pub struct Progress {
    last_reported: i64,
}

impl Progress {
    const STEP: i64 = 10;

    pub fn new() -> Self {
        Self { last_reported: -1 }
    }

    /// Percentage to report now, if the transfer advanced enough.
    ///
    /// Reports are monotonic, at least [`Self::STEP`] points apart, capped at
    /// 100, and suppressed entirely when the total size is unknown.
    pub fn update(&mut self, downloaded: u64, total: u64) -> Option<u8> {
        if total == 0 {
            return None;
        }
        let percent = ((downloaded.saturating_mul(100) / total) as i64).min(100);
        let completed = percent == 100 && self.last_reported != 100;
        if percent - self.last_reported >= Self::STEP || completed {
            self.last_reported = percent;
            Some(percent as u8)
        } else {
            None
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

/// Download `url` to `local_path`, reporting progress at coarse increments.
///
/// The parent directory of `local_path` must already exist. On any transport
/// or write failure the partially written file is deleted before the error
/// is propagated, so no silent partial state remains on disk.
pub async fn fetch(client: &Client, url: &str, local_path: &Path) -> Result<u64> {
    info!("Downloading {} to {}", url, local_path.display());
    match stream_to_file(client, url, local_path).await {
        Ok(bytes) => {
            info!("Download complete: {}", local_path.display());
            Ok(bytes)
        }
        Err(err) => {
            if let Err(cleanup) = remove_if_exists(local_path) {
                warn!(
                    "Failed to clean up partial download {}: {}",
                    local_path.display(),
                    cleanup
                );
            }
            Err(err)
        }
    }
}

async fn stream_to_file(client: &Client, url: &str, local_path: &Path) -> Result<u64> {
    let mut response = client.get(url).send().await?.error_for_status()?;
    let total = response.content_length().unwrap_or(0);

    let mut file = tokio::fs::File::create(local_path).await?;
    let mut progress = Progress::new();
    let mut downloaded: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        if let Some(percent) = progress.update(downloaded, total) {
            info!("{}: {}% complete", local_path.display(), percent);
        }
    }
    file.flush().await?;
    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_progress_reports_in_ten_point_steps() {
        let mut progress = Progress::new();
        assert_eq!(progress.update(0, 1000), None);
        assert_eq!(progress.update(120, 1000), Some(12));
        // Less than ten points since the last report
        assert_eq!(progress.update(190, 1000), None);
        assert_eq!(progress.update(500, 1000), Some(50));
        assert_eq!(progress.update(1000, 1000), Some(100));
        // 100 is reported once
        assert_eq!(progress.update(1000, 1000), None);
    }

    #[test]
    fn test_progress_is_capped_at_100() {
        let mut progress = Progress::new();
        // More bytes than announced must not report past 100
        assert_eq!(progress.update(2000, 1000), Some(100));
    }

    #[test]
    fn test_progress_silent_when_total_is_unknown() {
        let mut progress = Progress::new();
        assert_eq!(progress.update(5000, 0), None);
    }

    /// One-shot HTTP server announcing `announced` bytes but sending only
    /// `body` before closing the connection.
    async fn serve_once(body: Vec<u8>, announced: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let header = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {announced}\r\nConnection: close\r\n\r\n"
            );
            socket.write_all(header.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            let _ = socket.flush().await;
        });
        format!("http://{addr}/snapshot.osm.pbf")
    }

    #[tokio::test]
    async fn test_fetch_writes_complete_body() {
        let body = vec![b'w'; 2048];
        let url = serve_once(body.clone(), body.len()).await;
        let dir = tempdir().unwrap();
        let target = dir.path().join("region.osm.pbf");

        let bytes = fetch(&Client::new(), &url, &target).await.unwrap();

        assert_eq!(bytes, 2048);
        assert_eq!(std::fs::read(&target).unwrap(), body);
    }

    #[tokio::test]
    async fn test_failed_transfer_leaves_no_file_behind() {
        // The server dies after 40% of the announced bytes
        let url = serve_once(vec![b'w'; 400], 1000).await;
        let dir = tempdir().unwrap();
        let target = dir.path().join("region.osm.pbf");

        let result = fetch(&Client::new(), &url, &target).await;

        assert!(result.is_err());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_http_error_status_is_propagated() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let response = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        let dir = tempdir().unwrap();
        let target = dir.path().join("region.osm.pbf");

        let url = format!("http://{addr}/missing.osm.pbf");
        let result = fetch(&Client::new(), &url, &target).await;

        assert!(result.is_err());
        assert!(!target.exists());
    }
}
