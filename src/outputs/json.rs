//! JSON output of the digest.
//!
//! The document has the shape consumed by the front end:
//!
//! ```text
//! {"items":[{"title":"…","link":"…","pubDate":"…","description":"…"}]}
//! ```

use crate::models::NewsResponse;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tokio::io::{self, AsyncWriteExt};
use tracing::{error, info, instrument};

/// Serialize `response`, optionally pretty-printed.
pub fn render(response: &NewsResponse, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(response)
    } else {
        serde_json::to_string(response)
    }
}

/// Write the digest to `path`, creating parent directories as needed.
///
/// # Arguments
///
/// * `response` - The digest to serialize
/// * `path` - Destination file, overwritten if present
/// * `pretty` - Indent the JSON for humans
///
/// # Returns
///
/// `Ok(())` once the file is written, or the serialization or I/O error.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_digest(
    response: &NewsResponse,
    path: &Path,
    pretty: bool,
) -> Result<(), Box<dyn Error>> {
    let json = render(response, pretty)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!(items = response.items.len(), "Wrote digest JSON");
    Ok(())
}

/// Print the digest to stdout followed by a newline.
pub async fn print_digest(response: &NewsResponse, pretty: bool) -> Result<(), Box<dyn Error>> {
    let mut json = render(response, pretty)?;
    json.push('\n');

    let mut stdout = io::stdout();
    stdout.write_all(json.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
