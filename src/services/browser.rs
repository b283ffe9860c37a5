use crate::error::{AppError, Result};

/// Opens `url` with the system's default handler.
pub fn open_in_browser(url: &str) -> Result<()> {
    open::that(url).map_err(|e| AppError::BrowserLaunch {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    tracing::debug!("Opened {} in browser", url);
    Ok(())
}
