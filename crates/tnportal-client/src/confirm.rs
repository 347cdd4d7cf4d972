//! Submit the reviewed fields.

use tnportal_core::UploadData;
use tracing::info;

use crate::transport::{ApiClient, TransportError};

pub const CONFIRM_PATH: &str = "/tn-document/confirm";

/// POST the reviewed fields. The backend echoes the confirmed record, which
/// becomes the confirmation page state.
pub async fn confirm(client: &ApiClient, data: &UploadData) -> Result<UploadData, TransportError> {
    let confirmed: UploadData = client.post(CONFIRM_PATH, data).await?;
    info!(
        last_name = %confirmed.last_name,
        start = %confirmed.start,
        end = %confirmed.end,
        "absence confirmed"
    );
    Ok(confirmed)
}
