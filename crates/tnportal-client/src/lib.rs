//! Client side of the TN absence portal: HTTP/SSE transport and the document
//! upload flow.

pub mod confirm;
pub mod sse;
pub mod transport;
pub mod upload;

pub use confirm::confirm;
pub use transport::{ApiClient, SseEvent, TransportError};
pub use upload::{UploadError, UploadFile, Uploader};
