pub mod config;
pub mod extraction;
pub mod login;
pub mod review;
pub mod session;
pub mod upload_data;

pub use config::{ConfigError, PortalConfig};
pub use extraction::{BboxRef, ExtractionField, ExtractionResult, Extractions};
pub use login::LoginError;
pub use review::{ReviewError, ReviewField, ReviewState};
pub use session::{Admission, MemoryStorage, Redirect, Route, Session, SessionStorage};
pub use upload_data::{StateError, UploadData};
