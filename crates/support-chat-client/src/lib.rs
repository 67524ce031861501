pub mod config;
pub mod error;
pub mod http;
pub mod nonce;
pub mod traits;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use http::{HttpSupportClient, HttpSupportClientBuilder};
pub use nonce::NonceCache;
pub use traits::{AdminBackend, SupportBackend, TranslateBackend, WidgetBackend};
