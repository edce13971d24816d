pub mod auth;
pub mod config;
pub mod delay_manager;
pub mod document;
pub mod error;
pub mod extractor;
pub mod input_loader;
pub mod logger;
pub mod output_writer;
pub mod runner;
pub mod session_store;
pub mod transport;
pub mod zwiftpower;

// Exporting types for convenience
pub use config::{Credentials, Settings};
pub use delay_manager::{FixedDelay, NoDelay, Throttle};
pub use document::{DocumentQuery, HtmlDocument};
pub use error::{AuthError, ConfigError, InputError, OutputError, TransportError};
pub use extractor::{ProfileExtractor, RiderRecord};
pub use input_loader::InputTable;
pub use runner::{ensure_session, BatchRunner};
pub use session_store::{SessionState, SessionStore};
pub use transport::{CookieSet, HttpTransport, Page, Transport};
