//! Data clients that turn solar instrument queries into remote file URLs.
//!
//! - [`client::DataClient`]: the interface every client implements
//! - [`goes::XrsClient`]: GOES X-ray Sensor daily flux files
//! - [`fido::Fido`]: dispatch of one query across all registered clients

pub mod client;
pub mod error;
pub mod fido;
pub mod goes;

pub use client::{DataClient, RegisteredValues};
pub use error::{ClientError, ClientResult};
pub use fido::{Fido, UnifiedResponse};
pub use goes::{XrsClient, XrsClientConfig};
