pub mod client;
pub mod envelope;
pub mod error;
pub mod resources;

pub use client::ApiClient;
pub use envelope::Page;
pub use error::{ClientError, ErrorKind, ServerError};
pub use resources::Resource;
