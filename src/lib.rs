mod alerts;
mod error;
mod extract;
mod load;
mod pipeline;
mod reporting;
mod settings;
mod transform;
mod types;

pub use error::PipelineError;
pub use pipeline::*;

pub use extract::client::*;
pub use extract::error::FetchError;
pub use extract::response::*;

pub use transform::cleaner::{clean, enrich};
pub use transform::stats::*;
pub use transform::validator::*;

pub use alerts::condition::*;
pub use alerts::notifier::Notifier;
pub use alerts::transport::{MailMessage, NetworkTransport, Transport, TransportError};

pub use load::error::StorageError;
pub use load::storage::*;

pub use reporting::*;
pub use settings::*;

pub use types::category::*;
pub use types::frequency::*;
pub use types::location::*;
pub use types::observation_batch::{self as columns, ObservationBatch};
