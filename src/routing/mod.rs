pub mod aggregator;
pub mod descriptor;
pub mod response;
pub mod transport;

pub use aggregator::{Aggregator, PredictRequest};
pub use descriptor::{BackendDescriptor, Backends};
pub use response::{ResponseMode, RoutedResponse, UnifiedResponse};
pub use transport::{BackendReply, BackendTransport, HttpTransport, Upload};
