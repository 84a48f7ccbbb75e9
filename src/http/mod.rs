//! Request execution: transport, response classification, retrying executors.

mod attempt;
pub mod blocking;
pub mod classify;
pub mod executor;
pub mod request;
pub mod transport;

pub use blocking::BlockingRequestExecutor;
pub use classify::{classify, ParsedResponse};
pub use executor::RequestExecutor;
pub use request::ApiRequest;
pub use transport::{
    BlockingReqwestTransport, BlockingTransport, ReqwestTransport, Transport, TransportRequest,
    TransportResponse,
};
