pub mod dispatcher;
pub mod error;
pub mod request;
pub mod transport;

pub use dispatcher::Dispatcher;
pub use error::{ApiError, HttpError, TransportError};
pub use request::{Request, TransportResponse};
pub use transport::{ReqwestTransport, Transport};
