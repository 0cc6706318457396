pub mod backend;
pub mod form;
pub mod http;
pub mod multipart;
pub mod render;
pub mod router;

pub use backend::BackendApp;
pub use http::{IncomingRequest, Reply};
pub use render::{render_page, Page};
