pub mod accept;
pub mod cache;
pub mod cache_policy;
pub mod chain;
pub mod config;
pub mod cookie;
pub mod exception;
pub mod param;
pub mod request;
pub mod responder;
pub mod response;
pub mod result;
pub mod util;

pub use accept::{Accept, AcceptEntry, AcceptKind};
pub use cache::AcceptCache;
pub use cache_policy::{CachePolicy, CacheVisibility};
pub use chain::{Flow, ProcessChain, Processor, Stage};
pub use config::Config;
pub use cookie::Cookie;
pub use exception::Exception;
pub use param::{HttpEncoding, HttpRequestMethod, HttpVersion};
pub use request::Request;
pub use responder::{OutputSink, Responder};
pub use response::{
    DataResponse, ErrorResponse, FileHandleResponse, FileResponse, RedirectResponse, Response,
    StringResponse,
};
pub use result::ProcessResult;
pub use util::HtmlBuilder;
