//! GitHub access for the SSH key importer.

pub mod http;
pub mod keys;

pub use http::{HttpCapability, HttpResponse, ReqwestHttp};
pub use keys::{parse_keys, KeyFetcher, SshKeyList};
