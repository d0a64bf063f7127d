pub mod http_client;
pub mod in_memory;

pub use http_client::HttpFormApi;
pub use in_memory::InMemoryFormApi;
