// npy-mosaic/src/data/mod.rs

mod array;
mod cache;
mod catalog;
mod client;
mod errors;

pub use array::{FileDescriptor, LoadedArray};
pub use cache::ArrayCache;
pub use catalog::{CatalogStatus, FileCatalog, ListRequest, LoadOutcome, LoadRequest};
pub use client::{
    parse_file_list, parse_loaded_array, BackendClient, BackendClientBuilder,
    BackendClientBuilderError, DEFAULT_BACKEND_URL,
};
pub use errors::{DecodeError, FetchError};
