// Adapters layer: concrete implementations for external systems (remote API, storage).

pub mod shopify;
pub mod storage;

pub use shopify::ShopifyClient;
pub use storage::LocalStorage;
