pub mod fetch;

pub use fetch::TokenSource;
