pub mod addon_scan;
pub mod catalog;
pub mod collection_store;
pub mod reconciler;
pub mod registry;
pub mod resolver;
pub mod server_config;
pub mod service;
pub mod tree_builder;
pub mod view;
