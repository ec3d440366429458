pub mod activation;
pub mod completion;
pub mod definition;
pub mod engine;
pub mod navigation;
pub mod render;
pub mod selection;
pub mod state;
pub mod store;
