pub mod contract;
pub mod headless;
pub mod pipeline;
pub mod texture;
