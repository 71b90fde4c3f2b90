pub mod cache;
pub mod favorites;
pub mod media;
