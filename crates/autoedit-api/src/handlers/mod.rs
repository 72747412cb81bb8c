pub mod download;
pub mod health;
pub mod index;
pub mod jobs;
pub mod upload;
