pub mod feed;
pub mod file;
pub mod stdin;
