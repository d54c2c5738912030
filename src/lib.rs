// src/lib.rs

//! chirp: reposts fresh subreddit memes to Twitter

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
