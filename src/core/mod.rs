// src/core/mod.rs

pub mod cast;
pub mod command;
pub mod flags;
pub mod matcher;
pub mod pipeline;
pub mod resolver;
