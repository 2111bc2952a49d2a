// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod compression;
pub mod fields;
pub mod progress;
pub mod reader;
pub mod record;
pub mod seed;
pub mod sim;
pub mod writer;
