#![allow(dead_code)]

pub mod model;
pub mod signal;
pub mod wav;
