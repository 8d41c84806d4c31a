// SYNOID Reel Library
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Script in, narrated slideshow MP4 out.

pub mod agent;
pub mod config;
