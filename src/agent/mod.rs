// SYNOID Reel Agent Modules
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod assembler;
pub mod asset_resolver;
pub mod health;
pub mod placeholder;
pub mod reel_pipeline;
pub mod scene_splitter;
pub mod validation_gate;
pub mod video_stitcher;
pub mod voice;
