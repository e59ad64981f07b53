// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod rag;
pub mod upstream;
pub mod version;
pub mod vision;

pub use config::{ConfigError, FoodScannerConfig, ReaderConfig};
pub use upstream::UpstreamError;
