// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the ragified apps

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-food-scanner-reader-2025-10-16";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2025-10-16";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "food-image-analysis",
    "pdf-chat",
    "conversational-retrieval",
    "first-upload-wins",
    "session-cookies",
];

/// Get formatted version string for logging
pub fn get_version_string(app: &str) -> String {
    format!("{} {} ({})", app, VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for health responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
