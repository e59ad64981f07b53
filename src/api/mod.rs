// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod food_scanner;
pub mod http_server;
pub mod reader;
pub mod render;
pub mod session_store;

pub use errors::{AppError, Service};
pub use food_scanner::FoodScannerState;
pub use http_server::{halted_router, serve, UploadedFile};
pub use reader::ReaderState;
pub use render::{Notice, NoticeLevel};
pub use session_store::{SessionStore, SessionStoreConfig};
