// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision pipeline for the food scanner
//!
//! This module provides:
//! - Image validation and re-encoding (JPEG/PNG only)
//! - Nutrition analysis through a hosted multimodal model

pub mod image_utils;
pub mod nutrition_client;

pub use image_utils::{
    data_url, encode_image_to_base64, prepare_image, prepare_image_within, EncodedImage, ImageError, ImageFormatTag,
    ImageInfo,
};
pub use nutrition_client::{FoodAnalyzer, OpenAiVisionClient, NUTRITION_PROMPT};
