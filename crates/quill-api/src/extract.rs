//! Request extractors
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use axum::extract::FromRequest;

/// JSON body extractor whose rejections render as `VALIDATION_ERROR`
///
/// A body that is not JSON, lacks a required field or is sent without a
/// JSON content type fails with a single `body` violation carrying the
/// deserializer's message.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
