// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Domain validation errors.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
	#[error("provider tag must not be empty")]
	EmptyProviderTag,

	#[error("external subject id must not be empty")]
	EmptySubjectId,

	#[error("email must contain a local part and a domain")]
	InvalidEmail,

	#[error("unknown workspace role: {0}")]
	InvalidRole(String),
}
