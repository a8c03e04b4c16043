// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the Functionary SDK.
//!
//! Public facade operations never surface these — failure is observed only
//! through the log stream. Internal paths use [`Result`] and `?`, and every
//! error terminates in a log event. Delivery failures are terminal for
//! their batch: the SDK makes a single best-effort attempt, with no retry
//! and no re-queue.

use thiserror::Error;

use funct_core::Model;

/// Functionary SDK errors.
#[derive(Debug, Error)]
pub enum FunctError {
	/// API key was never configured.
	#[error("API key not set; call set_api_key or set FUNCTIONARY_API_KEY")]
	MissingApiKey,

	/// A context-setting operation was given an entity with no ids.
	#[error("entity has no ids; cannot set {0} context")]
	EmptyIds(Model),

	/// An operation targeted a model with no entity context set.
	#[error("no {0} context set; identify one first or pass an explicit entity")]
	NoContext(Model),

	/// The models passed to assign are not a valid child/parent pairing.
	#[error("cannot assign {child} under {parent}")]
	InvalidAssignment { child: Model, parent: Model },

	/// The HTTP request itself failed (connect, TLS, timeout).
	#[error("request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// The collection endpoint rejected the payload (status < 500).
	///
	/// The response body is kept for diagnosis; these are client-side
	/// payload or auth problems, resending the same batch cannot succeed.
	#[error("collection endpoint rejected batch ({status}): {body}")]
	Rejected { status: u16, body: String },

	/// The collection endpoint failed (status >= 500).
	///
	/// No structured body is assumed for server errors.
	#[error("collection endpoint error ({status})")]
	ServerError { status: u16 },
}

impl FunctError {
	/// Classifies a non-success HTTP status into the error taxonomy.
	pub fn from_status(status: u16, body: String) -> Self {
		if status >= 500 {
			FunctError::ServerError { status }
		} else {
			FunctError::Rejected { status, body }
		}
	}

	/// Returns `true` for sub-500 rejections (client/validation errors).
	pub fn is_rejection(&self) -> bool {
		matches!(self, FunctError::Rejected { .. })
	}
}

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, FunctError>;
