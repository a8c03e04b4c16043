// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Single-attempt HTTP delivery to the collection endpoint.
//!
//! Each batch gets exactly one best-effort POST. Outcomes are classified
//! (sub-500 rejection with body captured, 500+ server error without) and
//! reported to the caller; there is no retry and a failed batch is not
//! re-queued. In stub mode every send short-circuits to a canned success
//! with no network I/O.

use std::time::Duration;

use chrono::Local;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use funct_core::{IdentifyRecord, StateBatch};

use crate::error::{FunctError, Result};

/// SDK identification sent in the `X-Source` header.
const SDK_SOURCE: &str = concat!("funct-rust/", env!("CARGO_PKG_VERSION"));

/// Hard timeout on every collection request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(9);

pub struct Transport {
	http: Client,
	stub: bool,
}

impl Transport {
	/// Builds the transport. With `stub` set, sends are canned successes.
	pub fn new(stub: bool) -> Self {
		let http = Client::builder()
			.user_agent(SDK_SOURCE)
			.timeout(REQUEST_TIMEOUT)
			.build()
			.expect("failed to build HTTP client");
		Self { http, stub }
	}

	pub fn is_stub(&self) -> bool {
		self.stub
	}

	/// Delivers one identify record to `/identify`.
	pub async fn send_identify(
		&self,
		base_url: &str,
		api_key: &str,
		record: &IdentifyRecord,
	) -> Result<()> {
		self.post(base_url, "identify", api_key, record).await
	}

	/// Delivers the accumulated state batches to `/state` in one request.
	pub async fn send_states(
		&self,
		base_url: &str,
		api_key: &str,
		batches: &[StateBatch],
	) -> Result<()> {
		self.post(base_url, "state", api_key, &batches).await
	}

	async fn post<B: Serialize + ?Sized>(
		&self,
		base_url: &str,
		endpoint: &str,
		api_key: &str,
		body: &B,
	) -> Result<()> {
		let url = format!("{}/{endpoint}", base_url.trim_end_matches('/'));

		if self.stub {
			debug!(url = %url, "Stub transport: dropping batch with canned success");
			return Ok(());
		}

		let response = self
			.http
			.post(&url)
			.header("Authorization", format!("Bearer {api_key}"))
			.header("X-Request-Id", Uuid::new_v4().to_string())
			.header("X-Timezone-Offset", timezone_offset_minutes().to_string())
			.header("X-Source", SDK_SOURCE)
			.json(body)
			.send()
			.await?;

		let status = response.status();
		if status.is_success() {
			debug!(url = %url, status = status.as_u16(), "Batch delivered");
			return Ok(());
		}

		let status = status.as_u16();
		let body = if status < 500 {
			response.text().await.unwrap_or_default()
		} else {
			String::new()
		};
		Err(FunctError::from_status(status, body))
	}
}

/// Local UTC offset in minutes, for the `X-Timezone-Offset` header.
fn timezone_offset_minutes() -> i32 {
	Local::now().offset().local_minus_utc() / 60
}
