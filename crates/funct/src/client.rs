// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The Functionary client facade.
//!
//! Public operations validate input, resolve the target entity (explicit
//! or context-derived), and hand records to the batching caches. Every
//! operation is fire-and-forget: failures are logged, never returned and
//! never thrown, so a broken analytics pipeline cannot break the host
//! application.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use funct_core::{Entity, IdentifyRecord, Model, Properties, StateEvent, StateRecord};

use crate::cache::{SharedCaches, STATE_RECORD_CAP};
use crate::context::ContextStore;
use crate::error::{FunctError, Result};
use crate::handles::{CustomerHandle, OrganizationHandle};
use crate::surface::{MemorySurface, SurfaceDelegate};
use crate::transport::Transport;

/// Default collection endpoint.
pub const DEFAULT_BASE_URL: &str = "https://functionary.run/api/v1";

/// Surface keys for configuration persisted across restarts/page loads.
const KEY_API_KEY: &str = "apiKey";
const KEY_BASE_URL: &str = "baseURL";

/// Environment variables consulted at construction, in lookup order.
const ENV_API_KEYS: &[&str] = &["NEXT_PUBLIC_FUNCTIONARY_API_KEY", "FUNCTIONARY_API_KEY"];
const ENV_DEBUG: &[&str] = &["NEXT_PUBLIC_FUNCTIONARY_DEBUG", "FUNCTIONARY_DEBUG"];

#[derive(Debug)]
struct Config {
	api_key: Option<String>,
	base_url: String,
	debug: bool,
}

/// How an event or property call picks its entity.
#[derive(Debug, Clone)]
pub enum EventTarget {
	/// Use the current entity context for the model.
	ByContext(Model),
	/// Use an explicitly given entity.
	ByEntity(Entity),
}

impl From<Model> for EventTarget {
	fn from(model: Model) -> Self {
		EventTarget::ByContext(model)
	}
}

impl From<Entity> for EventTarget {
	fn from(entity: Entity) -> Self {
		EventTarget::ByEntity(entity)
	}
}

/// Options for [`Functionary::identify`].
#[derive(Debug, Clone, Default)]
pub struct IdentifyOptions {
	set_to_context: bool,
	display_name: Option<String>,
	properties: Option<Properties>,
}

impl IdentifyOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Also store the entity as the current context for its model, so
	/// later event/property calls can omit an explicit target. Useful
	/// when a user logs in.
	pub fn set_to_context(mut self, set: bool) -> Self {
		self.set_to_context = set;
		self
	}

	pub fn display_name(mut self, name: impl Into<String>) -> Self {
		self.display_name = Some(name.into());
		self
	}

	pub fn properties(mut self, properties: Properties) -> Self {
		self.properties = Some(properties);
		self
	}
}

/// Builder for a [`Functionary`] client.
pub struct FunctionaryBuilder {
	api_key: Option<String>,
	base_url: Option<String>,
	enabled: bool,
	debug: bool,
	fire_on_instantiation: bool,
	surface: Option<Arc<dyn SurfaceDelegate>>,
	caches: Option<Arc<SharedCaches>>,
}

impl FunctionaryBuilder {
	pub fn new() -> Self {
		Self {
			api_key: None,
			base_url: None,
			enabled: true,
			debug: false,
			fire_on_instantiation: true,
			surface: None,
			caches: None,
		}
	}

	/// Sets the API key explicitly, overriding env and surface values.
	pub fn api_key(mut self, key: impl Into<String>) -> Self {
		self.api_key = Some(key.into());
		self
	}

	/// Sets the collection base URL.
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = Some(url.into());
		self
	}

	/// With `false`, all delivery is stubbed to a canned success — no
	/// network I/O. Handy for development and test environments:
	/// `enabled(env == "production")`.
	pub fn enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self
	}

	/// Enables verbose diagnostics of cached and delivered batches.
	pub fn debug(mut self, debug: bool) -> Self {
		self.debug = debug;
		self
	}

	/// Whether the very first identify/event call flushes immediately
	/// instead of waiting out the full throttle window. Defaults to true.
	pub fn fire_on_instantiation(mut self, fire: bool) -> Self {
		self.fire_on_instantiation = fire;
		self
	}

	/// Supplies the persistence surface. Defaults to an in-process
	/// [`MemorySurface`].
	pub fn surface(mut self, surface: Arc<dyn SurfaceDelegate>) -> Self {
		self.surface = Some(surface);
		self
	}

	/// Shares batching caches with other client instances, so they feed
	/// one outbound queue per cache type.
	pub fn caches(mut self, caches: Arc<SharedCaches>) -> Self {
		self.caches = Some(caches);
		self
	}

	pub fn build(self) -> Functionary {
		let surface = self
			.surface
			.unwrap_or_else(|| Arc::new(MemorySurface::new()));
		let caches = self.caches.unwrap_or_default();

		let inner = Arc::new(FunctionaryInner {
			config: RwLock::new(Config {
				api_key: None,
				base_url: DEFAULT_BASE_URL.to_string(),
				debug: false,
			}),
			context: ContextStore::new(Arc::clone(&surface)),
			surface,
			caches,
			transport: Transport::new(!self.enabled),
			fire_on_first_use: AtomicBool::new(self.fire_on_instantiation),
			exit_hook_installed: AtomicBool::new(false),
		});
		let client = Functionary { inner };

		client.setup_from_env();
		client.setup_from_surface();
		{
			let mut config = client.inner.config.write().expect("config lock poisoned");
			if self.api_key.is_some() {
				config.api_key = self.api_key;
			}
			if let Some(url) = self.base_url {
				config.base_url = url;
			}
			if self.debug {
				config.debug = true;
			}
		}
		for model in Model::all() {
			client.restore_context(*model);
		}
		client
	}
}

impl Default for FunctionaryBuilder {
	fn default() -> Self {
		Self::new()
	}
}

struct FunctionaryInner {
	config: RwLock<Config>,
	context: ContextStore,
	surface: Arc<dyn SurfaceDelegate>,
	caches: Arc<SharedCaches>,
	transport: Transport,
	fire_on_first_use: AtomicBool,
	exit_hook_installed: AtomicBool,
}

/// Client for identifying entities and recording state events against
/// them, with merged, throttled, batched delivery.
///
/// # Example
///
/// ```ignore
/// use funct::{Entity, Functionary, IdentifyOptions, StateEvent};
///
/// let funct = Functionary::builder()
///     .api_key("fn_live_xxx")
///     .build();
///
/// funct
///     .identify(
///         Entity::customer(vec!["cust_42"]),
///         IdentifyOptions::new().set_to_context(true),
///     )
///     .await;
///
/// // resolves to the identified customer
/// funct.event("signed_up", None).await;
///
/// funct.shutdown().await;
/// ```
#[derive(Clone)]
pub struct Functionary {
	inner: Arc<FunctionaryInner>,
}

impl Functionary {
	pub fn builder() -> FunctionaryBuilder {
		FunctionaryBuilder::new()
	}

	/// Asserts/updates an entity's identity and optionally makes it the
	/// current context for its model.
	pub async fn identify(&self, entity: Entity, opts: IdentifyOptions) {
		if !self.check_api_key("identify") {
			return;
		}
		if entity.has_no_ids() {
			// permissive: logged, and the record still goes out
			warn!(model = %entity.model, "identify called with no ids");
		}

		if opts.set_to_context {
			if let Err(err) = self.inner.context.set(&entity) {
				warn!(error = %err, "Could not set entity context");
			}
		}

		let mut record = IdentifyRecord::new(entity.model, entity.string_ids());
		if let Some(name) = opts.display_name {
			record = record.with_display_name(name);
		}
		if let Some(properties) = opts.properties {
			record = record.with_properties(properties);
		}
		self.enqueue_identify(record).await;
	}

	/// Records a named state event against the target entity.
	///
	/// With no target, the current customer context is used. The event is
	/// timestamped now, not at delivery time.
	pub async fn event(&self, state: impl Into<StateEvent>, target: Option<EventTarget>) {
		if !self.check_api_key("event") {
			return;
		}
		let target = target.unwrap_or(EventTarget::ByContext(Model::Customer));
		let (model, ids) = match self.resolve_target(target) {
			Ok(resolved) => resolved,
			Err(err) => {
				warn!(error = %err, "Dropping event");
				return;
			}
		};
		let record = state.into().into_record(Utc::now());
		self.enqueue_state(model, ids, record).await;
	}

	/// Assigns a customer under an organization.
	///
	/// With an id-less `child`, the current customer context is used.
	pub async fn assign(&self, child: Entity, parent: Entity) {
		if !self.check_api_key("assign") {
			return;
		}
		if !child.model.can_have_parent() || parent.model != Model::Organization {
			let err = FunctError::InvalidAssignment {
				child: child.model,
				parent: parent.model,
			};
			warn!(error = %err, "Dropping assign");
			return;
		}
		if parent.has_no_ids() {
			warn!(error = %FunctError::EmptyIds(parent.model), "Dropping assign");
			return;
		}

		let child_ids = if child.has_no_ids() {
			match self.resolve_target(EventTarget::ByContext(child.model)) {
				Ok((_, ids)) => ids,
				Err(err) => {
					warn!(error = %err, "Dropping assign");
					return;
				}
			}
		} else {
			child.string_ids()
		};

		let record = IdentifyRecord::new(child.model, child_ids)
			.with_parent(parent.model, parent.string_ids());
		self.enqueue_identify(record).await;
	}

	/// Adds properties to the target entity (shallow merge on the remote
	/// side, and in the pending cache).
	pub async fn add_properties(&self, properties: Properties, target: Option<EventTarget>) {
		if !self.check_api_key("add_properties") {
			return;
		}
		let target = target.unwrap_or(EventTarget::ByContext(Model::Customer));
		let (model, ids) = match self.resolve_target(target) {
			Ok(resolved) => resolved,
			Err(err) => {
				warn!(error = %err, "Dropping add_properties");
				return;
			}
		};
		let record = IdentifyRecord::new(model, ids).with_properties(properties);
		self.enqueue_identify(record).await;
	}

	/// Clears entity context — all models by default, or just the listed
	/// ones. Call on logout.
	pub fn reset_context(&self, models: Option<&[Model]>) {
		self.inner.context.reset(models.unwrap_or_else(|| Model::all()));
	}

	/// Hydrates the model's entity context from the persistence surface.
	/// Returns whether a stored context was found.
	pub fn restore_context(&self, model: Model) -> bool {
		self.inner.context.restore(model)
	}

	/// Sets the API key, persisting it through the surface.
	pub fn set_api_key(&self, key: impl Into<String>) {
		let key = key.into();
		self.inner.surface.set(KEY_API_KEY, &key);
		self.inner.config.write().expect("config lock poisoned").api_key = Some(key);
	}

	/// Sets the collection base URL, persisting it through the surface.
	pub fn set_base_url(&self, url: impl Into<String>) {
		let url = url.into();
		self.inner.surface.set(KEY_BASE_URL, &url);
		self.inner.config.write().expect("config lock poisoned").base_url = url;
	}

	pub fn api_key(&self) -> Option<String> {
		self.inner
			.config
			.read()
			.expect("config lock poisoned")
			.api_key
			.clone()
	}

	pub fn base_url(&self) -> String {
		self.inner
			.config
			.read()
			.expect("config lock poisoned")
			.base_url
			.clone()
	}

	pub fn debug_enabled(&self) -> bool {
		self.inner.config.read().expect("config lock poisoned").debug
	}

	/// Fills unset configuration from the environment
	/// (`FUNCTIONARY_API_KEY` / `NEXT_PUBLIC_FUNCTIONARY_API_KEY`,
	/// `FUNCTIONARY_DEBUG` / `NEXT_PUBLIC_FUNCTIONARY_DEBUG`).
	pub fn setup_from_env(&self) {
		let env_key = ENV_API_KEYS.iter().find_map(|name| std::env::var(name).ok());
		let env_debug = ENV_DEBUG
			.iter()
			.find_map(|name| std::env::var(name).ok())
			.is_some_and(|v| v == "true");

		let mut config = self.inner.config.write().expect("config lock poisoned");
		if config.api_key.is_none() {
			config.api_key = env_key;
		}
		if env_debug {
			config.debug = true;
		}
	}

	/// Fills unset configuration from the persistence surface (`apiKey`,
	/// `baseURL` keys).
	pub fn setup_from_surface(&self) {
		let stored_key = self.inner.surface.get(KEY_API_KEY);
		let stored_url = self.inner.surface.get(KEY_BASE_URL);

		let mut config = self.inner.config.write().expect("config lock poisoned");
		if config.api_key.is_none() {
			config.api_key = stored_key;
		}
		if let Some(url) = stored_url {
			config.base_url = url;
		}
	}

	/// A convenience handle bound to the customer model.
	pub fn customer(&self) -> CustomerHandle {
		CustomerHandle::new(self.clone())
	}

	/// A convenience handle bound to the organization model.
	pub fn organization(&self) -> OrganizationHandle {
		OrganizationHandle::new(self.clone())
	}

	/// Delivers everything currently cached: identify records first, then
	/// state batches.
	pub async fn flush(&self) {
		self.flush_identifies().await;
		self.flush_states().await;
	}

	/// Cancels pending timers, flushes, and logs shutdown. The reliable
	/// teardown path — call it before your process exits.
	pub async fn shutdown(&self) {
		self.inner.caches.identify_scheduler.cancel_pending();
		self.inner.caches.state_scheduler.cancel_pending();
		self.flush().await;
		info!("Functionary client shut down");
	}

	fn check_api_key(&self, operation: &str) -> bool {
		let has_key = self
			.inner
			.config
			.read()
			.expect("config lock poisoned")
			.api_key
			.is_some();
		if !has_key {
			error!(
				operation,
				"Functionary API key not set. Call set_api_key or set FUNCTIONARY_API_KEY"
			);
		}
		has_key
	}

	fn resolve_target(&self, target: EventTarget) -> Result<(Model, Vec<String>)> {
		match target {
			EventTarget::ByEntity(entity) => {
				if entity.has_no_ids() {
					return Err(FunctError::EmptyIds(entity.model));
				}
				Ok((entity.model, entity.string_ids()))
			}
			EventTarget::ByContext(model) => self
				.inner
				.context
				.get(model)
				.map(|id| (model, vec![id]))
				.ok_or(FunctError::NoContext(model)),
		}
	}

	async fn enqueue_identify(&self, record: IdentifyRecord) {
		if self.debug_enabled() {
			debug!(?record, "Caching identify record");
		}
		{
			let mut cache = self.inner.caches.identify.lock().await;
			cache.merge_or_insert(record);
		}
		self.install_exit_hook();

		let client = self.clone();
		self.inner.caches.identify_scheduler.schedule(async move {
			client.flush_identifies().await;
		});

		if self.take_first_use() {
			self.flush().await;
		}
	}

	async fn enqueue_state(&self, model: Model, ids: Vec<String>, record: StateRecord) {
		if self.debug_enabled() {
			debug!(%model, ?ids, name = %record.name, "Caching state record");
		}
		let total = {
			let mut cache = self.inner.caches.state.lock().await;
			cache.append(model, ids, record)
		};
		self.install_exit_hook();

		let client = self.clone();
		self.inner.caches.state_scheduler.schedule(async move {
			client.flush_states().await;
		});

		let cap_hit = total >= STATE_RECORD_CAP;
		if cap_hit {
			debug!(total, "State record cap reached; forcing flush");
		}
		if self.take_first_use() || cap_hit {
			self.flush().await;
		}
	}

	/// Consumes the one-shot "flush immediately on first use" flag.
	fn take_first_use(&self) -> bool {
		self.inner.fire_on_first_use.swap(false, Ordering::SeqCst)
	}

	/// Registers the manual flush with the surface's exit hook, once.
	fn install_exit_hook(&self) {
		if self.inner.exit_hook_installed.swap(true, Ordering::SeqCst) {
			return;
		}
		let weak = Arc::downgrade(&self.inner);
		self.inner.surface.add_flush_listener(Arc::new(move || {
			let Some(inner) = weak.upgrade() else {
				return;
			};
			let client = Functionary { inner };
			match tokio::runtime::Handle::try_current() {
				Ok(handle) => {
					handle.spawn(async move { client.flush().await });
				}
				Err(_) => {
					warn!("No async runtime at exit; pending batches dropped");
				}
			}
		}));
	}

	async fn flush_identifies(&self) {
		let records = {
			let mut cache = self.inner.caches.identify.lock().await;
			cache.take()
		};
		if records.is_empty() {
			return;
		}
		let Some((api_key, base_url)) = self.delivery_config() else {
			return;
		};
		if self.debug_enabled() {
			debug!(count = records.len(), "Flushing identify records");
		}

		// one request per record: identify responses may need per-entity
		// handling on the collection side
		for record in &records {
			if let Err(err) = self
				.inner
				.transport
				.send_identify(&base_url, &api_key, record)
				.await
			{
				self.log_delivery_error(err);
			}
		}
	}

	async fn flush_states(&self) {
		let batches = {
			let mut cache = self.inner.caches.state.lock().await;
			cache.take()
		};
		if batches.is_empty() {
			return;
		}
		let Some((api_key, base_url)) = self.delivery_config() else {
			return;
		};
		if self.debug_enabled() {
			debug!(count = batches.len(), "Flushing state batches");
		}

		if let Err(err) = self
			.inner
			.transport
			.send_states(&base_url, &api_key, &batches)
			.await
		{
			self.log_delivery_error(err);
		}
	}

	fn delivery_config(&self) -> Option<(String, String)> {
		let config = self.inner.config.read().expect("config lock poisoned");
		match &config.api_key {
			Some(key) => Some((key.clone(), config.base_url.clone())),
			None => {
				error!("API key not set at flush time; dropping batch");
				None
			}
		}
	}

	fn log_delivery_error(&self, err: FunctError) {
		match &err {
			FunctError::Rejected { status, body } => {
				warn!(status, body = %body, "Collection endpoint rejected batch");
			}
			FunctError::ServerError { status } => {
				warn!(status, "Collection endpoint server error");
			}
			other => {
				warn!(error = %other, "Batch delivery failed");
			}
		}
	}
}
