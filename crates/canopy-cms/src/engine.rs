//! The engine handle
//!
//! [`Cms`] ties the content store, the content type registry, the blob
//! storage and the lookup cache together. It is cheap to clone; every clone
//! shares the same store.

use crate::cache::ContentCache;
use crate::error::{CmsError, CmsResult};
use crate::language::Language;
use crate::permissions::Target;
use crate::portlets::{PortletLibrary, PortletType};
use crate::registry::{ContentTypeRegistry, InMemoryRegistry};
use crate::store::ContentStore;
use crate::transaction::Transaction;
use canopy_cache::CacheStatistics;
use canopy_conf::Settings;
use canopy_storage::{InMemoryStorage, LocalStorage, Storage};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Handle to a content engine
#[derive(Clone)]
pub struct Cms {
	pub(crate) store: Arc<RwLock<ContentStore>>,
	pub(crate) registry: Arc<dyn ContentTypeRegistry>,
	pub(crate) storage: Arc<dyn Storage>,
	pub(crate) cache: ContentCache,
	pub(crate) settings: Arc<Settings>,
	pub(crate) portlet_library: Arc<PortletLibrary>,
}

impl Cms {
	/// Start configuring an engine
	///
	/// # Examples
	///
	/// ```
	/// use canopy_cms::engine::Cms;
	/// use canopy_conf::Settings;
	///
	/// let settings = Settings::default().with_language("de", "Deutsch");
	/// let cms = Cms::builder().settings(settings).build().unwrap();
	/// assert_eq!(cms.settings().languages.len(), 2);
	/// ```
	pub fn builder() -> CmsBuilder {
		CmsBuilder::new()
	}

	/// Begin a transaction, waiting for the store's write lock
	pub(crate) async fn begin(&self, label: &'static str) -> Transaction<'_> {
		let guard = self.store.write().await;
		Transaction::new(guard, Arc::clone(&self.storage), label)
	}

	/// Commit on success, roll back on failure
	pub(crate) async fn finish<T>(&self, txn: Transaction<'_>, result: CmsResult<T>) -> CmsResult<T> {
		match result {
			Ok(value) => {
				txn.commit(&self.cache).await?;
				Ok(value)
			}
			Err(err) => {
				tracing::debug!(transaction = txn.label(), error = %err, "operation failed");
				txn.rollback().await;
				Err(err)
			}
		}
	}

	/// A consistent copy of the whole store
	pub async fn snapshot(&self) -> ContentStore {
		self.store.read().await.clone()
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn registry(&self) -> &dyn ContentTypeRegistry {
		self.registry.as_ref()
	}

	pub fn storage(&self) -> &dyn Storage {
		self.storage.as_ref()
	}

	pub fn portlet_library(&self) -> &PortletLibrary {
		&self.portlet_library
	}

	pub async fn cache_statistics(&self) -> CacheStatistics {
		self.cache.statistics().await
	}

	pub(crate) fn default_language(&self) -> Language {
		Language::code(self.settings.language_code.as_str())
	}

	/// Reject concrete languages the settings do not enable
	pub(crate) fn ensure_language(&self, language: &Language) -> CmsResult<()> {
		match language {
			Language::Neutral => Ok(()),
			Language::Code(code) if self.settings.is_language_enabled(code) => Ok(()),
			Language::Code(code) => Err(CmsError::invalid(
				"language",
				format!("Language '{}' is not enabled.", code),
			)),
		}
	}

	/// Permission needed to change what hangs off `target`
	pub(crate) fn edit_permission(target: Target) -> &'static str {
		match target {
			Target::Portal => "manage_portal",
			Target::Node(_) => "edit",
		}
	}
}

/// Builder for [`Cms`]
#[derive(Default)]
pub struct CmsBuilder {
	settings: Option<Settings>,
	registry: Option<Arc<dyn ContentTypeRegistry>>,
	storage: Option<Arc<dyn Storage>>,
	portlet_types: Vec<Arc<dyn PortletType>>,
}

impl CmsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn settings(mut self, settings: Settings) -> Self {
		self.settings = Some(settings);
		self
	}

	pub fn registry(mut self, registry: Arc<dyn ContentTypeRegistry>) -> Self {
		self.registry = Some(registry);
		self
	}

	pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
		self.storage = Some(storage);
		self
	}

	/// Make an additional portlet type available
	pub fn portlet_type(mut self, portlet_type: Arc<dyn PortletType>) -> Self {
		self.portlet_types.push(portlet_type);
		self
	}

	pub fn build(self) -> CmsResult<Cms> {
		let settings = self.settings.unwrap_or_default();
		settings.validate()?;

		let storage = match (self.storage, &settings.media_root) {
			(Some(storage), _) => storage,
			(None, Some(root)) => Arc::new(LocalStorage::new(root.clone())) as Arc<dyn Storage>,
			(None, None) => Arc::new(InMemoryStorage::new()) as Arc<dyn Storage>,
		};
		let registry = self
			.registry
			.unwrap_or_else(|| Arc::new(InMemoryRegistry::new(settings.tabs)));

		let mut library = PortletLibrary::new();
		for portlet_type in self.portlet_types {
			library.register(portlet_type);
		}

		tracing::info!(
			language = %settings.language_code,
			languages = settings.languages.len(),
			"content engine configured"
		);
		Ok(Cms {
			store: Arc::new(RwLock::new(ContentStore::new(&settings))),
			registry,
			storage,
			cache: ContentCache::new(&settings),
			settings: Arc::new(settings),
			portlet_library: Arc::new(library),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_invalid_settings_rejected() {
		let settings = Settings {
			position_step: 0,
			..Settings::default()
		};

		let result = Cms::builder().settings(settings).build();

		assert!(matches!(result, Err(CmsError::Config(_))));
	}

	#[tokio::test]
	async fn test_failed_operation_leaves_store_untouched() {
		let cms = Cms::builder().build().unwrap();

		let result = cms.grant(Target::Portal, "Ghost", "view").await;

		assert!(matches!(result, Err(CmsError::Validation(_))));
		assert!(cms.snapshot().await.permissions.grants.is_empty());
	}
}
