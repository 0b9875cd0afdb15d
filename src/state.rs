use catalog_search::cache::SearchCache;
use catalog_search::catalog::CatalogStore;
use catalog_search::config::AppConfig;
use catalog_search::search::SearchEngine;
use std::time::Duration;

/// Catalog behind the HTTP surface / 服务使用的目录存储
pub type SharedCatalog = Box<dyn CatalogStore>;

/// Shared application state / 应用共享状态
pub struct AppState {
    pub engine: SearchEngine<SharedCatalog>,
    pub cache: SearchCache,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(store: SharedCatalog, config: AppConfig) -> Self {
        let engine = SearchEngine::new(store).with_entity_cap(config.search.entity_cap);
        let cache = SearchCache::new(
            Duration::from_secs(config.search.cache_ttl_secs),
            config.search.cache_capacity,
        );
        Self {
            engine,
            cache,
            config,
        }
    }
}
