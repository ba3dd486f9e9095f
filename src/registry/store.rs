//! Cached accessors over the registry client.
//!
//! # Responsibilities
//! - Wrap config, template and router-domain fetches in SWR caches
//! - Apply per-domain filtering to the cached raw config
//! - Reroute the shared "500" template to per-domain overrides
//! - Warm all three caches on demand (one-way latch each)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{InMemoryCacheStore, SwrCache, SwrOptions};
use crate::registry::client::{FetchError, RegistryClient};
use crate::registry::filter;
use crate::registry::schema::{RegistryConfig, RenderedTemplate, ResolvedConfig, RouterDomain};
use crate::registry::template::{self, TemplateError};

/// Locale used when a request carries none.
pub const DEFAULT_LOCALE: &str = "en-US";

const CONFIG_KEY: &str = "config";
const DOMAINS_KEY: &str = "router_domains";
const ERROR_TEMPLATE: &str = "500";

/// Freshness windows for the three registry caches.
#[derive(Debug, Clone)]
pub struct RegistryTtls {
    pub config: Duration,
    pub template: Duration,
    pub router_domains: Duration,
}

impl Default for RegistryTtls {
    fn default() -> Self {
        Self {
            config: Duration::from_secs(5),
            template: Duration::from_secs(30),
            router_domains: Duration::from_secs(30),
        }
    }
}

/// Cached, domain-aware view of the remote registry.
pub struct RegistryStore {
    config_cache: SwrCache<RegistryConfig, FetchError>,
    template_cache: SwrCache<RenderedTemplate, TemplateError>,
    domains_cache: SwrCache<Vec<RouterDomain>, FetchError>,
    warmed_config: AtomicBool,
    warmed_templates: AtomicBool,
    warmed_domains: AtomicBool,
}

impl RegistryStore {
    /// Build a store over the given client with isolated in-memory caches.
    pub fn new(client: Arc<RegistryClient>, ttls: RegistryTtls) -> Self {
        let config_client = Arc::clone(&client);
        let config_cache = SwrCache::new(
            SwrOptions {
                name: "registry_config",
                ttl: ttls.config,
            },
            Arc::new(InMemoryCacheStore::new()),
            Arc::new(move |_key| {
                let client = Arc::clone(&config_client);
                Box::pin(async move { client.get_config().await })
            }),
        );

        let template_client = Arc::clone(&client);
        let template_cache = SwrCache::new(
            SwrOptions {
                name: "registry_template",
                ttl: ttls.template,
            },
            Arc::new(InMemoryCacheStore::new()),
            Arc::new(move |key: String| {
                let client = Arc::clone(&template_client);
                Box::pin(async move { produce_template(&client, &key).await })
            }),
        );

        let domains_client = Arc::clone(&client);
        let domains_cache = SwrCache::new(
            SwrOptions {
                name: "registry_router_domains",
                ttl: ttls.router_domains,
            },
            Arc::new(InMemoryCacheStore::new()),
            Arc::new(move |_key| {
                let client = Arc::clone(&domains_client);
                Box::pin(async move { client.get_router_domains().await })
            }),
        );

        Self {
            config_cache,
            template_cache,
            domains_cache,
            warmed_config: AtomicBool::new(false),
            warmed_templates: AtomicBool::new(false),
            warmed_domains: AtomicBool::new(false),
        }
    }

    /// Resolve the configuration for one domain.
    pub async fn get_config(&self, domain: Option<&str>) -> Result<ResolvedConfig, FetchError> {
        let raw = self.config_cache.get(CONFIG_KEY).await?;
        Ok(filter::filter_for_domain(&raw, domain))
    }

    /// Fetch a validated, slot-rewritten template.
    ///
    /// The shared "500" name is rerouted to the per-domain override before
    /// the cache lookup, so override and shared templates cache separately.
    pub async fn get_template(
        &self,
        name: &str,
        locale: &str,
        for_domain: &str,
    ) -> Result<Arc<RenderedTemplate>, TemplateError> {
        template::validate_name(name)?;

        let effective = if name == ERROR_TEMPLATE {
            self.error_template_for(for_domain).await?
        } else {
            name.to_string()
        };
        template::validate_name(&effective)?;

        let key = format!("{effective}|{locale}|{for_domain}");
        self.template_cache.get(&key).await
    }

    /// List the domains served by the gateway.
    pub async fn get_router_domains(&self) -> Result<Arc<Vec<RouterDomain>>, FetchError> {
        self.domains_cache.get(DOMAINS_KEY).await
    }

    /// Warm all three caches.
    ///
    /// Each cache carries a one-way latch: once it has warmed successfully,
    /// later calls skip it entirely. The latch is never reset.
    pub async fn preheat(&self) {
        if !self.warmed_config.load(Ordering::Acquire) {
            match self.config_cache.get(CONFIG_KEY).await {
                Ok(_) => self.warmed_config.store(true, Ordering::Release),
                Err(error) => tracing::warn!(error = %error, "config preheat failed"),
            }
        }

        if !self.warmed_domains.load(Ordering::Acquire) {
            match self.domains_cache.get(DOMAINS_KEY).await {
                Ok(_) => self.warmed_domains.store(true, Ordering::Release),
                Err(error) => tracing::warn!(error = %error, "router domains preheat failed"),
            }
        }

        if !self.warmed_templates.load(Ordering::Acquire) {
            match self.preheat_error_templates().await {
                Ok(()) => self.warmed_templates.store(true, Ordering::Release),
                Err(error) => tracing::warn!(error = %error, "template preheat failed"),
            }
        }
    }

    /// Warm the error template for every served domain.
    async fn preheat_error_templates(&self) -> Result<(), TemplateError> {
        let domains = self.domains_cache.get(DOMAINS_KEY).await?;
        if domains.is_empty() {
            self.get_template(ERROR_TEMPLATE, DEFAULT_LOCALE, "").await?;
            return Ok(());
        }
        for domain in domains.iter() {
            self.get_template(ERROR_TEMPLATE, DEFAULT_LOCALE, &domain.domain_name)
                .await?;
        }
        Ok(())
    }

    /// Resolve the "500" template name for a domain.
    async fn error_template_for(&self, for_domain: &str) -> Result<String, TemplateError> {
        let domains = self.domains_cache.get(DOMAINS_KEY).await?;
        let name = domains
            .iter()
            .find(|d| d.domain_name == for_domain)
            .and_then(|d| d.template_500.clone())
            .unwrap_or_else(|| ERROR_TEMPLATE.to_string());
        Ok(name)
    }
}

/// Producer behind the template cache: fetch, validate, rewrite.
async fn produce_template(
    client: &RegistryClient,
    key: &str,
) -> Result<RenderedTemplate, TemplateError> {
    let mut parts = key.splitn(3, '|');
    let name = parts.next().unwrap_or_default();
    let locale = parts.next().unwrap_or(DEFAULT_LOCALE);
    let domain = parts.next().unwrap_or_default();

    let raw = client.get_rendered_template(name, locale, domain).await?;
    template::ensure_document_structure(name, &raw.content)?;

    Ok(RenderedTemplate {
        content: template::rewrite_slots(&raw.content),
        style_refs: raw.style_refs,
    })
}
