//! Scriptable Scanner/Cleaner doubles, the connector that hands them out, and
//! a recording notifier.

use async_trait::async_trait;
use cloudsweep_core::models::{CloudProvider, Resource, ResourceType, Tags};
use cloudsweep_core::providers::{
    Cleaner, Credentials, ProviderConnector, ProviderError, ProviderResult, Scanner,
};
use cloudsweep_core::messaging::{Notifier, SendNotificationPayload};
use cloudsweep_core::reporting::CleanupResult;
use cloudsweep_core::CloudSweepError;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

pub type DiscoverHook = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Scanner returning a fixed inventory
pub struct MockScanner {
    pub provider: CloudProvider,
    pub resources: Vec<Resource>,
    /// Native ids classified as unused
    pub unused: HashSet<String>,
    /// Native id -> (monthly cost, carbon kg)
    pub estimates: HashMap<String, (f64, f64)>,
    /// Native ids whose estimates fail
    pub failing_estimates: HashSet<String>,
    pub discover_error: Option<ProviderError>,
    pub classify_error: Option<ProviderError>,
    /// Runs inside `discover`, before it returns
    pub discover_hook: Option<DiscoverHook>,
}

impl MockScanner {
    pub fn new(provider: CloudProvider) -> Self {
        Self {
            provider,
            resources: Vec::new(),
            unused: HashSet::new(),
            estimates: HashMap::new(),
            failing_estimates: HashSet::new(),
            discover_error: None,
            classify_error: None,
            discover_hook: None,
        }
    }

    pub fn with_resource(
        mut self,
        resource_type: ResourceType,
        native_id: &str,
        region: &str,
        cost: f64,
        carbon: f64,
    ) -> Self {
        self.resources.push(Resource::new(
            self.provider,
            resource_type,
            native_id,
            region,
            format!("{native_id}-name"),
        ));
        self.estimates.insert(native_id.to_string(), (cost, carbon));
        self
    }

    pub fn with_unused(mut self, native_id: &str) -> Self {
        self.unused.insert(native_id.to_string());
        self
    }

    pub fn with_failing_estimate(mut self, native_id: &str) -> Self {
        self.failing_estimates.insert(native_id.to_string());
        self
    }

    pub fn with_discover_error(mut self, error: ProviderError) -> Self {
        self.discover_error = Some(error);
        self
    }

    pub fn with_classify_error(mut self, error: ProviderError) -> Self {
        self.classify_error = Some(error);
        self
    }

    pub fn with_discover_hook(mut self, hook: DiscoverHook) -> Self {
        self.discover_hook = Some(hook);
        self
    }

    fn estimate(&self, resource: &Resource) -> ProviderResult<(f64, f64)> {
        if self.failing_estimates.contains(&resource.resource_id) {
            return Err(ProviderError::api(self.provider, "pricing", "throttled"));
        }
        Ok(self
            .estimates
            .get(&resource.resource_id)
            .copied()
            .unwrap_or((0.0, 0.0)))
    }
}

#[async_trait]
impl Scanner for MockScanner {
    async fn discover(
        &self,
        regions: &[String],
        resource_types: &[ResourceType],
    ) -> ProviderResult<Vec<Resource>> {
        if let Some(hook) = &self.discover_hook {
            hook().await;
        }
        if let Some(error) = &self.discover_error {
            return Err(error.clone());
        }
        Ok(self
            .resources
            .iter()
            .filter(|r| regions.contains(&r.region))
            .filter(|r| resource_types.is_empty() || resource_types.contains(&r.resource_type))
            .map(|r| Resource::new(r.provider, r.resource_type, &r.resource_id, &r.region, &r.name))
            .collect())
    }

    async fn classify_unused(&self, resources: &mut [Resource]) -> ProviderResult<()> {
        if let Some(error) = &self.classify_error {
            return Err(error.clone());
        }
        for resource in resources.iter_mut() {
            if self.unused.contains(&resource.resource_id) {
                resource.mark_as_unused();
            }
        }
        Ok(())
    }

    async fn estimate_cost(&self, resource: &Resource) -> ProviderResult<f64> {
        self.estimate(resource).map(|(cost, _)| cost)
    }

    async fn estimate_carbon(&self, resource: &Resource) -> ProviderResult<f64> {
        self.estimate(resource).map(|(_, carbon)| carbon)
    }

    fn provider(&self) -> CloudProvider {
        self.provider
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanerCall {
    pub action: &'static str,
    pub resource_id: Uuid,
    pub tags: Option<Tags>,
}

/// Cleaner that records every call and succeeds unless told otherwise
pub struct MockCleaner {
    pub provider: CloudProvider,
    calls: Mutex<Vec<CleanerCall>>,
    /// Resources whose provider call errors
    erroring: Mutex<HashSet<Uuid>>,
    /// Resources whose provider call returns `success: false`
    declined: Mutex<HashSet<Uuid>>,
}

impl MockCleaner {
    pub fn new(provider: CloudProvider) -> Self {
        Self {
            provider,
            calls: Mutex::new(Vec::new()),
            erroring: Mutex::new(HashSet::new()),
            declined: Mutex::new(HashSet::new()),
        }
    }

    pub fn error_on(&self, resource_id: Uuid) {
        self.erroring.lock().insert(resource_id);
    }

    pub fn decline(&self, resource_id: Uuid) {
        self.declined.lock().insert(resource_id);
    }

    pub fn calls(&self) -> Vec<CleanerCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn record(
        &self,
        action: &'static str,
        resource: &Resource,
        tags: Option<Tags>,
    ) -> ProviderResult<CleanupResult> {
        self.calls.lock().push(CleanerCall {
            action,
            resource_id: resource.id,
            tags,
        });
        if self.erroring.lock().contains(&resource.id) {
            return Err(ProviderError::api(
                self.provider,
                action,
                format!("{} is protected", resource.resource_id),
            ));
        }
        if self.declined.lock().contains(&resource.id) {
            return Ok(CleanupResult::failed(resource.id, action, "dependency violation"));
        }
        Ok(CleanupResult::succeeded(
            resource.id,
            action,
            resource.monthly_cost,
            resource.carbon_footprint,
        ))
    }
}

#[async_trait]
impl Cleaner for MockCleaner {
    async fn delete(&self, resource: &Resource) -> ProviderResult<CleanupResult> {
        self.record("delete", resource, None)
    }

    async fn stop(&self, resource: &Resource) -> ProviderResult<CleanupResult> {
        self.record("stop", resource, None)
    }

    async fn tag(&self, resource: &Resource, tags: &Tags) -> ProviderResult<CleanupResult> {
        self.record("tag", resource, Some(tags.clone()))
    }

    fn provider(&self) -> CloudProvider {
        self.provider
    }
}

/// Connector handing out the configured doubles. A missing double makes
/// creation fail with invalid credentials.
pub struct MockConnector {
    pub provider: CloudProvider,
    pub scanner: Option<Arc<MockScanner>>,
    pub cleaner: Option<Arc<MockCleaner>>,
    seen_credentials: Mutex<Vec<Credentials>>,
}

impl MockConnector {
    pub fn new(provider: CloudProvider) -> Self {
        Self {
            provider,
            scanner: None,
            cleaner: None,
            seen_credentials: Mutex::new(Vec::new()),
        }
    }

    pub fn with_scanner(mut self, scanner: MockScanner) -> Self {
        self.scanner = Some(Arc::new(scanner));
        self
    }

    pub fn with_cleaner(mut self, cleaner: Arc<MockCleaner>) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    pub fn seen_credentials(&self) -> Vec<Credentials> {
        self.seen_credentials.lock().clone()
    }
}

#[async_trait]
impl ProviderConnector for MockConnector {
    fn provider(&self) -> CloudProvider {
        self.provider
    }

    async fn scanner(&self, credentials: &Credentials) -> ProviderResult<Arc<dyn Scanner>> {
        self.seen_credentials.lock().push(credentials.clone());
        match &self.scanner {
            Some(scanner) => Ok(scanner.clone() as Arc<dyn Scanner>),
            None => Err(ProviderError::credentials_invalid(self.provider, "no scanner configured")),
        }
    }

    async fn cleaner(&self, credentials: &Credentials) -> ProviderResult<Arc<dyn Cleaner>> {
        self.seen_credentials.lock().push(credentials.clone());
        match &self.cleaner {
            Some(cleaner) => Ok(cleaner.clone() as Arc<dyn Cleaner>),
            None => Err(ProviderError::credentials_invalid(self.provider, "access denied")),
        }
    }
}

/// Notifier that keeps every notification it was asked to deliver
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SendNotificationPayload>>,
    failing: std::sync::atomic::AtomicBool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier
            .failing
            .store(true, std::sync::atomic::Ordering::SeqCst);
        notifier
    }

    pub fn sent(&self) -> Vec<SendNotificationPayload> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &SendNotificationPayload) -> cloudsweep_core::Result<()> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(CloudSweepError::UnsupportedOperation(
                "smtp relay unavailable".to_string(),
            ));
        }
        self.sent.lock().push(notification.clone());
        Ok(())
    }
}
