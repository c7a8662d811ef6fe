//! Resolution counters and the container statistics snapshot.

use std::time::Duration;

use serde::Serialize;

/// Counters collected by the resolver across top-level resolutions.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ResolverMetrics {
    /// Top-level `get_instance`/`invoke` calls
    pub total_resolutions: u64,
    pub successful_resolutions: u64,
    pub failed_resolutions: u64,
    /// Slots served from the singleton cache, nested lookups included
    pub cache_hits: u64,
    /// Slots actually built (constructor, factory or redirect)
    pub constructions: u64,
    /// Parameters that fell back to their declared default after a failed lookup
    pub default_fallbacks: u64,
    pub cycles_detected: u64,
    pub max_resolution_depth: usize,
    pub total_resolution_time: Duration,
    pub max_resolution_time: Duration,
}

impl ResolverMetrics {
    pub fn success_rate(&self) -> f64 {
        if self.total_resolutions > 0 {
            (self.successful_resolutions as f64 / self.total_resolutions as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn avg_resolution_time(&self) -> Duration {
        if self.total_resolutions > 0 {
            let nanos = self.total_resolution_time.as_nanos() / u128::from(self.total_resolutions);
            Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
        } else {
            Duration::ZERO
        }
    }

    pub(crate) fn record_outcome(&mut self, ok: bool, elapsed: Duration, depth: usize) {
        self.total_resolutions += 1;
        if ok {
            self.successful_resolutions += 1;
        } else {
            self.failed_resolutions += 1;
        }
        self.total_resolution_time += elapsed;
        self.max_resolution_time = self.max_resolution_time.max(elapsed);
        self.max_resolution_depth = self.max_resolution_depth.max(depth);
    }
}

/// Point-in-time view of a container for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerStats {
    pub name: String,
    pub registrations: usize,
    pub cached_instances: usize,
    pub resolver: ResolverMetrics,
}

impl ContainerStats {
    pub fn report(&self) -> String {
        format!(
            "=== Container '{}' ===\n\
             Registrations: {}\n\
             Cached instances: {}\n\
             Resolutions: {} ({:.1}% successful, {} failed)\n\
             Cache hits: {}\n\
             Constructions: {}\n\
             Default fallbacks: {}\n\
             Cycles detected: {}\n\
             Max depth: {}\n\
             Average resolution time: {:?}",
            self.name,
            self.registrations,
            self.cached_instances,
            self.resolver.total_resolutions,
            self.resolver.success_rate(),
            self.resolver.failed_resolutions,
            self.resolver.cache_hits,
            self.resolver.constructions,
            self.resolver.default_fallbacks,
            self.resolver.cycles_detected,
            self.resolver.max_resolution_depth,
            self.resolver.avg_resolution_time(),
        )
    }
}
