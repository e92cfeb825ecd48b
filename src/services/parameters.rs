use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::core::filters::normalize_material;
use crate::core::formula::SpineFormula;
use crate::models::{BowType, CalculationSource, MaterialProperties};
use crate::services::cache::{CacheKey, CacheStats, ParameterCache};
use crate::services::config_store::{
    ConfigStore, ConfigStoreError, FlightDiagnostics, ParameterCategory, ParameterMap,
};
use crate::services::defaults::{self, *};

/// A looked-up value and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: CalculationSource,
}

impl<T> Resolved<T> {
    pub fn configured(value: T) -> Self {
        Self {
            value,
            source: CalculationSource::Configured,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            source: CalculationSource::DefaultFallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == CalculationSource::DefaultFallback
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        Resolved {
            value: f(self.value),
            source: self.source,
        }
    }
}

impl<T> Resolved<Option<T>> {
    pub fn unwrap_or(self, value: T) -> Resolved<T> {
        self.map(|resolved| resolved.unwrap_or(value))
    }
}

/// Merge a store fetch with the built-in default
///
/// | fetched        | default | result                      |
/// |----------------|---------|-----------------------------|
/// | `Ok(Some(v))`  | any     | `v`, configured             |
/// | `Ok(None)`     | `Some`  | default, fallback           |
/// | `Ok(None)`     | `None`  | `None`, configured          |
/// | `Err(_)`       | any     | default, fallback           |
///
/// Never fails; store errors are logged and absorbed here.
pub fn resolve_or_default<T, E>(
    key: &str,
    fetched: Result<Option<T>, E>,
    default: Option<T>,
) -> Resolved<Option<T>>
where
    E: fmt::Display,
{
    match fetched {
        Ok(Some(value)) => Resolved::configured(Some(value)),
        Ok(None) => match default {
            Some(value) => {
                tracing::debug!("Parameter '{}' not configured, using built-in default", key);
                Resolved::fallback(Some(value))
            }
            None => Resolved::configured(None),
        },
        Err(e) => {
            tracing::warn!("Configuration store lookup for '{}' failed: {}; using built-in default", key, e);
            Resolved::fallback(default)
        }
    }
}

/// Tunable calculation parameters, backed by a configuration store with a
/// TTL cache in front and built-in defaults behind
pub struct CalculationConfigProvider {
    store: Arc<dyn ConfigStore>,
    cache: ParameterCache,
}

impl CalculationConfigProvider {
    pub fn new(store: Arc<dyn ConfigStore>, cache: ParameterCache) -> Self {
        Self { store, cache }
    }

    /// Provider with a small five-minute cache
    pub fn with_store(store: Arc<dyn ConfigStore>) -> Self {
        Self::new(store, ParameterCache::new(256, 300))
    }

    /// Spine formula factors; any unusable stored value is replaced by its default
    pub fn formula(&self) -> Resolved<SpineFormula> {
        let stock = SpineFormula::default();

        let draw_weight_factor = self.base_parameter(DRAW_WEIGHT_FACTOR, stock.draw_weight_factor);
        let length_adjustment_factor =
            self.base_parameter(LENGTH_ADJUSTMENT_FACTOR, stock.length_adjustment_factor);
        let point_weight_factor = self.base_parameter(POINT_WEIGHT_FACTOR, stock.point_weight_factor);
        let reference_length = self.base_parameter(REFERENCE_LENGTH, stock.reference_length);
        let reference_point_weight =
            self.base_parameter(REFERENCE_POINT_WEIGHT, stock.reference_point_weight);

        let source = [
            draw_weight_factor.source,
            length_adjustment_factor.source,
            point_weight_factor.source,
            reference_length.source,
            reference_point_weight.source,
        ]
        .into_iter()
        .fold(CalculationSource::Configured, CalculationSource::combine);

        Resolved {
            value: SpineFormula {
                draw_weight_factor: draw_weight_factor.value,
                length_adjustment_factor: length_adjustment_factor.value,
                point_weight_factor: point_weight_factor.value,
                reference_length: reference_length.value,
                reference_point_weight: reference_point_weight.value,
            },
            source,
        }
    }

    /// Fractional half-width of the spine window, clamped to [0.005, 0.5]
    pub fn spine_tolerance(&self) -> Resolved<f64> {
        self.base_parameter(SPINE_TOLERANCE, DEFAULT_SPINE_TOLERANCE)
            .map(|tolerance| tolerance.clamp(0.005, 0.5))
    }

    pub fn bow_type_adjustment(&self, bow_type: BowType) -> Resolved<f64> {
        self.bow_parameter(&bow_adjustment_key(bow_type)).unwrap_or(0.0)
    }

    /// Shaft diameter typical for the bow type, used for tie-breaking
    pub fn reference_diameter(&self, bow_type: BowType) -> Resolved<f64> {
        self.bow_parameter(&reference_diameter_key(bow_type))
            .unwrap_or(DEFAULT_REFERENCE_DIAMETER)
    }

    /// Adjustment for a free-form style tag. Unknown styles adjust nothing.
    pub fn shooting_style_adjustment(&self, bow_type: BowType, style: &str) -> Resolved<f64> {
        let key = shooting_style_key(bow_type, style);
        let fetched = self
            .fetch_parameters(ParameterCategory::ShootingStyleAdjustments)
            .map(|map| map.get(&key).copied().filter(|value| value.is_finite()));
        let default = defaults::shooting_style_adjustments().get(&key).copied();

        resolve_or_default(&key, fetched, default).unwrap_or(0.0)
    }

    /// Data sheet for a material name in any spelling. `None` when neither
    /// the store nor the built-in table knows it.
    pub fn material_properties(&self, material: &str) -> Resolved<Option<MaterialProperties>> {
        let key = normalize_material(material);
        let fetched = self
            .cached(&CacheKey::material(&key), || {
                self.store.get_material_properties(Some(material))
            })
            // Stores may hand back more than was asked for
            .map(|found| {
                found
                    .into_iter()
                    .find(|(name, _)| normalize_material(name) == key)
                    .map(|(_, properties)| properties)
                    .filter(is_usable_material)
            });
        let default = defaults::materials().remove(&key);

        resolve_or_default(&key, fetched, default)
    }

    /// `(factor − 1) × material_adjustment_scale`, rounded to 0.01
    pub fn material_adjustment(&self, material: &str) -> Resolved<f64> {
        let properties = self.material_properties(material);
        let Some(factor) = properties.value.as_ref().map(|p| p.spine_adjustment_factor) else {
            return properties.map(|_| 0.0);
        };

        let scale = self.base_parameter(MATERIAL_ADJUSTMENT_SCALE, DEFAULT_MATERIAL_ADJUSTMENT_SCALE);
        let adjustment = ((factor - 1.0) * scale.value * 100.0).round() / 100.0;

        Resolved {
            value: adjustment,
            source: properties.source.combine(scale.source),
        }
    }

    pub fn material_min_spine_options(&self, material: &str) -> Resolved<Option<usize>> {
        self.material_properties(material)
            .map(|properties| properties.map(|p| p.min_spine_options))
    }

    pub fn flight_problem_diagnostics(&self) -> Resolved<FlightDiagnostics> {
        let fetched = self
            .cached(&CacheKey::flight_problems(), || {
                self.store.get_flight_problem_diagnostics()
            })
            .map(|diagnostics| Some(diagnostics).filter(|d| !d.is_empty()));

        resolve_or_default("flight_problems", fetched, Some(defaults::flight_problems()))
            .map(Option::unwrap_or_default)
    }

    /// Category → explanation for one symptom such as "nock left"
    pub fn diagnose(&self, symptom: &str) -> Option<BTreeMap<String, String>> {
        let key: String = symptom
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
            .collect();

        self.flight_problem_diagnostics().value.remove(&key)
    }

    /// Forget every cached lookup
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn base_parameter(&self, key: &str, builtin: f64) -> Resolved<f64> {
        let fetched = self
            .fetch_parameters(ParameterCategory::BaseCalculation)
            .map(|map| map.get(key).copied().filter(|value| is_usable_base_parameter(key, *value)));

        resolve_or_default(key, fetched, Some(builtin)).unwrap_or(builtin)
    }

    fn bow_parameter(&self, key: &str) -> Resolved<Option<f64>> {
        let fetched = self
            .fetch_parameters(ParameterCategory::BowAdjustments)
            .map(|map| map.get(key).copied().filter(|value| value.is_finite()));
        let default = defaults::bow_adjustments().get(key).copied();

        resolve_or_default(key, fetched, default)
    }

    fn fetch_parameters(&self, category: ParameterCategory) -> Result<ParameterMap, ConfigStoreError> {
        self.cached(&CacheKey::parameters(category), || {
            self.store.get_calculation_parameters(category)
        })
    }

    /// Serve from cache, else fetch and cache. Failures are never cached.
    fn cached<T, F>(&self, key: &str, fetch: F) -> Result<T, ConfigStoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, ConfigStoreError>,
    {
        if let Ok(value) = self.cache.get(key) {
            return Ok(value);
        }

        let value = fetch()?;
        if let Err(e) = self.cache.set(key, &value) {
            tracing::debug!("Failed to cache '{}': {}", key, e);
        }
        Ok(value)
    }
}

fn is_usable_base_parameter(key: &str, value: f64) -> bool {
    if !value.is_finite() {
        return false;
    }
    match key {
        DRAW_WEIGHT_FACTOR | REFERENCE_LENGTH | REFERENCE_POINT_WEIGHT | SPINE_TOLERANCE => value > 0.0,
        _ => value >= 0.0,
    }
}

fn is_usable_material(properties: &MaterialProperties) -> bool {
    properties.spine_adjustment_factor.is_finite()
        && properties.spine_adjustment_factor > 0.0
        && properties.min_spine_options >= 1
}
