use crate::error::StatsError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Key the whole-area total is published under in statistic mappings.
pub const TOTAL_KEY: &str = "Total";

/// District name carrying cases not yet assigned to a district.
pub const UNASSIGNED_DISTRICT: &str = "Unknown";

/// Numeric statistic shown by the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Confirmed,
    Active,
    Recovered,
    Deceased,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Confirmed,
        Metric::Active,
        Metric::Recovered,
        Metric::Deceased,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Confirmed => "confirmed",
            Metric::Active => "active",
            Metric::Recovered => "recovered",
            Metric::Deceased => "deceased",
        }
    }

    /// Next metric in display order, wrapping around
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StatsError::UnknownMetric(s.to_string()))
    }
}

/// Risk classification used by the categorical zone map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Red,
    Orange,
    Green,
}

impl Zone {
    pub const ALL: [Zone; 3] = [Zone::Red, Zone::Orange, Zone::Green];

    pub fn label(self) -> &'static str {
        match self {
            Zone::Red => "Red",
            Zone::Orange => "Orange",
            Zone::Green => "Green",
        }
    }
}

/// Statistics for one region, optionally nesting its districts.
///
/// Absent metrics deserialize as 0, which the renderer treats as "no data".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionStats {
    #[serde(default)]
    pub confirmed: f64,
    #[serde(default)]
    pub active: f64,
    #[serde(default)]
    pub recovered: f64,
    #[serde(default)]
    pub deceased: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<Zone>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub districts: HashMap<String, RegionStats>,
}

impl RegionStats {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Confirmed => self.confirmed,
            Metric::Active => self.active,
            Metric::Recovered => self.recovered,
            Metric::Deceased => self.deceased,
        }
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::Confirmed => self.confirmed = value,
            Metric::Active => self.active = value,
            Metric::Recovered => self.recovered = value,
            Metric::Deceased => self.deceased = value,
        }
    }

    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, value);
        self
    }
}

/// state -> (metric values | district -> metric values)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatisticMapping {
    states: HashMap<String, RegionStats>,
}

impl StatisticMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self, StatsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn insert(&mut self, state: impl Into<String>, stats: RegionStats) {
        self.states.insert(state.into(), stats);
    }

    pub fn state(&self, state: &str) -> Option<&RegionStats> {
        self.states.get(state)
    }

    pub fn district(&self, state: &str, district: &str) -> Option<&RegionStats> {
        self.states.get(state)?.districts.get(district)
    }

    /// Region value for a metric; missing regions read as 0
    pub fn value(&self, state: &str, district: Option<&str>, metric: Metric) -> f64 {
        let region = match district {
            Some(district) => self.district(state, district),
            None => self.state(state),
        };
        region.map(|r| r.value(metric)).unwrap_or(0.0)
    }

    /// Zone classification. Zones are published per district only.
    pub fn zone(&self, state: &str, district: Option<&str>) -> Option<Zone> {
        self.district(state, district?)?.zone
    }

    pub fn states(&self) -> impl Iterator<Item = (&str, &RegionStats)> {
        self.states.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Per-metric bounds computed over all regions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub max: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Aggregates {
    by_metric: HashMap<Metric, Aggregate>,
}

impl Aggregates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metric: Metric, aggregate: Aggregate) {
        self.by_metric.insert(metric, aggregate);
    }

    pub fn with(mut self, metric: Metric, max: f64, total: f64) -> Self {
        self.insert(metric, Aggregate { max, total });
        self
    }

    /// Bounds for a metric; unknown metrics read as zero
    pub fn get(&self, metric: Metric) -> Aggregate {
        self.by_metric.get(&metric).copied().unwrap_or_default()
    }

    /// Max and total over state-level values, skipping the whole-area
    /// [`TOTAL_KEY`] entry.
    pub fn from_mapping(mapping: &StatisticMapping) -> Self {
        let mut aggregates = Self::new();
        for metric in Metric::ALL {
            let mut agg = Aggregate::default();
            for (name, stats) in mapping.states() {
                if name == TOTAL_KEY {
                    continue;
                }
                let v = stats.value(metric);
                agg.max = agg.max.max(v);
                agg.total += v;
            }
            aggregates.insert(metric, agg);
        }
        aggregates
    }
}
