//! Named parameter collection
//!
//! [`ParameterSet`] is the map handed to the forward model: every physical
//! and dimensionless input addressed by name. It owns one derived value,
//! `LfD`, which follows `Lf / L` whenever either of them is written through
//! [`ParameterSet::set`].

use crate::parameters::names;
use crate::parameters::parameter::FitParameter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well lengths at or below this are treated as absent.
const MIN_WELL_LENGTH: f64 = 1e-9;

/// Mapping from parameter name to value, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, f64>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from fit-table rows, deriving `LfD` from `Lf` and `L`.
    pub fn from_fit_parameters(params: &[FitParameter]) -> Self {
        let mut set: Self = params
            .iter()
            .map(|p| (p.name().to_string(), p.value()))
            .collect();
        if set.contains(names::L) || set.contains(names::LF) {
            set.refresh_lfd();
        }
        set
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Value of `name`, or `default` when absent
    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Insert or overwrite a value, keeping `LfD` consistent.
    ///
    /// # Examples
    ///
    /// ```
    /// use shale_welltest::parameters::ParameterSet;
    ///
    /// let mut set = ParameterSet::new();
    /// set.set("L", 1000.0);
    /// set.set("Lf", 100.0);
    /// assert_eq!(set.get("LfD"), Some(0.1));
    ///
    /// set.set("L", 0.0);
    /// assert_eq!(set.get("LfD"), Some(0.0));
    /// ```
    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
        if name == names::L || name == names::LF {
            self.refresh_lfd();
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        let removed = self.values.remove(name);
        if removed.is_some() && (name == names::L || name == names::LF) {
            self.refresh_lfd();
        }
        removed
    }

    /// Recompute `LfD` from `Lf` and `L`.
    ///
    /// A missing or zero `L` forces `LfD = 0`. With `L` present but `Lf`
    /// missing there is nothing to derive from and `LfD` is left alone.
    pub fn refresh_lfd(&mut self) {
        match (self.get(names::L), self.get(names::LF)) {
            (Some(l), Some(lf)) if l > MIN_WELL_LENGTH => {
                self.values.insert(names::LFD.to_string(), lf / l);
            }
            (Some(l), _) if l > MIN_WELL_LENGTH => {}
            _ => {
                self.values.insert(names::LFD.to_string(), 0.0);
            }
        }
    }

    /// Copy values back into the matching fit-table rows (clamped into
    /// each row's bounds). Names without a row are ignored.
    pub fn write_to(&self, params: &mut [FitParameter]) {
        for param in params.iter_mut() {
            if let Some(value) = self.get(param.name()) {
                param.set_value_clamped(value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, f64)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, f64)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}
