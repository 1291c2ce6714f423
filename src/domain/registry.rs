//! Indicator registry and dependency ordering.
//!
//! The registry keeps indicators in registration order and maintains a
//! depth-first topological order over all of them: each indicator comes after
//! everything it requires. Requirements naming unregistered indicators are
//! skipped. A dependency cycle is rejected at registration time.

use crate::domain::context::keys;
use crate::domain::error::{LookupKind, PostesterError, ValidationError};
use crate::domain::indicator::{Indicator, builtin_indicators};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

/// Registry handle shared between engines.
pub type SharedRegistry = Arc<RwLock<IndicatorRegistry>>;

static GLOBAL: OnceLock<SharedRegistry> = OnceLock::new();

/// Process-wide registry holding the built-ins, created on first use.
pub fn global_registry() -> SharedRegistry {
    Arc::clone(GLOBAL.get_or_init(|| share(IndicatorRegistry::with_builtins())))
}

pub fn share(registry: IndicatorRegistry) -> SharedRegistry {
    Arc::new(RwLock::new(registry))
}

pub(crate) fn read(registry: &SharedRegistry) -> RwLockReadGuard<'_, IndicatorRegistry> {
    registry.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write(registry: &SharedRegistry) -> RwLockWriteGuard<'_, IndicatorRegistry> {
    registry.write().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct IndicatorRegistry {
    indicators: Vec<Arc<dyn Indicator>>,
    sorted: Vec<String>,
}

impl IndicatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in indicator.
    pub fn with_builtins() -> Self {
        Self::from_indicators(builtin_indicators())
            .expect("built-in indicators have no dependency cycles")
    }

    pub fn from_indicators<I>(indicators: I) -> Result<Self, PostesterError>
    where
        I: IntoIterator<Item = Arc<dyn Indicator>>,
    {
        let mut registry = Self::new();
        for indicator in indicators {
            registry.register(indicator)?;
        }
        Ok(registry)
    }

    /// Add an indicator, or replace the one with the same name in place, and
    /// recompute the evaluation order. Names of seeded context quantities are
    /// rejected. On a dependency cycle the registry is left unchanged.
    pub fn register(&mut self, indicator: Arc<dyn Indicator>) -> Result<(), PostesterError> {
        let name = indicator.name().to_string();
        if keys::is_reserved(&name) {
            return Err(ValidationError::ReservedName { name }
                .into_invalid_argument("indicator registration"));
        }
        let replaced = match self.indicators.iter().position(|i| i.name() == name) {
            Some(pos) => Some((pos, std::mem::replace(&mut self.indicators[pos], indicator))),
            None => {
                self.indicators.push(indicator);
                None
            }
        };

        match dependency_order(&self.indicators) {
            Ok(sorted) => {
                self.sorted = sorted;
                debug!(
                    indicator = %name,
                    replaced = replaced.is_some(),
                    total = self.indicators.len(),
                    "registered indicator"
                );
                Ok(())
            }
            Err(err) => {
                match replaced {
                    Some((pos, old)) => self.indicators[pos] = old,
                    None => {
                        self.indicators.pop();
                    }
                }
                Err(err)
            }
        }
    }

    /// Registered names in lexical order.
    pub fn available_indicators(&self) -> Vec<String> {
        self.indicators
            .iter()
            .map(|i| i.name().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Every registered name in dependency order.
    pub fn sorted_indicators(&self) -> &[String] {
        &self.sorted
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indicator(name).is_some()
    }

    pub fn indicator(&self, name: &str) -> Option<&Arc<dyn Indicator>> {
        self.indicators.iter().find(|i| i.name() == name)
    }

    pub fn get_indicator(&self, name: &str) -> Result<Arc<dyn Indicator>, PostesterError> {
        self.indicator(name)
            .cloned()
            .ok_or_else(|| PostesterError::not_found(LookupKind::Indicator, name))
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }
}

fn dependency_order(indicators: &[Arc<dyn Indicator>]) -> Result<Vec<String>, PostesterError> {
    let index: HashMap<&str, &Arc<dyn Indicator>> =
        indicators.iter().map(|i| (i.name(), i)).collect();
    let mut state = Visit {
        index,
        done: HashSet::new(),
        path: Vec::new(),
        order: Vec::with_capacity(indicators.len()),
    };
    for indicator in indicators {
        state.visit(indicator.name())?;
    }
    Ok(state.order)
}

struct Visit<'a> {
    index: HashMap<&'a str, &'a Arc<dyn Indicator>>,
    done: HashSet<&'a str>,
    /// Names whose requirements are being visited.
    path: Vec<&'a str>,
    order: Vec<String>,
}

impl<'a> Visit<'a> {
    fn visit(&mut self, name: &'a str) -> Result<(), PostesterError> {
        if self.done.contains(name) {
            return Ok(());
        }
        if let Some(start) = self.path.iter().position(|&p| p == name) {
            let mut path: Vec<String> = self.path[start..].iter().map(|s| s.to_string()).collect();
            path.push(name.to_string());
            return Err(PostesterError::DependencyCycle { path });
        }

        let Some(&indicator) = self.index.get(name) else {
            return Ok(());
        };

        self.path.push(name);
        for dep in indicator.requires() {
            if self.index.contains_key(dep) {
                self.visit(dep)?;
            } else {
                warn!(indicator = name, dependency = dep, "dependency not registered, skipping");
            }
        }
        self.path.pop();

        self.done.insert(name);
        self.order.push(name.to_string());
        Ok(())
    }
}
