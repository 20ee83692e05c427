// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! A read-only registry of currencies indexed by identifier and by symbol.

use std::sync::Arc;

use ahash::AHashMap;
use ustr::Ustr;

use crate::types::{Currency, SharedCurrency};

/// A read-only registry of currencies indexed by identifier and by symbol.
///
/// The registry always contains the US dollar. When several currencies share a symbol the first
/// one registered is returned by [`CurrencyRegistry::get_by_symbol`].
#[derive(Clone, Debug)]
pub struct CurrencyRegistry {
    currencies: Vec<SharedCurrency>,
    by_id: AHashMap<Ustr, SharedCurrency>,
    by_symbol: AHashMap<Ustr, SharedCurrency>,
}

impl CurrencyRegistry {
    /// Creates a new [`CurrencyRegistry`] from the given currencies.
    ///
    /// Duplicate identifiers are skipped, keeping the first occurrence.
    pub fn new<I>(currencies: I) -> Self
    where
        I: IntoIterator<Item = Currency>,
    {
        Self::from_shared(currencies.into_iter().map(Arc::new))
    }

    /// Creates a new [`CurrencyRegistry`] from already shared currencies.
    pub fn from_shared<I>(currencies: I) -> Self
    where
        I: IntoIterator<Item = SharedCurrency>,
    {
        let mut registry = Self {
            currencies: Vec::new(),
            by_id: AHashMap::new(),
            by_symbol: AHashMap::new(),
        };

        registry.insert(Currency::USD());
        for currency in currencies {
            registry.insert(currency);
        }

        log::debug!("Built currency registry with {} currencies", registry.len());
        registry
    }

    fn insert(&mut self, currency: SharedCurrency) {
        if self.by_id.contains_key(&currency.id) {
            log::warn!("Skipping duplicate currency id '{}'", currency.id);
            return;
        }

        if let Some(existing) = self.by_symbol.get(&currency.symbol) {
            log::debug!(
                "Symbol '{}' already registered for '{}', '{}' only reachable by id",
                currency.symbol,
                existing.id,
                currency.id,
            );
        } else {
            self.by_symbol.insert(currency.symbol, currency.clone());
        }

        self.by_id.insert(currency.id, currency.clone());
        self.currencies.push(currency);
    }

    /// Returns the currency with the given identifier.
    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&SharedCurrency> {
        self.by_id.get(&Ustr::from(id))
    }

    /// Returns the first registered currency with the given symbol.
    #[must_use]
    pub fn get_by_symbol(&self, symbol: &str) -> Option<&SharedCurrency> {
        self.by_symbol.get(&Ustr::from(symbol))
    }

    /// Returns the currency matching `key` by identifier, then by symbol.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SharedCurrency> {
        self.get_by_id(key).or_else(|| self.get_by_symbol(key))
    }

    /// Returns the US dollar currency.
    #[must_use]
    pub fn usd(&self) -> SharedCurrency {
        Currency::USD()
    }

    /// Returns an iterator over all currencies in registration order, starting with USD.
    pub fn iter(&self) -> impl Iterator<Item = &SharedCurrency> {
        self.currencies.iter()
    }

    /// Returns the number of registered currencies, including USD.
    #[must_use]
    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    /// Returns true if only USD is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.currencies.len() <= 1
    }
}

impl Default for CurrencyRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
