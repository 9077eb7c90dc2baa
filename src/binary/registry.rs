// Copyright 2025 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Name to instance resolution for makers and compressors
//!
//! Each registry owns a static table of `(name, shortcut, constructor)` and a
//! process-wide cache of built instances. Lookups take the read lock only;
//! a miss takes the dedicated write mutex, checks the cache again and then
//! inserts, so concurrent first resolutions of one name build it once.

use crate::error::{CodecError, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

pub(crate) struct RegistryEntry<T: ?Sized + 'static> {
    pub name: &'static str,
    pub shortcut: &'static str,
    pub build: fn() -> Arc<T>,
}

pub(crate) struct Registry<T: ?Sized + 'static> {
    kind: &'static str,
    entries: &'static [RegistryEntry<T>],
    cache: RwLock<BTreeMap<String, Arc<T>>>,
    write_lock: Mutex<()>,
}

impl<T: ?Sized + 'static> Registry<T> {
    pub(crate) const fn new(kind: &'static str, entries: &'static [RegistryEntry<T>]) -> Self {
        Self {
            kind,
            entries,
            cache: RwLock::new(BTreeMap::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Short code for a full name; unknown names pass through.
    pub(crate) fn shortcut<'a>(&self, name: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.shortcut)
            .unwrap_or(name)
    }

    /// Full name for a short code; unknown codes pass through.
    pub(crate) fn from_shortcut<'a>(&self, shortcut: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|entry| entry.shortcut == shortcut)
            .map(|entry| entry.name)
            .unwrap_or(shortcut)
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|entry| entry.name)
    }

    fn cached(&self, name: &str) -> Option<Arc<T>> {
        self.cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }

    /// Resolve a full name or shortcut into a shared instance.
    pub(crate) fn get(&self, name: &str) -> Result<Arc<T>> {
        let name = self.from_shortcut(name);
        if let Some(found) = self.cached(name) {
            return Ok(found);
        }

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(found) = self.cached(name) {
            return Ok(found);
        }

        let entry = self
            .entries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| CodecError::Resolution(format!("Unknown {} '{}'", self.kind, name)))?;
        let instance = (entry.build)();
        self.cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string(), Arc::clone(&instance));
        debug!("Resolved {} '{}'", self.kind, name);
        Ok(instance)
    }
}
