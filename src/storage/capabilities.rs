// Copyright 2024 The Kubernetes Authors.
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

//! Capability sets and probing.

use super::Storage;
use std::fmt;

/// Capability is one optional behavior a storage may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Get,
    List,
    Watch,
    Table,
    ReadinessCheck,
    Scope,
    SingularName,
    Create,
    Update,
    Delete,
}

impl Capability {
    pub const ALL: [Capability; 10] = [
        Capability::Get,
        Capability::List,
        Capability::Watch,
        Capability::Table,
        Capability::ReadinessCheck,
        Capability::Scope,
        Capability::SingularName,
        Capability::Create,
        Capability::Update,
        Capability::Delete,
    ];

    /// Returns the bitflag for this capability.
    pub const fn as_set(self) -> Capabilities {
        match self {
            Self::Get => Capabilities::GET,
            Self::List => Capabilities::LIST,
            Self::Watch => Capabilities::WATCH,
            Self::Table => Capabilities::TABLE,
            Self::ReadinessCheck => Capabilities::READINESS_CHECK,
            Self::Scope => Capabilities::SCOPE,
            Self::SingularName => Capabilities::SINGULAR_NAME,
            Self::Create => Capabilities::CREATE,
            Self::Update => Capabilities::UPDATE,
            Self::Delete => Capabilities::DELETE,
        }
    }

    /// Verb used in unsupported-operation messages.
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::List => "list",
            Self::Watch => "watch",
            Self::Table => "table conversion",
            Self::ReadinessCheck => "readiness check",
            Self::Scope => "scoping",
            Self::SingularName => "singular name",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.verb())
    }
}

bitflags::bitflags! {
    /// A set of storage capabilities.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u32 {
        const GET = 1 << 0;
        const LIST = 1 << 1;
        const WATCH = 1 << 2;
        const TABLE = 1 << 3;
        const READINESS_CHECK = 1 << 4;
        const SCOPE = 1 << 5;
        const SINGULAR_NAME = 1 << 6;
        const CREATE = 1 << 7;
        const UPDATE = 1 << 8;
        const DELETE = 1 << 9;

        /// Every capability that does not change stored data.
        const READ_ONLY = Self::GET.bits()
            | Self::LIST.bits()
            | Self::WATCH.bits()
            | Self::TABLE.bits()
            | Self::READINESS_CHECK.bits()
            | Self::SCOPE.bits()
            | Self::SINGULAR_NAME.bits();

        const WRITE = Self::CREATE.bits() | Self::UPDATE.bits() | Self::DELETE.bits();
    }
}

impl Capabilities {
    /// Returns true if the set contains `capability`.
    pub fn supports(&self, capability: Capability) -> bool {
        self.contains(capability.as_set())
    }

    /// Lists the individual capabilities in the set.
    pub fn to_vec(&self) -> Vec<Capability> {
        Capability::ALL
            .iter()
            .copied()
            .filter(|c| self.supports(*c))
            .collect()
    }
}

impl From<Capability> for Capabilities {
    fn from(cap: Capability) -> Self {
        cap.as_set()
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = Capabilities::empty();
        for cap in iter {
            set |= cap.as_set();
        }
        set
    }
}

/// Reports which optional capabilities `storage` advertises.
pub fn probe(storage: &dyn Storage) -> Capabilities {
    let mut caps = Capabilities::empty();
    caps.set(Capabilities::GET, storage.as_getter().is_some());
    caps.set(Capabilities::LIST, storage.as_lister().is_some());
    caps.set(Capabilities::WATCH, storage.as_watcher().is_some());
    caps.set(Capabilities::TABLE, storage.as_table_convertor().is_some());
    caps.set(
        Capabilities::READINESS_CHECK,
        storage.as_readiness_checker().is_some(),
    );
    caps.set(Capabilities::SCOPE, storage.as_scoper().is_some());
    caps.set(
        Capabilities::SINGULAR_NAME,
        storage.as_singular_namer().is_some(),
    );
    caps.set(Capabilities::CREATE, storage.as_creater().is_some());
    caps.set(Capabilities::UPDATE, storage.as_updater().is_some());
    caps.set(Capabilities::DELETE, storage.as_deleter().is_some());
    caps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GroupVersionKind;

    struct Bare;

    impl Storage for Bare {
        fn object_kind(&self) -> GroupVersionKind {
            GroupVersionKind::new("", "v1", "ConfigMap")
        }

        fn destroy(&self) {}
    }

    #[test]
    fn test_bare_storage_has_no_capabilities() {
        assert_eq!(probe(&Bare), Capabilities::empty());
    }

    #[test]
    fn test_read_only_excludes_writes() {
        assert!(!Capabilities::READ_ONLY.intersects(Capabilities::WRITE));
        assert_eq!(
            Capabilities::READ_ONLY | Capabilities::WRITE,
            Capabilities::all()
        );
    }

    #[test]
    fn test_from_iter_and_to_vec() {
        let caps: Capabilities = [Capability::List, Capability::Get].into_iter().collect();
        assert!(caps.supports(Capability::Get));
        assert!(!caps.supports(Capability::Watch));
        assert_eq!(caps.to_vec(), vec![Capability::Get, Capability::List]);
    }
}
