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

//! Built-in admission plugins.

pub mod adddefaultfields;
pub mod admit;
pub mod deny;
pub mod denybyname;

use crate::admission::{AdmissionResult, Plugins};

/// All built-in plugins in execution order.
pub const ALL_ORDERED_PLUGINS: &[&str] = &[
    admit::PLUGIN_NAME,
    adddefaultfields::PLUGIN_NAME,
    denybyname::PLUGIN_NAME,
    // deny must go at the end
    deny::PLUGIN_NAME,
];

/// Register all built-in admission plugins, in execution order.
pub fn register_all_admission_plugins(plugins: &mut Plugins) -> AdmissionResult<()> {
    admit::register(plugins)?;
    adddefaultfields::register(plugins)?;
    denybyname::register(plugins)?;
    deny::register(plugins)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_follows_execution_order() {
        let mut plugins = Plugins::new();
        register_all_admission_plugins(&mut plugins).unwrap();
        let sealed = plugins.seal();
        assert_eq!(sealed.registered_names(), ALL_ORDERED_PLUGINS.to_vec());
    }

    #[test]
    fn test_registering_twice_fails() {
        let mut plugins = Plugins::new();
        register_all_admission_plugins(&mut plugins).unwrap();
        assert!(register_all_admission_plugins(&mut plugins).is_err());
    }
}
