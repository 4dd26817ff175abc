//! Registry of named strategy profiles.

use tracing::{debug, info};

use crate::error::{AllocatorError, Result};

use super::profile::StrategyProfile;

/// Explicitly owned catalog of strategy profiles.
///
/// Built with the three built-in profiles; callers may register more before
/// handing it to the engines. Engines only read from it.
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    profiles: Vec<StrategyProfile>,
}

impl StrategyRegistry {
    /// Registry holding conservative, moderate and aggressive.
    pub fn with_builtin() -> Self {
        Self {
            profiles: vec![
                StrategyProfile::conservative(),
                StrategyProfile::moderate(),
                StrategyProfile::aggressive(),
            ],
        }
    }

    /// Look up a profile by name.
    pub fn get(&self, name: &str) -> Result<&StrategyProfile> {
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AllocatorError::configuration(format!("Unknown strategy: {}", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Add a profile. Names must be unique, including against built-ins.
    pub fn register(&mut self, profile: StrategyProfile) -> Result<()> {
        let profile = self.admit(profile, &[])?;
        debug!(strategy = %profile.name, "Registered strategy profile");
        self.profiles.push(profile);
        Ok(())
    }

    /// Register every profile in a JSON array. Returns how many were added.
    ///
    /// The batch is all-or-nothing: any invalid or duplicate entry leaves the
    /// registry unchanged.
    pub fn load_json(&mut self, json: &str) -> Result<usize> {
        let profiles: Vec<StrategyProfile> = serde_json::from_str(json)
            .map_err(|e| AllocatorError::configuration(format!("Invalid strategy profiles: {}", e)))?;

        let mut batch = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let profile = self.admit(profile, &batch)?;
            batch.push(profile);
        }

        let count = batch.len();
        self.profiles.extend(batch);

        info!(count, "Loaded custom strategy profiles");
        Ok(count)
    }

    /// Normalize and validate a profile, rejecting names already taken here or in `pending`.
    fn admit(&self, profile: StrategyProfile, pending: &[StrategyProfile]) -> Result<StrategyProfile> {
        let profile = profile.normalized();
        profile.validate()?;

        let taken = self.contains(&profile.name)
            || pending.iter().any(|p| p.name.eq_ignore_ascii_case(&profile.name));
        if taken {
            return Err(AllocatorError::configuration(format!(
                "Strategy {} is already registered",
                profile.name
            )));
        }
        Ok(profile)
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StrategyProfile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
