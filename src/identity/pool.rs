use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::IdentityError;

/// Candidate names, handed out in this order before any numbered variant.
pub const DEFAULT_NAMES: [&str; 20] = [
    "Bilal", "Noman", "Azeem", "Khuzaima", "Ahmed", "Ali", "Hassan", "Usman", "Hamza", "Zain",
    "Fahad", "Saad", "Omar", "Ibrahim", "Yousuf", "Haris", "Adnan", "Imran", "Tariq", "Shahid",
];

/// Display name held by exactly one live connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identity {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Identity {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identity {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[derive(Debug)]
pub struct IdentityPool {
    names: Vec<String>,
    used: HashSet<Identity>,
}

impl Default for IdentityPool {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityPool {
    pub fn new() -> Self {
        Self {
            names: DEFAULT_NAMES.iter().map(|name| name.to_string()).collect(),
            used: HashSet::new(),
        }
    }

    /// Build a pool over a custom ordered list of candidate names.
    pub fn with_names<I, S>(names: I) -> Result<Self, IdentityError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for name in names {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(IdentityError::BlankName);
            }
            if !seen.insert(name.clone()) {
                return Err(IdentityError::DuplicateName(name));
            }
            candidates.push(name);
        }

        if candidates.is_empty() {
            return Err(IdentityError::EmptyNamePool);
        }

        Ok(Self {
            names: candidates,
            used: HashSet::new(),
        })
    }

    pub fn allocate(&mut self) -> Identity {
        self.allocate_with(&mut rand::thread_rng())
    }

    /// Hand out the first free candidate, or a numbered variant once every
    /// candidate is taken.
    pub fn allocate_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Identity {
        if let Some(name) = self
            .names
            .iter()
            .find(|name| !self.used.contains(name.as_str()))
        {
            let identity = Identity::new(name.clone());
            self.used.insert(identity.clone());
            debug!("Allocated identity {}", identity);
            return identity;
        }

        // Every candidate is taken: random base name plus a counter that grows
        // on each collision. The used-set is finite, so this terminates.
        let mut counter: u64 = 1;
        let identity = loop {
            let base = self
                .names
                .choose(rng)
                .map(String::as_str)
                .unwrap_or_default();
            let candidate = Identity::new(format!("{}{}", base, counter));
            if !self.used.contains(&candidate) {
                break candidate;
            }
            counter += 1;
        };

        info!("Name pool exhausted, allocated generated identity {}", identity);
        self.used.insert(identity.clone());
        identity
    }

    /// Returns false when the identity was not in use.
    pub fn release(&mut self, identity: &Identity) -> bool {
        let removed = self.used.remove(identity);
        if removed {
            debug!("Released identity {}", identity);
        }
        removed
    }

    pub fn list_used(&self) -> Vec<Identity> {
        let mut used: Vec<Identity> = self.used.iter().cloned().collect();
        used.sort();
        used
    }

    pub fn is_used(&self, identity: &Identity) -> bool {
        self.used.contains(identity)
    }

    pub fn in_use(&self) -> usize {
        self.used.len()
    }

    pub fn candidates(&self) -> &[String] {
        &self.names
    }
}
