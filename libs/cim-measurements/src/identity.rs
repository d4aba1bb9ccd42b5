//! Identity Registrar
//!
//! Assigns measurement identifiers that are stable across runs without a
//! central counter. An identifier is derived from the SHA-256 digest of
//! `"{class}:{name}"`, shaped as a version-4 UUID. When the candidate is
//! already issued the seed is extended with `#1`, `#2`, ... until a free
//! value is found. Every assignment is recorded in a map persisted as
//! `{ model: { class: { name: uuid } } }`, so later runs return the stored
//! value instead of deriving again.

use crate::error::{MeasurementError, Result};
use cim_model::{validate_model_key, write_atomic};
use rustc_hash::FxHashSet;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Reseed attempts before giving up on a seed
pub const MAX_DERIVATION_ATTEMPTS: u32 = 1024;

/// class name -> entity name -> identifier
type ClassRecords = BTreeMap<String, BTreeMap<String, Uuid>>;

/// Derive the identifier candidate for a seed
pub fn derive_identifier(seed: &str) -> Uuid {
    let digest = Sha256::digest(seed.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

/// Derive from `base_seed`, reseeding with `#attempt` while `is_taken` holds
pub fn derive_with_retry(base_seed: &str, mut is_taken: impl FnMut(&Uuid) -> bool) -> Result<Uuid> {
    let candidate = derive_identifier(base_seed);
    if !is_taken(&candidate) {
        return Ok(candidate);
    }

    for attempt in 1..=MAX_DERIVATION_ATTEMPTS {
        let candidate = derive_identifier(&format!("{}#{}", base_seed, attempt));
        if !is_taken(&candidate) {
            warn!(
                "Identifier collision for seed {}, resolved at attempt {}",
                base_seed, attempt
            );
            return Ok(candidate);
        }
    }

    Err(MeasurementError::IdentifierSpaceExhausted {
        seed: base_seed.to_string(),
    })
}

/// Persisted identifier assignments plus the process-wide issued set
#[derive(Debug, Default)]
pub struct IdentityRegistrar {
    records: BTreeMap<String, ClassRecords>,
    /// Every identifier loaded, issued or reserved in this process
    issued: FxHashSet<Uuid>,
}

impl IdentityRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a persisted identity map
    ///
    /// A missing file yields an empty registrar. Anything unreadable is
    /// reported as `IdentityFileCorrupt`.
    pub fn load(path: &Path) -> Result<Self> {
        let shown = path.display().to_string();
        if !path.exists() {
            info!("No identity map at {}, starting empty", shown);
            return Ok(Self::new());
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| MeasurementError::corrupt(&shown, e.to_string()))?;
        let raw: BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>> =
            serde_json::from_str(&text)
                .map_err(|e| MeasurementError::corrupt(&shown, e.to_string()))?;

        let mut registrar = Self::new();
        for (model, classes) in raw {
            for (class, names) in classes {
                for (name, value) in names {
                    let id = Uuid::parse_str(&value).map_err(|_| {
                        MeasurementError::corrupt(
                            &shown,
                            format!("{}/{}/{}: '{}' is not a UUID", model, class, name, value),
                        )
                    })?;
                    if !registrar.issued.insert(id) {
                        return Err(MeasurementError::corrupt(
                            &shown,
                            format!("identifier {} is assigned more than once", id),
                        ));
                    }
                    registrar
                        .records
                        .entry(model.clone())
                        .or_default()
                        .entry(class.clone())
                        .or_default()
                        .insert(name, id);
                }
            }
        }

        info!(
            "Loaded identity map {} ({} identifiers)",
            shown,
            registrar.issued.len()
        );
        Ok(registrar)
    }

    /// Identifier for `(model, class, name)`, assigning one on first request
    pub fn get_identifier(&mut self, model_key: &str, class_name: &str, name: &str) -> Result<Uuid> {
        validate_model_key(model_key)?;
        if let Some(id) = self.lookup(model_key, class_name, name) {
            return Ok(id);
        }

        let seed = format!("{}:{}", class_name, name);
        let issued = &self.issued;
        let id = derive_with_retry(&seed, |candidate| issued.contains(candidate))?;

        self.issued.insert(id);
        self.records
            .entry(model_key.to_string())
            .or_default()
            .entry(class_name.to_string())
            .or_default()
            .insert(name.to_string(), id);
        debug!("Assigned {} to {}/{}", id, model_key, seed);
        Ok(id)
    }

    /// Stored identifier, without assigning
    pub fn lookup(&self, model_key: &str, class_name: &str, name: &str) -> Option<Uuid> {
        self.records
            .get(model_key)
            .and_then(|classes| classes.get(class_name))
            .and_then(|names| names.get(name))
            .copied()
    }

    /// Mark an identifier that already exists elsewhere as taken
    ///
    /// Returns `false` when it was already known.
    pub fn reserve(&mut self, id: Uuid) -> bool {
        self.issued.insert(id)
    }

    pub fn is_issued(&self, id: &Uuid) -> bool {
        self.issued.contains(id)
    }

    /// Replace an assigned identifier within one model
    ///
    /// Returns `false` when no entry of the model holds `old`; the new
    /// identifier is marked issued either way.
    pub fn rebind(&mut self, model_key: &str, old: &Uuid, new: Uuid) -> bool {
        self.issued.insert(new);
        let slot = self
            .records
            .get_mut(model_key)
            .into_iter()
            .flat_map(|classes| classes.values_mut())
            .flat_map(|names| names.values_mut())
            .find(|id| **id == *old);
        match slot {
            Some(slot) => {
                *slot = new;
                true
            },
            None => false,
        }
    }

    /// Number of recorded assignments across all models
    pub fn len(&self) -> usize {
        self.records
            .values()
            .flat_map(|classes| classes.values())
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the map with sorted keys via temp file and atomic rename
    pub fn persist(&self, path: &Path) -> Result<()> {
        let mut text = serde_json::to_string_pretty(&self.records)?;
        text.push('\n');
        write_atomic(path, text.as_bytes())?;
        info!(
            "Persisted identity map {} ({} identifiers)",
            path.display(),
            self.len()
        );
        Ok(())
    }
}
