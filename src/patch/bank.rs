use std::collections::{BTreeMap, HashMap};
use std::fmt;
#[cfg(feature = "serde")]
use std::path::Path;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::PatchError,
    patch::{program::ProgramData, synth_data::ProgramSource},
};

#[cfg(feature = "serde")]
use crate::patch::program::LayerData;

/// Numeric program number, as sent by a program change.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated set of programs, addressable by id or by name.
#[derive(Debug, Clone, Default)]
pub struct ProgramBank {
    name: String,
    programs: BTreeMap<ProgramId, Arc<ProgramData>>,
    by_name: HashMap<String, ProgramId>,
}

/// Bank file layout.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct BankFile {
    #[serde(default)]
    name: String,
    #[serde(default)]
    programs: Vec<ProgramEntry>,
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct ProgramEntry {
    id: ProgramId,
    name: String,
    #[serde(default)]
    role: Option<String>,
    layers: Vec<Arc<LayerData>>,
}

impl ProgramBank {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validate and add a program. Ids must be unique; a repeated name points
    /// at the most recently inserted program.
    pub fn insert(&mut self, id: ProgramId, program: ProgramData) -> Result<(), PatchError> {
        if self.programs.contains_key(&id) {
            return Err(PatchError::DuplicateProgram(id));
        }
        program.validate()?;

        self.by_name.insert(program.name.clone(), id);
        self.programs.insert(id, Arc::new(program));
        Ok(())
    }

    pub fn with_program(mut self, id: u32, program: ProgramData) -> Result<Self, PatchError> {
        self.insert(ProgramId(id), program)?;
        Ok(self)
    }

    pub fn program(&self, id: ProgramId) -> Option<&Arc<ProgramData>> {
        self.programs.get(&id)
    }

    pub fn program_by_name(&self, name: &str) -> Option<&Arc<ProgramData>> {
        self.by_name.get(name).and_then(|id| self.programs.get(id))
    }

    pub fn id_of(&self, name: &str) -> Option<ProgramId> {
        self.by_name.get(name).copied()
    }

    /// Programs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ProgramId, &Arc<ProgramData>)> {
        self.programs.iter().map(|(id, program)| (*id, program))
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    #[cfg(feature = "serde")]
    pub fn from_toml_str(source: &str) -> Result<Self, PatchError> {
        let file: BankFile = toml::from_str(source)?;
        let mut bank = ProgramBank::new(file.name);
        for entry in file.programs {
            let program = ProgramData {
                name: entry.name,
                role: entry.role,
                layers: entry.layers,
            };
            bank.insert(entry.id, program)?;
        }
        Ok(bank)
    }

    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PatchError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| PatchError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        let bank = Self::from_toml_str(&source)?;
        tracing::info!(
            path = %path.display(),
            bank = bank.name(),
            programs = bank.len(),
            "loaded program bank"
        );
        Ok(bank)
    }
}

impl ProgramSource for ProgramBank {
    fn program(&self, id: ProgramId) -> Option<Arc<ProgramData>> {
        ProgramBank::program(self, id).cloned()
    }

    fn program_by_name(&self, name: &str) -> Option<Arc<ProgramData>> {
        ProgramBank::program_by_name(self, name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::program::LayerData;

    fn tiny(name: &str) -> ProgramData {
        ProgramData::new(name).with_layer(LayerData::new("main"))
    }

    #[test]
    fn lookup_by_id_and_name() {
        let bank = ProgramBank::new("test")
            .with_program(3, tiny("organ"))
            .unwrap();

        assert_eq!(bank.program(ProgramId(3)).map(|p| p.name.as_str()), Some("organ"));
        assert_eq!(bank.program_by_name("organ").map(|p| p.name.as_str()), Some("organ"));
        assert!(bank.program(ProgramId(4)).is_none());
        assert!(bank.program_by_name("nonexistent").is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut bank = ProgramBank::new("test");
        bank.insert(ProgramId(1), tiny("a")).unwrap();
        assert!(matches!(
            bank.insert(ProgramId(1), tiny("b")),
            Err(PatchError::DuplicateProgram(ProgramId(1)))
        ));
    }

    #[test]
    fn invalid_programs_never_enter_the_bank() {
        let mut bank = ProgramBank::new("test");
        assert!(bank.insert(ProgramId(1), ProgramData::new("hollow")).is_err());
        assert!(bank.is_empty());
    }
}
