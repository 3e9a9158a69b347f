use super::*;

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Resolves a chip type name to raw HDL source text. Loading happens at
/// most once per distinct chip name per run; the simulator caches the
/// parsed definition, not this trait.
pub trait ChipLoader {
    fn load(&self, chip: &str) -> Result<String, HdlError>;
}

/// Loads `<base_dir>/<ChipName>.hdl`.
pub struct DirLoader {
    base_dir: PathBuf,
}

impl DirLoader {
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> DirLoader {
        DirLoader { base_dir: base_dir.into() }
    }
}

impl ChipLoader for DirLoader {
    fn load(&self, chip: &str) -> Result<String, HdlError> {
        let path = self.base_dir.join(format!("{chip}.hdl"));
        std::fs::read_to_string(&path)
            .map_err(|e| HdlError::ChipNotFound(chip.to_string(), format!("{}: {e}", path.display())))
    }
}

/// In-memory chip set, used by tests and embedders.
#[derive(Debug, Clone, Default)]
pub struct MemLoader {
    sources: BTreeMap<ChipName, String>,
}

impl MemLoader {
    pub fn new() -> MemLoader {
        MemLoader::default()
    }

    pub fn with(mut self, chip: &str, text: &str) -> MemLoader {
        self.sources.insert(chip.to_string(), text.to_string());
        self
    }

    pub fn insert(&mut self, chip: &str, text: &str) {
        self.sources.insert(chip.to_string(), text.to_string());
    }
}

impl ChipLoader for MemLoader {
    fn load(&self, chip: &str) -> Result<String, HdlError> {
        self.sources
            .get(chip)
            .cloned()
            .ok_or_else(|| HdlError::ChipNotFound(chip.to_string(), "not in the chip set".to_string()))
    }
}
