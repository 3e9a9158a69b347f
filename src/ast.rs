use std::collections::BTreeMap;

pub type ChipName = String;
pub type PinName = String;
pub type SignalName = String;

/// A parsed `CHIP` declaration: interface pins plus the ordered list of
/// parts wired up inside it. Immutable once the parser hands it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipDefinition {
    pub name: ChipName,
    pub inputs: Vec<PinName>,
    pub outputs: Vec<PinName>,
    pub parts: Vec<PartInstance>,
}

impl ChipDefinition {
    pub fn is_input(&self, pin: &str) -> bool {
        self.inputs.iter().any(|p| p == pin)
    }

    pub fn is_output(&self, pin: &str) -> bool {
        self.outputs.iter().any(|p| p == pin)
    }
}

/// One sub-chip instantiation inside a `PARTS:` section.
///
/// `connections` maps the sub-chip's own pin names to signal names in the
/// enclosing chip's namespace, exactly as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartInstance {
    pub chip_type: ChipName,
    pub connections: BTreeMap<PinName, SignalName>,
}
