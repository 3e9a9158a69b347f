use super::*;

use log::*;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Owns the chip loader and the parsed-definition cache, and runs
/// simulations against it.
///
/// A definition is loaded and parsed on first reference and then reused
/// for the lifetime of the simulator; signal state never outlives a
/// single [`Simulator::simulate`] call. The whole pipeline is synchronous
/// and allocation-local, so independent simulators are fully independent.
pub struct Simulator {
    loader: Box<dyn ChipLoader>,
    defs: BTreeMap<ChipName, Arc<ChipDefinition>>,
}

impl Simulator {
    pub fn new(loader: Box<dyn ChipLoader>) -> Simulator {
        Simulator {
            loader,
            defs: BTreeMap::new(),
        }
    }

    /// A simulator resolving chips as `<base_dir>/<ChipName>.hdl`.
    pub fn with_dir<P: Into<std::path::PathBuf>>(base_dir: P) -> Simulator {
        Simulator::new(Box::new(DirLoader::new(base_dir)))
    }

    /// The cached definition for `chip`, loading and parsing it on first
    /// use. The top-level name always resolves through the loader, even
    /// when it collides with a builtin gate name; only `PARTS:` entries
    /// resolve builtin-first.
    pub fn definition(&mut self, chip: &str) -> Result<Arc<ChipDefinition>, HdlError> {
        if let Some(def) = self.defs.get(chip) {
            return Ok(def.clone());
        }
        let text = self.loader.load(chip)?;
        let def = Arc::new(parse_chip(&text)?);
        debug!("loaded chip definition {chip}");
        self.defs.insert(chip.to_string(), def.clone());
        Ok(def)
    }

    /// Evaluate `chip` for one set of input values.
    ///
    /// `inputs` must bind exactly the chip's declared input pins, each to
    /// 0 or 1. The instance tree is built fresh for every call and torn
    /// down afterwards; only the definition cache persists.
    pub fn simulate(
        &mut self,
        chip: &str,
        inputs: &BTreeMap<PinName, Value>,
    ) -> Result<BTreeMap<PinName, Value>, HdlError> {
        let def = self.definition(chip)?;
        check_inputs(&def, inputs)?;
        let mut chain = vec![def.name.clone()];
        let instance = self.instantiate(&def, &mut chain)?;
        instance.eval(inputs)
    }

    /// Build the instance tree for `def`. `chain` is the stack of chip
    /// names currently being instantiated, outermost first; meeting one
    /// of them again means the definitions reference themselves and can
    /// never be flattened.
    fn instantiate(
        &mut self,
        def: &Arc<ChipDefinition>,
        chain: &mut Vec<ChipName>,
    ) -> Result<ChipInstance, HdlError> {
        let mut parts = vec![];
        for part in &def.parts {
            if let Some(gate) = Gate::from_name(&part.chip_type) {
                parts.push(Part::Gate {
                    gate,
                    connections: part.connections.clone(),
                });
            } else {
                if chain.iter().any(|name| name == &part.chip_type) {
                    let mut cycle = chain.clone();
                    cycle.push(part.chip_type.clone());
                    return Err(HdlError::CyclicDefinition(cycle));
                }
                let sub_def = self.definition(&part.chip_type)?;
                chain.push(part.chip_type.clone());
                let instance = self.instantiate(&sub_def, chain)?;
                chain.pop();
                parts.push(Part::Chip {
                    instance,
                    connections: part.connections.clone(),
                });
            }
        }
        Ok(ChipInstance {
            def: def.clone(),
            parts,
        })
    }
}

fn check_inputs(def: &ChipDefinition, inputs: &BTreeMap<PinName, Value>) -> Result<(), HdlError> {
    let missing: Vec<PinName> = def
        .inputs
        .iter()
        .filter(|pin| !inputs.contains_key(*pin))
        .cloned()
        .collect();
    let unexpected: Vec<PinName> = inputs
        .keys()
        .filter(|pin| !def.is_input(pin))
        .cloned()
        .collect();
    let nonbinary: Vec<PinName> = inputs
        .iter()
        .filter(|(_, value)| value.is_x())
        .map(|(pin, _)| pin.clone())
        .collect();

    if missing.is_empty() && unexpected.is_empty() && nonbinary.is_empty() {
        Ok(())
    } else {
        Err(HdlError::InvalidInput {
            chip: def.name.clone(),
            missing,
            unexpected,
            nonbinary,
        })
    }
}

/// One node of the instance tree. Owns its sub-instances exclusively;
/// nothing is shared between siblings except the `Arc`'d definitions.
struct ChipInstance {
    def: Arc<ChipDefinition>,
    parts: Vec<Part>,
}

/// A part with its chip type resolved: either one of the four builtin
/// gates or a fully instantiated sub-chip. Resolved once at
/// instantiation, never re-checked during evaluation.
enum Part {
    Gate {
        gate: Gate,
        connections: BTreeMap<PinName, SignalName>,
    },
    Chip {
        instance: ChipInstance,
        connections: BTreeMap<PinName, SignalName>,
    },
}

impl ChipInstance {
    /// Evaluate this instance for one set of input values.
    ///
    /// Parts run strictly in declaration order; there is no dependency
    /// scheduling. A signal read before any part has written it is unset,
    /// and a builtin gate consuming an unset operand fails rather than
    /// defaulting to 0. Unlike the top-level entry point, nested calls
    /// tolerate unset *inputs*: a parent may legitimately wire a sub-chip
    /// input to a signal that errors only if a gate actually consumes it.
    fn eval(&self, inputs: &BTreeMap<PinName, Value>) -> Result<BTreeMap<PinName, Value>, HdlError> {
        let mut signals: BTreeMap<SignalName, Value> = BTreeMap::new();
        for pin in &self.def.inputs {
            signals.insert(pin.clone(), inputs.get(pin).copied().unwrap_or(Value::X));
        }

        for part in &self.parts {
            match part {
                Part::Gate { gate, connections } => {
                    self.eval_gate(*gate, connections, &mut signals)?;
                },
                Part::Chip { instance, connections } => {
                    let mut sub_inputs = BTreeMap::new();
                    for pin in &instance.def.inputs {
                        if let Some(signal) = connections.get(pin) {
                            let value = signals.get(signal).copied().unwrap_or(Value::X);
                            sub_inputs.insert(pin.clone(), value);
                        }
                    }
                    trace!("{}: descending into {}", self.def.name, instance.def.name);
                    let sub_outputs = instance.eval(&sub_inputs)?;
                    for (pin, value) in sub_outputs {
                        // Outputs the parent leaves unbound are dropped.
                        if let Some(signal) = connections.get(&pin) {
                            signals.insert(signal.clone(), value);
                        }
                    }
                },
            }
        }

        let mut outputs = BTreeMap::new();
        for pin in &self.def.outputs {
            match signals.get(pin) {
                Some(value) if !value.is_x() => {
                    outputs.insert(pin.clone(), *value);
                },
                _ => return Err(HdlError::UnresolvedOutput(self.def.name.clone(), pin.clone())),
            }
        }
        Ok(outputs)
    }

    fn eval_gate(
        &self,
        gate: Gate,
        connections: &BTreeMap<PinName, SignalName>,
        signals: &mut BTreeMap<SignalName, Value>,
    ) -> Result<(), HdlError> {
        let mut operands = Vec::with_capacity(gate.input_pins().len());
        for pin in gate.input_pins() {
            let signal = connections.get(*pin).ok_or_else(|| HdlError::InvalidSignal {
                chip: self.def.name.clone(),
                gate,
                pin: pin.to_string(),
                signal: None,
            })?;
            let value = signals.get(signal).copied().unwrap_or(Value::X);
            let bit = bool::try_from(value).map_err(|_| HdlError::InvalidSignal {
                chip: self.def.name.clone(),
                gate,
                pin: pin.to_string(),
                signal: Some(signal.clone()),
            })?;
            operands.push(bit);
        }

        let out = connections.get(gate.output_pin()).ok_or_else(|| HdlError::InvalidSignal {
            chip: self.def.name.clone(),
            gate,
            pin: gate.output_pin().to_string(),
            signal: None,
        })?;

        for pin in connections.keys() {
            if pin != gate.output_pin() && !gate.input_pins().contains(&pin.as_str()) {
                warn!("{}: {gate} has no pin {pin}, connection ignored", self.def.name);
            }
        }

        let result = gate.eval(&operands);
        trace!("{}: {gate} -> {out} = {}", self.def.name, Value::from(result));
        signals.insert(out.clone(), Value::from(result));
        Ok(())
    }
}
