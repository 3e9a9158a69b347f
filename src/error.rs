use super::*;

/// Everything that can go wrong between HDL text and a map of simulated
/// output values. None of these are recoverable at the point of
/// detection; callers are expected to record the failure and move on.
#[derive(Debug, Clone)]
pub enum HdlError {
    Lex(Loc, String),
    Parse(Loc, String),
    ChipNotFound(ChipName, String),
    CyclicDefinition(Vec<ChipName>),
    InvalidInput {
        chip: ChipName,
        missing: Vec<PinName>,
        unexpected: Vec<PinName>,
        nonbinary: Vec<PinName>,
    },
    InvalidSignal {
        chip: ChipName,
        gate: Gate,
        pin: PinName,
        signal: Option<SignalName>,
    },
    UnresolvedOutput(ChipName, PinName),
}

impl std::fmt::Display for HdlError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            HdlError::Lex(loc, message) => write!(f, "Lex error at byte {}: {message}", loc.start()),
            HdlError::Parse(loc, message) => write!(f, "Parse error at byte {}: {message}", loc.start()),
            HdlError::ChipNotFound(chip, cause) => write!(f, "No chip definition for {chip}: {cause}"),
            HdlError::CyclicDefinition(chain) => {
                write!(f, "Cyclic chip definition: {}", chain.join(" -> "))
            },
            HdlError::InvalidInput { chip, missing, unexpected, nonbinary } => {
                write!(f, "Bad inputs for chip {chip}:")?;
                if !missing.is_empty() {
                    write!(f, " missing {}", missing.join(", "))?;
                }
                if !unexpected.is_empty() {
                    write!(f, " unexpected {}", unexpected.join(", "))?;
                }
                if !nonbinary.is_empty() {
                    write!(f, " no 0/1 value for {}", nonbinary.join(", "))?;
                }
                Ok(())
            },
            HdlError::InvalidSignal { chip, gate, pin, signal } => match signal {
                Some(signal) => write!(
                    f,
                    "In chip {chip}: {gate} pin {pin} reads signal {signal}, which has no value yet"
                ),
                None => write!(f, "In chip {chip}: {gate} pin {pin} is not connected"),
            },
            HdlError::UnresolvedOutput(chip, pin) => {
                write!(f, "Output pin {pin} of chip {chip} was never driven")
            },
        }
    }
}

impl std::error::Error for HdlError {}
