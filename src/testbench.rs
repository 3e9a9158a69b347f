use super::*;

use log::*;
use std::collections::BTreeMap;
use std::path::Path;

/// One row of a vector file: input assignments and the outputs the chip
/// is expected to produce for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestVector {
    pub inputs: BTreeMap<PinName, Value>,
    pub expected: BTreeMap<PinName, Value>,
}

/// A parsed `.tst` file: the pin header plus every vector, tied to the
/// chip it exercises.
///
/// The format is CSV-like. The first line names the pins, inputs and
/// outputs separated by a semicolon (`a,b;out`); every following
/// non-empty line gives the values in the same positions (`0,1;1`).
#[derive(Debug, Clone)]
pub struct TestSuite {
    pub chip: ChipName,
    pub input_pins: Vec<PinName>,
    pub output_pins: Vec<PinName>,
    pub vectors: Vec<TestVector>,
}

/// Why a vector file could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorError {
    Io(String),
    Empty,
    Header(String),
    Row(usize, String),
}

impl std::fmt::Display for VectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorError::Io(message) => write!(f, "Cannot read vector file: {message}"),
            VectorError::Empty => write!(f, "Vector file is empty"),
            VectorError::Header(message) => write!(f, "Bad vector header: {message}"),
            VectorError::Row(line, message) => write!(f, "Bad vector on line {line}: {message}"),
        }
    }
}

impl std::error::Error for VectorError {}

impl TestSuite {
    /// Read and parse a `.tst` file; the chip name is the file stem.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<TestSuite, VectorError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| VectorError::Io(format!("{}: {e}", path.display())))?;
        let chip = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        TestSuite::parse(&chip, &text)
    }

    pub fn parse(chip: &str, text: &str) -> Result<TestSuite, VectorError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let (_, header) = lines.next().ok_or(VectorError::Empty)?;
        let (input_pins, output_pins) = parse_header(header)?;

        let mut vectors = vec![];
        for (line_number, line) in lines {
            vectors.push(parse_row(line_number, line, &input_pins, &output_pins)?);
        }

        Ok(TestSuite {
            chip: chip.to_string(),
            input_pins,
            output_pins,
            vectors,
        })
    }
}

fn parse_header(header: &str) -> Result<(Vec<PinName>, Vec<PinName>), VectorError> {
    let Some((inputs_part, outputs_part)) = header.split_once(';') else {
        return Err(VectorError::Header(format!(
            "expected 'inputs;outputs', got '{header}'"
        )));
    };
    let input_pins = split_names(inputs_part);
    let output_pins = split_names(outputs_part);
    if input_pins.is_empty() {
        return Err(VectorError::Header("no input pins".to_string()));
    }
    if output_pins.is_empty() {
        return Err(VectorError::Header("no output pins".to_string()));
    }
    Ok((input_pins, output_pins))
}

fn split_names(part: &str) -> Vec<PinName> {
    part.split(',')
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

fn parse_row(
    line_number: usize,
    line: &str,
    input_pins: &[PinName],
    output_pins: &[PinName],
) -> Result<TestVector, VectorError> {
    let Some((inputs_part, outputs_part)) = line.split_once(';') else {
        return Err(VectorError::Row(
            line_number,
            "expected ';' between inputs and outputs".to_string(),
        ));
    };

    let inputs = parse_values(line_number, inputs_part, input_pins, "input")?;
    let expected = parse_values(line_number, outputs_part, output_pins, "output")?;
    Ok(TestVector { inputs, expected })
}

fn parse_values(
    line_number: usize,
    part: &str,
    pins: &[PinName],
    role: &str,
) -> Result<BTreeMap<PinName, Value>, VectorError> {
    let values: Vec<&str> = part.split(',').map(|value| value.trim()).collect();
    if values.len() != pins.len() {
        return Err(VectorError::Row(
            line_number,
            format!("expected {} {role} values, got {}", pins.len(), values.len()),
        ));
    }
    let mut bound = BTreeMap::new();
    for (pin, value) in pins.iter().zip(values) {
        let value = match value {
            "0" => Value::ZERO,
            "1" => Value::ONE,
            other => {
                return Err(VectorError::Row(
                    line_number,
                    format!("{role} value for {pin} must be 0 or 1, got '{other}'"),
                ))
            },
        };
        bound.insert(pin.clone(), value);
    }
    Ok(bound)
}

/// Outcome of one vector run.
#[derive(Debug, Clone)]
pub struct VectorResult {
    pub vector: TestVector,
    pub actual: BTreeMap<PinName, Value>,
    pub passed: bool,
    pub message: String,
}

/// Counters and per-vector results for one suite.
#[derive(Debug, Clone)]
pub struct SuiteReport {
    pub chip: ChipName,
    pub results: Vec<VectorResult>,
    pub passed: usize,
}

impl SuiteReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

/// Run every vector of `suite` against `sim`. A vector whose simulation
/// errors is recorded as a failure carrying the error message; the run
/// always continues to the next vector.
pub fn run_suite(sim: &mut Simulator, suite: &TestSuite) -> SuiteReport {
    let mut results = vec![];
    let mut passed = 0;

    for (number, vector) in suite.vectors.iter().enumerate() {
        let result = run_vector(sim, &suite.chip, vector);
        if result.passed {
            passed += 1;
        }
        info!(
            "{} vector {}: {} {}",
            suite.chip,
            number + 1,
            format_bindings(&vector.inputs),
            result.message
        );
        results.push(result);
    }

    SuiteReport {
        chip: suite.chip.clone(),
        results,
        passed,
    }
}

fn run_vector(sim: &mut Simulator, chip: &str, vector: &TestVector) -> VectorResult {
    match sim.simulate(chip, &vector.inputs) {
        Ok(actual) => {
            let mut mismatches = vec![];
            for (pin, expected) in &vector.expected {
                let got = actual.get(pin).copied().unwrap_or(Value::X);
                if got != *expected {
                    mismatches.push(format!("{pin}: expected {expected}, got {got}"));
                }
            }
            let passed = mismatches.is_empty();
            let message = if passed {
                "PASS".to_string()
            } else {
                format!("FAIL - {}", mismatches.join(", "))
            };
            VectorResult {
                vector: vector.clone(),
                actual,
                passed,
                message,
            }
        },
        Err(e) => VectorResult {
            vector: vector.clone(),
            actual: BTreeMap::new(),
            passed: false,
            message: format!("ERROR - {e}"),
        },
    }
}

fn format_bindings(bindings: &BTreeMap<PinName, Value>) -> String {
    bindings
        .iter()
        .map(|(pin, value)| format!("{pin}={value}"))
        .collect::<Vec<String>>()
        .join(", ")
}
