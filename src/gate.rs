/// The four primitive gates every chip bottoms out in. Anything else
/// named in a `PARTS:` section is resolved as another chip definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Nand,
    Not,
    And,
    Or,
}

impl Gate {
    pub fn from_name(name: &str) -> Option<Gate> {
        match name {
            "Nand" => Some(Gate::Nand),
            "Not" => Some(Gate::Not),
            "And" => Some(Gate::And),
            "Or" => Some(Gate::Or),
            _ => None,
        }
    }

    pub fn is_builtin(name: &str) -> bool {
        Gate::from_name(name).is_some()
    }

    /// Input pin names, in the order [`Gate::eval`] expects its operands.
    pub fn input_pins(&self) -> &'static [&'static str] {
        match self {
            Gate::Not => &["in"],
            Gate::Nand | Gate::And | Gate::Or => &["a", "b"],
        }
    }

    pub fn output_pin(&self) -> &'static str {
        "out"
    }

    /// Pure truth-table evaluation. `inputs` must hold one operand per
    /// entry of [`Gate::input_pins`], in the same order.
    pub fn eval(&self, inputs: &[bool]) -> bool {
        match self {
            Gate::Nand => !(inputs[0] && inputs[1]),
            Gate::Not => !inputs[0],
            Gate::And => inputs[0] && inputs[1],
            Gate::Or => inputs[0] || inputs[1],
        }
    }
}

impl std::fmt::Display for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gate::Nand => write!(f, "Nand"),
            Gate::Not => write!(f, "Not"),
            Gate::And => write!(f, "And"),
            Gate::Or => write!(f, "Or"),
        }
    }
}
