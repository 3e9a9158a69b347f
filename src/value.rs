/// A single-bit signal value. [`Value::X`] is a wire that nothing has
/// driven yet.
#[derive(Ord, PartialOrd, Eq, PartialEq, Clone, Copy, Default)]
pub enum Value {
    #[default]
    X,
    Bit(bool),
}

impl Value {
    pub const ZERO: Value = Value::Bit(false);
    pub const ONE: Value = Value::Bit(true);

    pub fn is_x(&self) -> bool {
        *self == Value::X
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Value::X => write!(f, "X"),
            Value::Bit(false) => write!(f, "0"),
            Value::Bit(true) => write!(f, "1"),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{self:?}")
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bit(b)
    }
}

impl TryFrom<Value> for bool {
    type Error = ();
    fn try_from(value: Value) -> Result<bool, Self::Error> {
        match value {
            Value::X => Err(()),
            Value::Bit(b) => Ok(b),
        }
    }
}
