use std::fmt;

/// A numeric value. Parsing preserves whether a literal had a decimal point;
/// arithmetic promotes to `Float` whenever either operand is a `Float` (the
/// one exception is `divide`, which is always true division).
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            Number::Int(i) => i,
            Number::Float(f) => f as i64,
        }
    }

    pub fn is_true(self) -> bool {
        self.as_f64() != 0.0
    }

    pub fn from_bool(b: bool) -> Self {
        Number::Int(if b { 1 } else { 0 })
    }

    fn binary(self, other: Self, int_op: impl Fn(i64, i64) -> i64, float_op: impl Fn(f64, f64) -> f64) -> Self {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Number::Int(int_op(a, b)),
            _ => Number::Float(float_op(self.as_f64(), other.as_f64())),
        }
    }

    pub fn add(self, other: Self) -> Self {
        self.binary(other, |a, b| a + b, |a, b| a + b)
    }

    pub fn subtract(self, other: Self) -> Self {
        self.binary(other, |a, b| a - b, |a, b| a - b)
    }

    pub fn multiply(self, other: Self) -> Self {
        self.binary(other, |a, b| a * b, |a, b| a * b)
    }

    pub fn divide(self, other: Self) -> Self {
        Number::Float(self.as_f64() / other.as_f64())
    }

    pub fn power(self, other: Self) -> Self {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) if b >= 0 => Number::Int(a.pow(b as u32)),
            _ => Number::Float(self.as_f64().powf(other.as_f64())),
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Number::Int(i) => Number::Int(-i),
            Number::Float(f) => Number::Float(-f),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) => write!(f, "{x}"),
        }
    }
}
