//! Embedding vectors: literal parsing, canonical rendering and cosine distance.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::{InputError, InputResult};

/// A non-empty vector of finite 32-bit floats.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn from_components(components: Vec<f32>) -> InputResult<Self> {
        if components.is_empty() {
            return Err(InputError::MalformedVector("vector is empty".to_owned()));
        }
        if let Some(pos) = components.iter().position(|c| !c.is_finite()) {
            return Err(InputError::MalformedVector(format!(
                "component {pos} is not a finite number"
            )));
        }
        Ok(Self(components))
    }

    /// Parse a bracketed literal such as `"[1, 2.5, -3e-2]"`.
    pub fn parse(literal: &str) -> InputResult<Self> {
        let trimmed = literal.trim();
        let inner = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| {
                InputError::MalformedVector(format!("expected a bracketed list, got {trimmed:?}"))
            })?;
        if inner.trim().is_empty() {
            return Err(InputError::MalformedVector("vector is empty".to_owned()));
        }
        let components = inner
            .split(',')
            .enumerate()
            .map(|(pos, raw)| {
                let token = raw.trim();
                token.parse::<f32>().map_err(|_| {
                    InputError::MalformedVector(format!("component {pos} is not a number: {token:?}"))
                })
            })
            .collect::<InputResult<Vec<f32>>>()?;
        Self::from_components(components)
    }

    /// Parse and require exactly `dimensions` components.
    pub fn parse_with_dimensions(literal: &str, dimensions: usize) -> InputResult<Self> {
        let embedding = Self::parse(literal)?;
        embedding.check_dimensions(dimensions)?;
        Ok(embedding)
    }

    pub fn check_dimensions(&self, expected: usize) -> InputResult<()> {
        if self.0.len() == expected {
            Ok(())
        } else {
            Err(InputError::DimensionMismatch { expected, actual: self.0.len() })
        }
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Canonical literal accepted by pgvector and sqlite-vec, e.g. `[1,2.5,3]`.
    #[must_use]
    pub fn to_literal(&self) -> String {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        format!("[{}]", parts.join(","))
    }
}

impl FromStr for Embedding {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for Embedding {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.to_literal())
    }
}

/// Cosine distance `1 - a·b / sqrt(|a|²|b|²)`, in `[0, 2]`.
///
/// Accumulates in f64 and clamps the similarity to `[-1, 1]`, so parallel
/// vectors come out at exactly `0.0`. Returns `None` when the lengths differ
/// or either vector has zero norm.
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    let similarity = (dot / (norm_a * norm_b).sqrt()).clamp(-1.0, 1.0);
    Some(1.0 - similarity)
}
