//! The crate's single root error type.
//!
//! Every error surfaced by query construction, compilation, or hydration
//! converges on [`SqlStratumError`] so applications can catch one type
//! uniformly, mirroring the teacher's practice of a single `thiserror`-derived
//! enum per subsystem (`CompileError`, `SettingsError`) rather than a forest
//! of ad hoc error structs.

use crate::config::SettingsError;

/// A capability or dialect-binding diagnostic.
///
/// Carries the same three fields as the original implementation's
/// `UnsupportedDialectFeatureError`: the dialect the request targeted, the
/// feature that triggered the rejection, and an optional remedy hint. The
/// `feature` string is sometimes itself a full human-readable sentence (for
/// example "OFFSET without LIMIT not supported by mysql dialect") so that the
/// rendered message both follows the canonical `Dialect '<d>' does not
/// support feature: <feature>` shape and still contains the exact phrase
/// documented as the diagnostic for that condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedDialectFeature {
    pub dialect: String,
    pub feature: String,
    pub hint: Option<String>,
}

impl std::fmt::Display for UnsupportedDialectFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Dialect '{}' does not support feature: {}",
            self.dialect, self.feature
        )?;
        if let Some(hint) = &self.hint {
            write!(f, ". {hint}")?;
        }
        Ok(())
    }
}

impl UnsupportedDialectFeature {
    pub fn new(dialect: impl Into<String>, feature: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            feature: feature.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// The root error type for the whole crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlStratumError {
    /// Construction-time error: malformed builder usage, e.g. a second
    /// unqualified `ORDER_BY` expression appearing before the final
    /// position, or the `EXPECTED` argument shapes for hydration.
    #[error("{0}")]
    InvalidArgument(String),

    /// Capability/dialect error: unknown dialect, unsupported construct for
    /// the target dialect, a missing `LIMIT` companion for `OFFSET`, an
    /// unresolved pending `ORDER_BY` direction, or conflicting dialect
    /// bindings.
    #[error(transparent)]
    UnsupportedDialectFeature(#[from] UnsupportedDialectFeature),

    /// Hydration-time shape error: unknown projection shape, duplicate
    /// output key, or a non-aliased aggregate projection.
    #[error("{0}")]
    Hydration(String),

    /// An ambient configuration error bubbled up from `crate::config`.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

pub type SqlStratumResult<T> = Result<T, SqlStratumError>;
