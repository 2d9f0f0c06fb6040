//! Post-recognition text normalization.
//!
//! Recognizers spell numbers out ("twenty three"). A [`TextNormalizer`]
//! rewrites such sequences into digits before results are returned to the
//! client.

mod numbers;

pub use numbers::NumberExtractor;

/// Stateless text correction.
pub trait TextNormalizer: Send + Sync {
    /// Rewrite `text`, returning the corrected string and a mask with one
    /// entry per output token, `true` where the token is a number.
    ///
    /// With `apply_regrouping`, adjacent number groups are merged into a single
    /// digit string ("one two three" becomes "123").
    fn replace(&self, text: &str, apply_regrouping: bool) -> (String, Vec<bool>);
}
