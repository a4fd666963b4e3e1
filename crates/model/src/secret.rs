use std::fmt::{self, Debug, Display};

/// Shows only the first few characters of a secret.
///
/// `Masked::new("sk-or-v1-abcdef", 5)` formats as `sk-or...`. Secrets
/// shorter than the visible prefix are printed as `...` alone.
#[derive(Clone, Copy)]
pub struct Masked<'a> {
    secret: &'a str,
    visible: usize,
}

impl<'a> Masked<'a> {
    /// Wraps `secret`, keeping `visible` leading characters.
    #[inline]
    pub fn new(secret: &'a str, visible: usize) -> Self {
        Self { secret, visible }
    }
}

impl Display for Masked<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.secret.char_indices().nth(self.visible) {
            Some((idx, _)) => &self.secret[..idx],
            None => "",
        };
        write!(f, "{prefix}...")
    }
}

impl Debug for Masked<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}
