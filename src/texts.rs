use rand::Rng;

use crate::error::{Error, Result};

/// Built-in passages offered by the test
pub const DEFAULT_TEXTS: &[&str] = &[
    "The quick brown fox jumps over the lazy dog while the farmer watches from the porch.",
    "A journey of a thousand miles begins with a single step, and then another one after that.",
    "Practice does not make perfect. Only perfect practice makes perfect, so slow down and be accurate.",
    "The best way to predict the future is to create it, one small and careful decision at a time.",
    "Typing quickly is a skill built from rhythm, posture, and the patience to fix small mistakes early.",
    "Rivers carve canyons not through strength but through persistence, flowing on for thousands of years.",
    "She sells sea shells by the sea shore, and the shells she sells are surely sea shells.",
    "Good code is written for people to read and only incidentally for machines to execute.",
];

/// Read-only list of candidate target texts
#[derive(Debug, Clone)]
pub struct TextSource {
    texts: Vec<String>,
}

impl TextSource {
    pub fn new<I, S>(texts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let texts: Vec<String> = texts.into_iter().map(Into::into).collect();

        if texts.is_empty() {
            return Err(Error::EmptyTextSource);
        }
        if let Some(idx) = texts.iter().position(|t| t.is_empty()) {
            return Err(Error::EmptyText(idx));
        }

        Ok(Self { texts })
    }

    pub fn builtin() -> Self {
        Self {
            texts: DEFAULT_TEXTS.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Uniformly random pick
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        &self.texts[rng.gen_range(0..self.texts.len())]
    }
}

impl Default for TextSource {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    #[test]
    fn rejects_empty_source() {
        let result = TextSource::new(Vec::<String>::new());
        assert_matches!(result, Err(Error::EmptyTextSource));
    }

    #[test]
    fn rejects_empty_text() {
        let result = TextSource::new(["fine", ""]);
        assert_matches!(result, Err(Error::EmptyText(1)));
    }

    #[test]
    fn builtin_texts_are_valid() {
        let source = TextSource::builtin();
        assert_eq!(source.len(), DEFAULT_TEXTS.len());
        assert!(source.texts().iter().all(|t| !t.is_empty()));
    }

    #[test]
    fn single_text_is_always_picked() {
        let source = TextSource::new(["only"]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(source.pick(&mut rng), "only");
        }
    }

    #[test]
    fn pick_reaches_every_text() {
        let source = TextSource::new(["a", "b", "c"]).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let seen: HashSet<&str> = (0..200).map(|_| source.pick(&mut rng)).collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn same_seed_same_pick() {
        let source = TextSource::builtin();
        let a = source.pick(&mut StdRng::seed_from_u64(9)).to_string();
        let b = source.pick(&mut StdRng::seed_from_u64(9)).to_string();
        assert_eq!(a, b);
    }
}
