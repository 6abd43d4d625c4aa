//! Token minting.

use tokmap_types::Token;

/// Source of candidate tokens.
///
/// Generators need not guarantee uniqueness; the store discards candidates
/// that are malformed or already bound and asks again.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> Token;
}

/// Default generator: random UUID v4 tokens.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidV4Generator;

impl TokenGenerator for UuidV4Generator {
    fn generate(&self) -> Token {
        Token::random()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedGenerator;
    use super::*;

    #[test]
    fn uuid_generator_yields_well_formed_tokens() {
        let g = UuidV4Generator;
        for _ in 0..100 {
            assert!(g.generate().is_well_formed());
        }
    }

    #[test]
    fn scripted_generator_repeats_last() {
        let g = ScriptedGenerator::new(&["a", "b"]);
        assert_eq!(g.generate().as_str(), "a");
        assert_eq!(g.generate().as_str(), "b");
        assert_eq!(g.generate().as_str(), "b");
    }
}
