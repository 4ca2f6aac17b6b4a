//! Domain gate: decides whether a question belongs to the exchange domain.

/// Vocabulary of domain terms: the exchange name, asset tickers, and
/// generic crypto terminology. Matching is substring-based, so short
/// tickers ("bnb") also hit inside longer words.
const DOMAIN_TERMS: &[&str] = &[
    "binance",
    "crypto",
    "bitcoin",
    "ethereum",
    "blockchain",
    "wallet",
    "trading",
    "exchange",
    "token",
    "coin",
    "defi",
    "staking",
    "launchpool",
    "bnb",
    "wct",
    "fdusd",
    "usdc",
];

/// Returns true when the question mentions any domain term,
/// case-insensitively.
///
/// This is a coarse keyword heuristic: questions about the domain that use
/// none of the vocabulary slip through to the open path, and unrelated
/// questions that happen to contain a term trigger retrieval. Both are
/// accepted behavior, not defects. Pure function; no state beyond the
/// vocabulary.
pub fn in_domain(question: &str) -> bool {
    let lowered = question.to_lowercase();
    DOMAIN_TERMS.iter().any(|term| lowered.contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_question_is_in_domain() {
        assert!(in_domain("What is BNB?"));
    }

    #[test]
    fn test_weather_question_is_off_domain() {
        assert!(!in_domain("What's the weather today?"));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        assert!(in_domain("how does LAUNCHPOOL distribute rewards"));
        assert!(in_domain("Is Staking safe?"));
    }

    #[test]
    fn test_term_inside_longer_word_matches() {
        // substring heuristic: "coin" hits inside "coinbase" too
        assert!(in_domain("do you support coinbase transfers"));
    }

    #[test]
    fn test_empty_question_is_off_domain() {
        assert!(!in_domain(""));
        assert!(!in_domain("   "));
    }
}
