//! Token estimation (§4.5 "Budget"): 1 token ≈ 4 characters for prose, ≈ 3
//! characters for code. Deliberately simpler than `prd-parsing`'s tiktoken
//! counter — the context pipeline only needs a fast, pure estimate to decide
//! between `singlePass`/`multiTurn`/`summarized`, not an exact encoder count.

const PROSE_CHARS_PER_TOKEN: usize = 4;
const CODE_CHARS_PER_TOKEN: usize = 3;

/// Estimate the token count of `text`, treating it as source code when
/// `is_code` is set.
#[must_use]
pub fn estimate_tokens(text: &str, is_code: bool) -> usize {
    let chars_per_token = if is_code { CODE_CHARS_PER_TOKEN } else { PROSE_CHARS_PER_TOKEN };
    text.chars().count().div_ceil(chars_per_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_denser_than_prose() {
        let text = "x".repeat(12);
        assert_eq!(estimate_tokens(&text, false), 3);
        assert_eq!(estimate_tokens(&text, true), 4);
    }
}
