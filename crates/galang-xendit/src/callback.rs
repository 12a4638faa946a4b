/// Compare the `x-callback-token` header against the expected token.
///
/// Runs in time independent of where the first mismatch is.
pub fn verify_callback_token(expected: &str, presented: &str) -> bool {
    let expected = expected.as_bytes();
    let presented = presented.as_bytes();

    if expected.is_empty() || expected.len() != presented.len() {
        return false;
    }

    expected
        .iter()
        .zip(presented)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
