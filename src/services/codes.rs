//! Human readable identifiers printed on receipts: tracking codes, sale
//! receipt numbers and loan invoice numbers.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::future::Future;
use tracing::warn;

use crate::errors::ServiceError;

/// Uppercase letters and digits without 0, O, 1 and I.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CODE_SUFFIX_LEN: usize = 6;
pub const MAX_CODE_ATTEMPTS: usize = 5;

pub const SALE_PREFIX: &str = "S";
pub const LOAN_PREFIX: &str = "L";

/// `{prefix}-{YYMMDD}-{XXXXXX}`
pub fn generate_code(prefix: &str, at: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..CODE_SUFFIX_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}-{}", prefix, at.format("%y%m%d"), suffix)
}

/// Generates codes until `exists` reports a free one, giving up after
/// [`MAX_CODE_ATTEMPTS`] collisions.
pub async fn unique_code<F, Fut>(prefix: &str, mut exists: F) -> Result<String, ServiceError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, ServiceError>>,
{
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let code = generate_code(prefix, Utc::now());
        if !exists(code.clone()).await? {
            return Ok(code);
        }
        warn!(prefix, attempt, "Generated code collided, retrying");
    }
    Err(ServiceError::Conflict(format!(
        "Could not generate a unique {} code after {} attempts",
        prefix, MAX_CODE_ATTEMPTS
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    #[test]
    fn code_has_prefix_date_and_suffix() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let code = generate_code("RD", at);
        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "RD");
        assert_eq!(parts[1], "240309");
        assert_eq!(parts[2].len(), CODE_SUFFIX_LEN);
    }

    #[test]
    fn suffix_avoids_ambiguous_glyphs() {
        for _ in 0..200 {
            let code = generate_code("S", Utc::now());
            let suffix = code.rsplit('-').next().unwrap();
            assert!(!suffix.contains(['0', 'O', '1', 'I']), "{}", code);
            assert!(suffix.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[tokio::test]
    async fn unique_code_retries_then_succeeds() {
        let mut calls = 0;
        let code = unique_code("L", |_| {
            calls += 1;
            let taken = calls < 3;
            async move { Ok(taken) }
        })
        .await
        .unwrap();
        assert!(code.starts_with("L-"));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn unique_code_gives_up() {
        let result = unique_code("RD", |_| async { Ok(true) }).await;
        assert_matches!(result, Err(ServiceError::Conflict(_)));
    }
}
