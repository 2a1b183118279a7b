//! 원본 라인 지문
//!
//! SHA-256 다이제스트의 16진수 표현 앞 [`FINGERPRINT_LEN`]자를 사용합니다.
//!
//! # 충돌 확률
//!
//! 12자 = 48비트이므로 서로 다른 라인 `n`개가 한 TTL 창 안에 있을 때
//! 충돌 확률은 대략 `n^2 / 2^49` 입니다. 창 안에 고유 라인 100만 개가 있어도
//! 약 0.2% 수준입니다. 충돌이 나면 두 번째 라인은 중복으로 간주되어
//! 해당 창 동안 억제됩니다. 정확한 중복 제거가 필요하면 길이를 늘리십시오.

use sha2::{Digest, Sha256};

/// 지문 길이 (16진수 문자 수, 최대 64)
pub const FINGERPRINT_LEN: usize = 12;

/// 원본 라인의 지문을 계산합니다.
pub fn fingerprint(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(FINGERPRINT_LEN);
    hex
}
