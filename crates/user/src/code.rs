pub const APPROVE_CODE_ALPHABET: &[u8] = b"123456789ABCEHKMOPTX";
pub const APPROVE_CODE_LEN: usize = 5;
pub const INVALID_CODES: usize = 5;

pub fn generate_approve_code() -> String {
    (0..APPROVE_CODE_LEN)
        .map(|_| {
            let index = rand::random_range(0..APPROVE_CODE_ALPHABET.len());
            char::from(APPROVE_CODE_ALPHABET[index])
        })
        .collect()
}

/// A real code plus decoys, all distinct.
pub fn generate_approve_codes() -> (String, Vec<String>) {
    let code = generate_approve_code();
    let mut invalid = Vec::with_capacity(INVALID_CODES);
    while invalid.len() < INVALID_CODES {
        let candidate = generate_approve_code();
        if candidate != code && !invalid.contains(&candidate) {
            invalid.push(candidate);
        }
    }

    (code, invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_use_the_unambiguous_alphabet() {
        for _ in 0..100 {
            let code = generate_approve_code();
            assert_eq!(code.len(), APPROVE_CODE_LEN);
            assert!(code.bytes().all(|b| APPROVE_CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn decoys_never_match_the_real_code() {
        let (code, invalid) = generate_approve_codes();

        assert_eq!(invalid.len(), INVALID_CODES);
        assert!(!invalid.contains(&code));
        let mut unique = invalid.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), INVALID_CODES);
    }
}
