/// Number of digits in a CPF.
pub const CPF_DIGITS: usize = 11;

/// Format whatever has been typed so far as `000.000.000-00`.
///
/// Non-digits are dropped and input beyond eleven digits is ignored, so the
/// function can be applied on every keystroke.
pub fn add_cpf_mask(value: &str) -> String {
    let digits: Vec<char> = value
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(CPF_DIGITS)
        .collect();

    let mut masked = String::with_capacity(14);
    for (i, c) in digits.iter().enumerate() {
        match i {
            3 | 6 => masked.push('.'),
            9 => masked.push('-'),
            _ => {}
        }
        masked.push(*c);
    }
    masked
}

/// Strip the punctuation added by [`add_cpf_mask`].
pub fn remove_cpf_mask(masked: &str) -> String {
    masked.chars().filter(|c| *c != '.' && *c != '-').collect()
}

/// Complete CPF: exactly eleven digits once the mask is removed.
pub fn is_complete_cpf(value: &str) -> bool {
    let digits = remove_cpf_mask(value);
    digits.len() == CPF_DIGITS && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_is_progressive() {
        assert_eq!(add_cpf_mask(""), "");
        assert_eq!(add_cpf_mask("123"), "123");
        assert_eq!(add_cpf_mask("1234"), "123.4");
        assert_eq!(add_cpf_mask("1234567"), "123.456.7");
        assert_eq!(add_cpf_mask("1234567890"), "123.456.789-0");
        assert_eq!(add_cpf_mask("12345678901"), "123.456.789-01");
    }

    #[test]
    fn test_mask_drops_extra_and_non_digits() {
        assert_eq!(add_cpf_mask("123.456.789-0199"), "123.456.789-01");
        assert_eq!(add_cpf_mask("12a3"), "123");
    }

    #[test]
    fn test_remask_is_stable() {
        let once = add_cpf_mask("12345678901");
        assert_eq!(add_cpf_mask(&once), once);
    }

    #[test]
    fn test_remove_mask() {
        assert_eq!(remove_cpf_mask("123.456.789-01"), "12345678901");
    }

    #[test]
    fn test_complete_cpf() {
        assert!(is_complete_cpf("123.456.789-01"));
        assert!(!is_complete_cpf("123.456.789-0"));
        assert!(!is_complete_cpf("abc"));
    }
}
