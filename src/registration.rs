//! Registrations derivable from the ICAO address alone
//!
//! US civil aircraft get their 24-bit address assigned in N-number order, so
//! the registration can be computed until the metadata lookup answers.

const US_FIRST: u32 = 0xA0_0001;
const US_COUNT: u32 = 915_399;

/// Letters used in N-number suffixes (no I or O)
const LIMITED_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Address blocks per leading digit, and within the second/third/fourth digit
const STRIDE_1: u32 = 101_711;
const STRIDE_2: u32 = 10_111;
const STRIDE_3: u32 = 951;
const STRIDE_4: u32 = 35;

/// Suffix slots before the next digit: none, one letter, or two letters
const LETTER_SLOTS: u32 = 601;

/// Registration implied by an ICAO address, if it falls in a computable block
pub fn registration_from_icao(icao: &str) -> Option<String> {
    let address = u32::from_str_radix(icao.trim(), 16).ok()?;
    n_number(address)
}

fn n_number(address: u32) -> Option<String> {
    let mut offset = address.checked_sub(US_FIRST)?;
    if offset >= US_COUNT {
        return None;
    }

    let mut reg = format!("N{}", offset / STRIDE_1 + 1);
    offset %= STRIDE_1;
    if offset < LETTER_SLOTS {
        return Some(reg + letters(offset).as_str());
    }

    for stride in [STRIDE_2, STRIDE_3] {
        offset -= LETTER_SLOTS;
        reg.push_str(&(offset / stride).to_string());
        offset %= stride;
        if offset < LETTER_SLOTS {
            return Some(reg + letters(offset).as_str());
        }
    }

    offset -= LETTER_SLOTS;
    reg.push_str(&(offset / STRIDE_4).to_string());
    offset %= STRIDE_4;
    if offset <= LIMITED_ALPHABET.len() as u32 {
        return Some(reg + letter(offset).as_str());
    }
    Some(format!("{}{}", reg, offset - LIMITED_ALPHABET.len() as u32 - 1))
}

/// Zero, one or two suffix letters
fn letters(rem: u32) -> String {
    if rem == 0 {
        return String::new();
    }
    let rem = rem - 1;
    let first = LIMITED_ALPHABET[(rem / 25) as usize] as char;
    format!("{}{}", first, letter(rem % 25))
}

fn letter(rem: u32) -> String {
    if rem == 0 {
        return String::new();
    }
    (LIMITED_ALPHABET[(rem - 1) as usize] as char).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_start() {
        assert_eq!(registration_from_icao("a00001").as_deref(), Some("N1"));
        assert_eq!(registration_from_icao("A00002").as_deref(), Some("N1A"));
        assert_eq!(registration_from_icao("a00003").as_deref(), Some("N1AA"));
    }

    #[test]
    fn test_block_end() {
        assert_eq!(registration_from_icao("adf7c7").as_deref(), Some("N99999"));
        assert_eq!(registration_from_icao("adf7c8"), None);
    }

    #[test]
    fn test_outside_us_block() {
        assert_eq!(registration_from_icao("3c6dd4"), None);
        assert_eq!(registration_from_icao("~2b1c4d"), None);
        assert_eq!(registration_from_icao("a00000"), None);
    }
}
