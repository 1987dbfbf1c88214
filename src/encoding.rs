use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// RFC 3986 unreserved characters are left as-is, everything else is escaped.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode `input` the way OAuth 1.0a requires (uppercase `%XX`).
pub fn encode(input: &str) -> String {
    utf8_percent_encode(input, UNRESERVED).to_string()
}

/// Percent-decode `input`. `+` is kept as-is; invalid UTF-8 is replaced.
pub fn decode(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreserved_untouched() {
        let s = "AZaz09-._~";
        assert_eq!(encode(s), s);
    }

    #[test]
    fn reserved_escaped_uppercase() {
        assert_eq!(encode("a b"), "a%20b");
        assert_eq!(encode("/+="), "%2F%2B%3D");
        assert_eq!(
            encode("!*'();:@&=+$,/?#[]"),
            "%21%2A%27%28%29%3B%3A%40%26%3D%2B%24%2C%2F%3F%23%5B%5D"
        );
        assert_eq!(encode("%"), "%25");
    }

    #[test]
    fn multibyte_escaped_per_byte() {
        assert_eq!(encode("少女"), "%E5%B0%91%E5%A5%B3");
    }

    #[test]
    fn decode_reverses_encode() {
        for s in &[
            "",
            "plain",
            "Hello Ladies + Gentlemen, a signed OAuth request!",
            "!*'();:@&=+$,/?#[]-._~",
            "終末旅行 100%",
        ] {
            assert_eq!(decode(&encode(s)), *s);
        }
    }

    #[test]
    fn decode_keeps_plus() {
        assert_eq!(decode("a+b%2Bc"), "a+b+c");
    }
}
