pub fn encode(input: impl AsRef<[u8]>) -> String {
    base64::encode_config(input, base64::URL_SAFE_NO_PAD)
}

pub fn decode(input: impl AsRef<[u8]>) -> Result<Vec<u8>, base64::DecodeError> {
    base64::decode_config(input, base64::URL_SAFE_NO_PAD)
}

/// Decode input that may use either the url-safe or the standard alphabet.
/// CAs hand out EAB HMAC keys in both forms.
pub fn decode_any(input: impl AsRef<str>) -> Result<Vec<u8>, base64::DecodeError> {
    let input = input.as_ref().trim_end_matches('=');
    if input.contains('+') || input.contains('/') {
        base64::decode_config(input, base64::STANDARD_NO_PAD)
    } else {
        decode(input)
    }
}
