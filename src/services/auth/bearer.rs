//! `Authorization: Bearer <credential>` parsing.

use axum::http::HeaderValue;

use super::AuthError;

/// Pull the bearer credential out of the raw `Authorization` header value.
///
/// The credential is returned verbatim; decoding is the verifier's job.
pub fn extract_bearer(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let value = header
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let mut parts = value.split_whitespace();
    let (Some(scheme), Some(credential), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AuthError::MalformedHeader);
    };

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::UnsupportedScheme);
    }

    Ok(credential)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(raw: &str) -> Result<String, AuthError> {
        let value = HeaderValue::from_str(raw).unwrap();
        extract_bearer(Some(&value)).map(str::to_owned)
    }

    #[test]
    fn absent_header_is_missing() {
        assert_eq!(extract_bearer(None), Err(AuthError::MissingHeader));
    }

    #[test]
    fn returns_second_part_verbatim() {
        assert_eq!(extract("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert_eq!(extract("bEaReR abc.def.ghi").unwrap(), "abc.def.ghi");
    }

    #[test]
    fn wrong_number_of_parts_is_malformed() {
        assert_eq!(extract("Bearer"), Err(AuthError::MalformedHeader));
        assert_eq!(extract("Bearer a b"), Err(AuthError::MalformedHeader));
        assert_eq!(extract(""), Err(AuthError::MalformedHeader));
    }

    #[test]
    fn other_schemes_are_unsupported() {
        assert_eq!(extract("Basic dXNlcjpwYXNz"), Err(AuthError::UnsupportedScheme));
        assert_eq!(extract("Token abc"), Err(AuthError::UnsupportedScheme));
    }

    #[test]
    fn non_visible_ascii_is_malformed() {
        let value = HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap();
        assert_eq!(extract_bearer(Some(&value)), Err(AuthError::MalformedHeader));
    }
}
