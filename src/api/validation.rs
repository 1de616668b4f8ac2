use super::ApiError;

pub fn validate_video_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid video ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_share_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid share link ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

/// Interprets an HTML form checkbox or boolean-ish form value.
pub fn parse_form_bool(value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" | "" => Ok(false),
        other => Err(ApiError::validation(format!(
            "Invalid boolean value: '{}'",
            other
        ))),
    }
}

/// Share tokens are base64url; anything else can never match.
pub fn is_plausible_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= 128
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
