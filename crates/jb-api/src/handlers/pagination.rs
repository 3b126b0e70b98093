use crate::error::ApiError;

const MAX_LIMIT: u32 = 100;
const MAX_PAGE: u32 = 10_000;

pub fn validate_pagination(limit: u32, page: u32) -> Result<(u32, u32), ApiError> {
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }

    if page > MAX_PAGE {
        return Err(ApiError::BadRequest(format!(
            "page must be between 0 and {MAX_PAGE}"
        )));
    }

    Ok((limit, page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_window_bounds() {
        assert!(validate_pagination(1, 0).is_ok());
        assert!(validate_pagination(100, 10_000).is_ok());
    }

    #[test]
    fn rejects_out_of_range_windows() {
        assert!(matches!(
            validate_pagination(0, 0),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            validate_pagination(101, 0),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            validate_pagination(20, 10_001),
            Err(ApiError::BadRequest(_))
        ));
    }
}
