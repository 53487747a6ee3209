//! API endpoint URL builders

/// Build token (login) URL
pub fn token_url(base_url: &str) -> String {
    format!("{}/api/token/", base_url)
}

/// Build token refresh URL
pub fn token_refresh_url(base_url: &str) -> String {
    format!("{}/api/token/refresh/", base_url)
}

/// Build upload URL
pub fn upload_url(base_url: &str) -> String {
    format!("{}/api/upload/", base_url)
}

/// Build dataset list URL
pub fn datasets_url(base_url: &str, limit: Option<usize>) -> String {
    let mut url = format!("{}/api/datasets/", base_url);

    if let Some(limit) = limit {
        url.push_str(&format!("?limit={}", limit));
    }

    url
}

/// Build raw CSV download URL
pub fn download_url(base_url: &str, id: i64) -> String {
    format!("{}/api/download/{}/", base_url, id)
}

/// Build latest summary URL
pub fn latest_summary_url(base_url: &str) -> String {
    format!("{}/api/latest_summary/", base_url)
}
