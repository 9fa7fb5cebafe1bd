// src/domain/referrer.rs
//
// Referrers of the form `android-app://<package>` identify the calling app.

use crate::domain::{DomainResult, Uri};

pub const APP_SCHEME: &str = "android-app";

/// Package of the calling app, if the referrer is an app referrer.
pub fn get_referring_package(referrer: Option<&Uri>) -> Option<&str> {
    referrer
        .filter(|uri| uri.scheme() == APP_SCHEME)
        .map(|uri| uri.host())
}

pub fn create_referrer(package_name: &str) -> DomainResult<Uri> {
    Uri::parse(&format!("{}://{}", APP_SCHEME, package_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_referrer_roundtrip() {
        let referrer = create_referrer("com.example.chat").unwrap();
        assert_eq!(get_referring_package(Some(&referrer)), Some("com.example.chat"));
    }

    #[test]
    fn test_web_referrer_has_no_package() {
        let referrer = Uri::parse("https://news.example.com/").unwrap();
        assert_eq!(get_referring_package(Some(&referrer)), None);
        assert_eq!(get_referring_package(None), None);
    }
}
