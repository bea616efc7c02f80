// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `settings.rs`

#[cfg(test)]
mod tests {
    use crate::errors::Error;
    use crate::settings::Settings;
    use std::time::Duration;

    fn valid_settings() -> Settings {
        Settings {
            chart_namespace: "giantswarm".to_string(),
            image_registry: "quay.io".to_string(),
            http_client_timeout: Duration::from_secs(10),
            resync_period: Duration::from_secs(300),
            unique_app: false,
            webhook_base_url: None,
            webhook_auth_token: None,
            version: "3.0.0".to_string(),
        }
    }

    #[test]
    fn test_valid_settings_pass_validation() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_missing_chart_namespace_is_fatal() {
        let mut settings = valid_settings();
        settings.chart_namespace = String::new();
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidConfig("chart_namespace"))
        ));
    }

    #[test]
    fn test_missing_image_registry_is_fatal() {
        let mut settings = valid_settings();
        settings.image_registry = String::new();
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidConfig("image_registry"))
        ));
    }

    #[test]
    fn test_zero_http_client_timeout_is_fatal() {
        let mut settings = valid_settings();
        settings.http_client_timeout = Duration::ZERO;
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidConfig("http_client_timeout"))
        ));
    }

    #[test]
    fn test_zero_resync_period_is_fatal() {
        let mut settings = valid_settings();
        settings.resync_period = Duration::ZERO;
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidConfig("resync_period"))
        ));
    }

    #[test]
    fn test_versioned_selector_matches_own_version_only() {
        let settings = valid_settings();
        assert_eq!(
            settings.version_selector(),
            "app-operator.giantswarm.io/version=3.0.0"
        );
    }

    #[test]
    fn test_unique_selector_also_matches_reserved_version() {
        let mut settings = valid_settings();
        settings.unique_app = true;
        assert_eq!(
            settings.version_selector(),
            "app-operator.giantswarm.io/version in (0.0.0,3.0.0)"
        );
    }
}
