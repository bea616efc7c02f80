// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `errors.rs`

#[cfg(test)]
mod tests {
    use crate::errors::{is_api_unavailable, is_kube_not_found, Error};
    use kube::core::Status;

    fn api_error(code: u16) -> kube::Error {
        let mut status = Status::failure("test", "test");
        status.code = code;
        kube::Error::Api(Box::new(status))
    }

    #[test]
    fn test_kind_strings_are_stable() {
        assert_eq!(Error::InvalidConfig("chart_namespace").kind(), "invalid_config");
        assert_eq!(Error::NotFound("catalog".to_string()).kind(), "not_found");
        assert_eq!(Error::Conflict("app".to_string()).kind(), "conflict");
        assert_eq!(
            Error::EmptyValue("catalog not resolved".to_string()).kind(),
            "empty_value"
        );
        assert_eq!(
            Error::WrongType {
                expected: "YAML mapping",
                got: "sequence".to_string()
            }
            .kind(),
            "wrong_type"
        );
        assert_eq!(Error::Kube(api_error(500)).kind(), "kube_api");
    }

    #[test]
    fn test_is_not_found_matches_own_and_kube_404() {
        assert!(Error::NotFound("catalog".to_string()).is_not_found());
        assert!(Error::Kube(api_error(404)).is_not_found());
        assert!(!Error::Kube(api_error(500)).is_not_found());
        assert!(!Error::Conflict("app".to_string()).is_not_found());
    }

    #[test]
    fn test_is_kube_not_found() {
        assert!(is_kube_not_found(&api_error(404)));
        assert!(!is_kube_not_found(&api_error(409)));
    }

    #[test]
    fn test_is_conflict() {
        assert!(Error::Conflict("app".to_string()).is_conflict());
        assert!(Error::Kube(api_error(409)).is_conflict());
        assert!(!Error::Kube(api_error(404)).is_conflict());
    }

    #[test]
    fn test_gateway_errors_classify_as_unavailable() {
        assert!(is_api_unavailable(&api_error(502)));
        assert!(is_api_unavailable(&api_error(503)));
        assert!(is_api_unavailable(&api_error(504)));
    }

    #[test]
    fn test_client_errors_do_not_classify_as_unavailable() {
        assert!(!is_api_unavailable(&api_error(404)));
        assert!(!is_api_unavailable(&api_error(409)));
        assert!(!is_api_unavailable(&api_error(500)));
    }

    #[test]
    fn test_service_errors_classify_as_unavailable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connect refused");
        let err = kube::Error::Service(Box::new(io_err));
        assert!(is_api_unavailable(&err));
    }

    #[test]
    fn test_error_messages_name_the_subject() {
        let err = Error::InvalidConfig("resync_period");
        assert_eq!(err.to_string(), "invalid config: resync_period must not be empty");

        let err = Error::NotFound("catalog \"default\"".to_string());
        assert!(err.to_string().contains("catalog"));
    }
}
