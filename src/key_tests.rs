// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `key.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{
        App, AppSpec, AppSpecKubeConfig, Catalog, CatalogSpec, CatalogSpecStorage, Chart,
        ChartSpec,
    };
    use crate::key;
    use chrono::{TimeZone, Utc};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use std::collections::BTreeMap;

    fn test_app(name: &str, namespace: &str) -> App {
        let mut app = App::new(
            name,
            AppSpec {
                name: "prometheus".to_string(),
                namespace: "monitoring".to_string(),
                version: "1.2.3".to_string(),
                catalog: "default".to_string(),
                catalog_namespace: None,
                kube_config: AppSpecKubeConfig {
                    in_cluster: true,
                    secret: None,
                    context: None,
                },
                config: None,
                user_config: None,
            },
        );
        app.metadata.namespace = Some(namespace.to_string());
        app
    }

    fn test_catalog(url: &str) -> Catalog {
        Catalog::new(
            "default",
            CatalogSpec {
                title: None,
                description: None,
                storage: CatalogSpecStorage {
                    storage_type: "helm".to_string(),
                    url: url.to_string(),
                },
                config: None,
            },
        )
    }

    #[test]
    fn test_derived_object_names() {
        let app = test_app("my-app", "org-acme");

        assert_eq!(key::chart_config_map_name(&app), "my-app-chart-values");
        assert_eq!(key::chart_secret_name(&app), "my-app-chart-secrets");
        assert_eq!(
            key::cluster_values_config_map_name(&app),
            "org-acme-cluster-values"
        );
    }

    #[test]
    fn test_finalizer_name_includes_app_name() {
        let app = test_app("my-app", "org-acme");
        assert_eq!(
            key::finalizer_name(&app),
            "app-operator.giantswarm.io/app-my-app"
        );
    }

    #[test]
    fn test_tarball_url() {
        let app = test_app("my-app", "org-acme");
        let catalog = test_catalog("https://example/repo");

        assert_eq!(
            key::tarball_url(&app, &catalog),
            "https://example/repo/prometheus-1.2.3.tgz"
        );
    }

    #[test]
    fn test_tarball_url_trims_trailing_slash() {
        let app = test_app("my-app", "org-acme");
        let catalog = test_catalog("https://example/repo/");

        assert_eq!(
            key::tarball_url(&app, &catalog),
            "https://example/repo/prometheus-1.2.3.tgz"
        );
    }

    #[test]
    fn test_catalog_namespace_empty_string_counts_as_unset() {
        let mut app = test_app("my-app", "org-acme");
        assert_eq!(key::catalog_namespace(&app), None);

        app.spec.catalog_namespace = Some(String::new());
        assert_eq!(key::catalog_namespace(&app), None);

        app.spec.catalog_namespace = Some("giantswarm".to_string());
        assert_eq!(key::catalog_namespace(&app), Some("giantswarm"));
    }

    #[test]
    fn test_version_label_defaults_to_empty() {
        let mut app = test_app("my-app", "org-acme");
        assert_eq!(key::version_label(&app), "");

        app.metadata.labels = Some(BTreeMap::from([(
            "app-operator.giantswarm.io/version".to_string(),
            "3.2.1".to_string(),
        )]));
        assert_eq!(key::version_label(&app), "3.2.1");
    }

    #[test]
    fn test_is_deleted() {
        let mut app = test_app("my-app", "org-acme");
        assert!(!key::is_deleted(&app));

        app.metadata.deletion_timestamp = Some(Time(k8s_openapi::jiff::Timestamp::now()));
        assert!(key::is_deleted(&app));
    }

    #[test]
    fn test_is_paused() {
        let mut app = test_app("my-app", "org-acme");
        assert!(!key::is_paused(&app));

        app.metadata.annotations = Some(BTreeMap::from([(
            "app-operator.giantswarm.io/paused".to_string(),
            "true".to_string(),
        )]));
        assert!(key::is_paused(&app));

        app.metadata.annotations = Some(BTreeMap::from([(
            "app-operator.giantswarm.io/paused".to_string(),
            "false".to_string(),
        )]));
        assert!(!key::is_paused(&app));
    }

    #[test]
    fn test_is_app_cordoned_requires_both_annotations() {
        let mut app = test_app("my-app", "org-acme");
        assert!(!key::is_app_cordoned(&app));

        app.metadata.annotations = Some(BTreeMap::from([(
            "app-operator.giantswarm.io/cordon-reason".to_string(),
            "maintenance".to_string(),
        )]));
        assert!(!key::is_app_cordoned(&app));

        app.metadata.annotations = Some(BTreeMap::from([
            (
                "app-operator.giantswarm.io/cordon-reason".to_string(),
                "maintenance".to_string(),
            ),
            (
                "app-operator.giantswarm.io/cordon-until".to_string(),
                "2999-01-01T00:00:00".to_string(),
            ),
        ]));
        assert!(key::is_app_cordoned(&app));
    }

    #[test]
    fn test_is_app_cordoned_lifts_after_expiry() {
        let mut app = test_app("my-app", "org-acme");
        app.metadata.annotations = Some(BTreeMap::from([
            (
                "app-operator.giantswarm.io/cordon-reason".to_string(),
                "maintenance".to_string(),
            ),
            (
                "app-operator.giantswarm.io/cordon-until".to_string(),
                "2001-01-01T00:00:00".to_string(),
            ),
        ]));
        assert!(!key::is_app_cordoned(&app));
    }

    #[test]
    fn test_is_chart_cordoned_uses_chart_operator_prefix() {
        let mut chart = Chart::new("my-app", ChartSpec::default());
        assert!(!key::is_chart_cordoned(&chart));

        // App-operator prefixed annotations are ignored on charts.
        chart.metadata.annotations = Some(BTreeMap::from([
            (
                "app-operator.giantswarm.io/cordon-reason".to_string(),
                "maintenance".to_string(),
            ),
            (
                "app-operator.giantswarm.io/cordon-until".to_string(),
                "2999-01-01T00:00:00".to_string(),
            ),
        ]));
        assert!(!key::is_chart_cordoned(&chart));

        chart.metadata.annotations = Some(BTreeMap::from([
            (
                "chart-operator.giantswarm.io/cordon-reason".to_string(),
                "maintenance".to_string(),
            ),
            (
                "chart-operator.giantswarm.io/cordon-until".to_string(),
                "2999-01-01T00:00:00".to_string(),
            ),
        ]));
        assert!(key::is_chart_cordoned(&chart));
    }

    #[test]
    fn test_is_cordon_expired_parses_both_layouts() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        assert!(key::is_cordon_expired("2024-06-01T11:59:59", now));
        assert!(!key::is_cordon_expired("2024-06-01T12:00:01", now));

        assert!(key::is_cordon_expired("2024-06-01T11:59:59+00:00", now));
        assert!(!key::is_cordon_expired("2024-06-01T12:00:01Z", now));

        // Garbage fails closed: the cordon stays.
        assert!(!key::is_cordon_expired("not-a-timestamp", now));
    }

    #[test]
    fn test_app_status_defaults_to_empty() {
        let app = test_app("my-app", "org-acme");
        let status = key::app_status(&app);
        assert!(status.release.is_none());
        assert!(status.app_version.is_none());
    }
}
