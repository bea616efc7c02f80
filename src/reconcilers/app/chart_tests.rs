// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `chart.rs`

#[cfg(test)]
mod tests {
    use crate::reconcilers::app::chart::ChartResource;
    use crate::context::ReconcileCtx;
    use crate::crd::{
        App, AppSpec, AppSpecKubeConfig, Catalog, CatalogSpec, CatalogSpecStorage, Chart,
        ChartSpec,
    };
    use crate::reconcilers::resources::{ChainResource, Change};
    use crate::settings::Settings;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn test_settings() -> Settings {
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

    fn test_app() -> App {
        let mut app = App::new(
            "foo",
            AppSpec {
                name: "foo".to_string(),
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
        app.metadata.namespace = Some("org-acme".to_string());
        app
    }

    fn test_catalog() -> Catalog {
        Catalog::new(
            "default",
            CatalogSpec {
                title: None,
                description: None,
                storage: CatalogSpecStorage {
                    storage_type: "helm".to_string(),
                    url: "https://example/repo".to_string(),
                },
                config: None,
            },
        )
    }

    fn desired(unit: &ChartResource, app: &App, rctx: &ReconcileCtx) -> Chart {
        unit.desired_chart(app, &test_catalog(), rctx)
    }

    #[test]
    fn test_desired_chart_identity_and_tarball_url() {
        let unit = ChartResource::new(&test_settings());
        let chart = desired(&unit, &test_app(), &ReconcileCtx::default());

        assert_eq!(chart.metadata.name.as_deref(), Some("foo"));
        assert_eq!(chart.metadata.namespace.as_deref(), Some("giantswarm"));
        assert_eq!(chart.spec.name, "foo");
        assert_eq!(chart.spec.namespace, "monitoring");
        assert_eq!(chart.spec.version, "1.2.3");
        assert_eq!(chart.spec.catalog, "default");
        assert_eq!(
            chart.spec.tarball_url,
            "https://example/repo/foo-1.2.3.tgz"
        );
    }

    #[test]
    fn test_desired_chart_has_no_config_when_nothing_merged() {
        let unit = ChartResource::new(&test_settings());
        let chart = desired(&unit, &test_app(), &ReconcileCtx::default());

        assert!(chart.spec.config.is_none());
    }

    #[test]
    fn test_desired_chart_references_only_existing_derived_objects() {
        let unit = ChartResource::new(&test_settings());

        let mut rctx = ReconcileCtx::default();
        rctx.config_map_desired = true;
        let chart = desired(&unit, &test_app(), &rctx);

        let config = chart.spec.config.expect("config must be present");
        let config_map = config.config_map.expect("config map ref must be present");
        assert_eq!(config_map.name, "foo-chart-values");
        assert_eq!(config_map.namespace, "giantswarm");
        assert!(config.secret.is_none());

        let mut rctx = ReconcileCtx::default();
        rctx.config_map_desired = true;
        rctx.secret_desired = true;
        let chart = desired(&unit, &test_app(), &rctx);

        let config = chart.spec.config.expect("config must be present");
        assert_eq!(config.secret.unwrap().name, "foo-chart-secrets");
    }

    #[test]
    fn test_desired_chart_labels() {
        let unit = ChartResource::new(&test_settings());
        let chart = desired(&unit, &test_app(), &ReconcileCtx::default());

        let labels = chart.metadata.labels.expect("labels must be present");
        assert_eq!(
            labels.get("giantswarm.io/managed-by").map(String::as_str),
            Some("app-operator")
        );
        assert_eq!(
            labels
                .get("chart-operator.giantswarm.io/version")
                .map(String::as_str),
            Some("1.0.0")
        );
    }

    #[test]
    fn test_chart_operator_version_carried_from_app_label() {
        let unit = ChartResource::new(&test_settings());
        let mut app = test_app();
        app.metadata.labels = Some(BTreeMap::from([(
            "chart-operator.giantswarm.io/version".to_string(),
            "2.7.0".to_string(),
        )]));

        let chart = desired(&unit, &app, &ReconcileCtx::default());
        let labels = chart.metadata.labels.unwrap();
        assert_eq!(
            labels
                .get("chart-operator.giantswarm.io/version")
                .map(String::as_str),
            Some("2.7.0")
        );
    }

    #[test]
    fn test_chart_operator_annotations_carried_from_app() {
        let unit = ChartResource::new(&test_settings());
        let mut app = test_app();
        app.metadata.annotations = Some(BTreeMap::from([
            (
                "chart-operator.giantswarm.io/cordon-reason".to_string(),
                "maintenance".to_string(),
            ),
            (
                "app-operator.giantswarm.io/paused".to_string(),
                "true".to_string(),
            ),
        ]));

        let chart = desired(&unit, &app, &ReconcileCtx::default());
        let annotations = chart.metadata.annotations.unwrap();
        assert_eq!(
            annotations
                .get("chart-operator.giantswarm.io/cordon-reason")
                .map(String::as_str),
            Some("maintenance")
        );
        // App-operator owned annotations stay on the App.
        assert!(!annotations.contains_key("app-operator.giantswarm.io/paused"));
    }

    #[test]
    fn test_webhook_annotation_when_configured() {
        let mut settings = test_settings();
        settings.webhook_base_url = Some("https://webhook.example".to_string());
        let unit = ChartResource::new(&settings);

        let chart = desired(&unit, &test_app(), &ReconcileCtx::default());
        let annotations = chart.metadata.annotations.unwrap();
        assert_eq!(
            annotations
                .get("chart-operator.giantswarm.io/webhook-url")
                .map(String::as_str),
            Some("https://webhook.example/org-acme/foo")
        );
    }

    #[test]
    fn test_equality_ignores_server_managed_metadata() {
        let unit = ChartResource::new(&test_settings());
        let desired_chart = desired(&unit, &test_app(), &ReconcileCtx::default());

        let mut current = desired_chart.clone();
        current.metadata.resource_version = Some("12345".to_string());
        current.metadata.uid = Some("b7e9".to_string());

        assert!(unit.states_equal(&current, &desired_chart));
        assert_eq!(
            unit.new_update_change(Some(&current), Some(&desired_chart)),
            None
        );
    }

    #[test]
    fn test_update_change_carries_current_resource_version() {
        let unit = ChartResource::new(&test_settings());
        let desired_chart = desired(&unit, &test_app(), &ReconcileCtx::default());

        let mut current = desired_chart.clone();
        current.metadata.resource_version = Some("12345".to_string());
        current.spec.version = "1.0.0".to_string();

        match unit.new_update_change(Some(&current), Some(&desired_chart)) {
            Some(Change::Update(update)) => {
                assert_eq!(update.metadata.resource_version.as_deref(), Some("12345"));
                assert_eq!(update.spec.version, "1.2.3");
            }
            other => panic!("expected update change, got {other:?}"),
        }
    }

    #[test]
    fn test_spec_change_triggers_update() {
        let unit = ChartResource::new(&test_settings());
        let desired_chart = desired(&unit, &test_app(), &ReconcileCtx::default());

        let mut current = desired_chart.clone();
        current.spec.tarball_url = "https://example/repo/foo-1.0.0.tgz".to_string();

        assert!(!unit.states_equal(&current, &desired_chart));
    }

    #[test]
    fn test_deletion_marker_names_the_chart() {
        // During the delete sweep the desired state is a bare shell carrying
        // only identity, enough for the delete diff.
        let chart = Chart::new("foo", ChartSpec::default());
        assert_eq!(chart.metadata.name.as_deref(), Some("foo"));
    }
}
