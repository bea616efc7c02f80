// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Mock Kubernetes API plumbing and fixtures for unit tests.
//!
//! Wraps `tower_test::mock` so reconciler tests can script the exact API
//! conversation a unit is expected to have: each handler asserts the method
//! and path of the next request and answers as the apiserver would. A unit
//! making a call the script does not expect fails its own API call (the mock
//! channel closes), so the surrounding assertions catch it.

use http::{Request, Response};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use kube::client::Body;
use kube::Client;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::context::Context;
use crate::crd::{
    App, AppSpec, AppSpecConfig, AppSpecKubeConfig, AppStatus, Catalog, CatalogSpec,
    CatalogSpecStorage, NamespacedObjectRef,
};
use crate::settings::Settings;

type ApiServerHandle = tower_test::mock::Handle<Request<Body>, Response<Body>>;

/// Scripted stand-in for the Kubernetes API server.
pub struct ApiServer(ApiServerHandle);

impl ApiServer {
    /// Create a mocked client together with the handle serving it.
    pub fn pair() -> (Client, ApiServer) {
        let (mock_service, handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(mock_service, "default");
        (client, ApiServer(handle))
    }

    /// Serve the next request: assert its method and path, answer with the
    /// given status and body. Returns the request body for further
    /// assertions (`Null` when the request had none).
    pub async fn serve(
        &mut self,
        method: &str,
        path: &str,
        status: u16,
        body: serde_json::Value,
    ) -> serde_json::Value {
        let (request, send) = self.0.next_request().await.expect("service not called");
        assert_eq!(request.method().as_str(), method, "method for {path}");
        assert_eq!(request.uri().path(), path);

        let request_bytes = request.into_body().collect_bytes().await.unwrap();
        let request_json = if request_bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&request_bytes).expect("request body is json")
        };

        let response = Response::builder()
            .status(status)
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        send.send_response(response);

        request_json
    }

    /// Serve the next request by echoing its body back, the way the
    /// apiserver acknowledges a create or replace. Returns the request body.
    pub async fn serve_echo(
        &mut self,
        method: &str,
        path: &str,
        status: u16,
    ) -> serde_json::Value {
        let (request, send) = self.0.next_request().await.expect("service not called");
        assert_eq!(request.method().as_str(), method, "method for {path}");
        assert_eq!(request.uri().path(), path);

        let request_bytes = request.into_body().collect_bytes().await.unwrap();
        let request_json: serde_json::Value =
            serde_json::from_slice(&request_bytes).expect("request body is json");

        let response = Response::builder()
            .status(status)
            .body(Body::from(request_bytes.to_vec()))
            .unwrap();
        send.send_response(response);

        request_json
    }

    /// Serve the next request with a Kubernetes error status.
    pub async fn serve_error(&mut self, method: &str, path: &str, code: u16, reason: &str) {
        self.serve(method, path, code, error_status(code, reason))
            .await;
    }
}

/// Await a scripted API conversation, failing the test if it does not
/// complete within a second (i.e. an expected call never arrived).
pub async fn timeout_after_1s(handle: tokio::task::JoinHandle<()>) {
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("timeout on mock apiserver")
        .expect("scenario succeeded")
}

/// A Kubernetes `Status` error body, as the apiserver returns it.
pub fn error_status(code: u16, reason: &str) -> serde_json::Value {
    json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": reason,
        "reason": reason,
        "code": code,
    })
}

/// Operator settings used by all unit tests.
pub fn test_settings() -> Settings {
    Settings {
        chart_namespace: "giantswarm".to_string(),
        image_registry: "quay.io".to_string(),
        http_client_timeout: Duration::from_secs(5),
        resync_period: Duration::from_secs(300),
        unique_app: false,
        webhook_base_url: None,
        webhook_auth_token: None,
        version: "3.0.0".to_string(),
    }
}

impl Context {
    /// Create a test context with a mocked kube client and test settings.
    pub fn test() -> (Context, ApiServer) {
        let (client, api) = ApiServer::pair();
        (Context::new(client, test_settings()), api)
    }
}

impl App {
    /// A plain in-cluster test app: `foo` in namespace `org-acme`, chart
    /// `foo@1.2.3` from catalog `default` into namespace `monitoring`.
    pub fn test() -> Self {
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

    /// Pin the catalog lookup to one namespace.
    pub fn with_catalog_namespace(mut self, namespace: &str) -> Self {
        self.spec.catalog_namespace = Some(namespace.to_string());
        self
    }

    /// Target a remote cluster through a kubeconfig secret.
    pub fn with_kubeconfig_secret(mut self, name: &str, namespace: &str) -> Self {
        self.spec.kube_config.in_cluster = false;
        self.spec.kube_config.secret = Some(NamespacedObjectRef {
            name: name.to_string(),
            namespace: namespace.to_string(),
        });
        self
    }

    /// Reference an app-level config map.
    pub fn with_app_config_map(mut self, name: &str, namespace: &str) -> Self {
        self.spec.config.get_or_insert_with(AppSpecConfig::default).config_map =
            Some(NamespacedObjectRef {
                name: name.to_string(),
                namespace: namespace.to_string(),
            });
        self
    }

    /// Reference an app-level secret.
    pub fn with_app_secret(mut self, name: &str, namespace: &str) -> Self {
        self.spec.config.get_or_insert_with(AppSpecConfig::default).secret =
            Some(NamespacedObjectRef {
                name: name.to_string(),
                namespace: namespace.to_string(),
            });
        self
    }

    /// Pretend the app already carries a status.
    pub fn with_status(mut self, status: AppStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Mark the app as being deleted.
    pub fn needs_delete(mut self) -> Self {
        self.metadata.deletion_timestamp = Some(Time(k8s_openapi::jiff::Timestamp::now()));
        self
    }

    /// Attach the per-app finalizer.
    pub fn finalized(mut self) -> Self {
        let finalizer = crate::key::finalizer_name(&self);
        self.metadata
            .finalizers
            .get_or_insert_with(Vec::new)
            .push(finalizer);
        self
    }

    /// Pause the app via the annotation.
    pub fn paused(mut self) -> Self {
        self.metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(
                "app-operator.giantswarm.io/paused".to_string(),
                "true".to_string(),
            );
        self
    }
}

impl Catalog {
    /// Catalog `default` in namespace `default` serving `https://example/repo`.
    pub fn test() -> Self {
        let mut catalog = Catalog::new(
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
        );
        catalog.metadata.namespace = Some("default".to_string());
        catalog
    }
}

/// Minimal kubeconfig accepted by the client factory. The server address
/// points at a closed local port, so building a client succeeds while any
/// connection attempt is refused.
pub fn kubeconfig_yaml() -> Vec<u8> {
    b"apiVersion: v1
kind: Config
clusters:
- cluster:
    server: https://127.0.0.1:1
    insecure-skip-tls-verify: true
  name: test
contexts:
- context:
    cluster: test
    user: admin
  name: test
current-context: test
users:
- name: admin
  user:
    token: secret-token
"
    .to_vec()
}

/// A kubeconfig secret as the factory reads it.
pub fn kubeconfig_secret(resource_version: &str, deleting: bool, kubeconfig: &[u8]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some("cluster-kubeconfig".to_string()),
            namespace: Some("org-acme".to_string()),
            resource_version: Some(resource_version.to_string()),
            deletion_timestamp: deleting.then(|| Time(k8s_openapi::jiff::Timestamp::now())),
            ..ObjectMeta::default()
        },
        data: Some(BTreeMap::from([(
            "kubeConfig".to_string(),
            k8s_openapi::ByteString(kubeconfig.to_vec()),
        )])),
        ..Secret::default()
    }
}
