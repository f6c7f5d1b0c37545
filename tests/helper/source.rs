//! Remote package source test utilities

use mockito::{Mock, ServerGuard};

use super::PackageBuilder;

/// Serve a service index pointing at `{server}/flat/`
pub async fn mock_service_index(server: &mut ServerGuard) -> Mock {
    let body = serde_json::json!({
        "version": "3.0.0",
        "resources": [
            { "@id": format!("{}/query", server.url()), "@type": "SearchQueryService" },
            { "@id": format!("{}/flat/", server.url()), "@type": "PackageBaseAddress/3.0.0" }
        ]
    });

    server
        .mock("GET", "/index.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

/// Serve the version listing, manifests and archives of every version of one package
pub async fn mock_package(server: &mut ServerGuard, versions: &[PackageBuilder]) -> Vec<Mock> {
    let Some(first) = versions.first() else {
        return Vec::new();
    };
    let lower_name = first.name().to_ascii_lowercase();
    let version_names: Vec<&str> = versions.iter().map(PackageBuilder::version).collect();

    let mut mocks = vec![
        server
            .mock("GET", format!("/flat/{}/index.json", lower_name).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!({ "versions": version_names }).to_string())
            .create_async()
            .await,
    ];

    for package in versions {
        let version = package.version();
        if let Some(manifest) = package.manifest_json() {
            mocks.push(
                server
                    .mock(
                        "GET",
                        format!("/flat/{0}/{1}/{0}.deps.json", lower_name, version).as_str(),
                    )
                    .with_status(200)
                    .with_header("content-type", "application/json")
                    .with_body(manifest)
                    .create_async()
                    .await,
            );
        }
        mocks.push(
            server
                .mock(
                    "GET",
                    format!("/flat/{0}/{1}/{0}.{1}.nupkg", lower_name, version).as_str(),
                )
                .with_status(200)
                .with_body(package.archive_bytes())
                .create_async()
                .await,
        );
    }

    mocks
}
