//! End-to-end lookups against a mock upstream.
//!
//! A single wiremock server stands in for archweb, GitLab, the AUR, Arch ARM
//! and GitHub; their paths do not overlap.

use arch_log_lib::providers::ArchProvider;
use arch_log_lib::transport::Transport;
use arch_log_lib::{
    Endpoints, FetchError, PackageRequest, Provider, ProviderFlags, ProviderKind, ResolveError,
    Resolver, Selection,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FOO_PROJECT: &str = "/api/v4/projects/archlinux%2Fpackaging%2Fpackages%2Ffoo/repository";

fn record(name: &str, repo: &str, version: &str) -> Value {
    json!({
        "pkgname": name,
        "pkgbase": name,
        "repo": repo,
        "pkgver": version,
        "pkgrel": "1",
        "epoch": 0,
    })
}

fn commit(id: &str, title: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "message": format!("{title}\n"),
        "author_name": "Packager",
        "created_at": created_at,
    })
}

fn tag(name: &str, commit: &str) -> Value {
    json!({ "name": name, "commit": { "id": commit } })
}

async fn mount_search(server: &MockServer, package: &str, results: Value) {
    Mock::given(method("GET"))
        .and(path("/packages/search/json/"))
        .and(query_param("name", package))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
        .mount(server)
        .await;
}

async fn mount_gitlab_page(server: &MockServer, action: &str, page: &str, next: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("{FOO_PROJECT}/{action}")))
        .and(query_param("per_page", "100"))
        .and(query_param("page", page))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-next-page", next)
                .set_body_json(body),
        )
        .mount(server)
        .await;
}

async fn mount_aur_info(server: &MockServer, package: &str, results: Value) {
    Mock::given(method("GET"))
        .and(path("/rpc/"))
        .and(query_param("type", "info"))
        .and(query_param("arg[]", package))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resultcount": results.as_array().map_or(0, Vec::len),
            "results": results,
            "type": "multiinfo",
            "version": 5,
        })))
        .mount(server)
        .await;
}

fn resolver(server: &MockServer) -> Resolver {
    Resolver::new(&Endpoints::all(server.uri())).unwrap()
}

fn default_selection() -> Selection {
    Selection::new(ProviderFlags::default())
}

#[tokio::test]
async fn single_repo_history_follows_pages_and_matches_tags() {
    let server = MockServer::start().await;
    mount_search(&server, "foo", json!([record("foo", "extra", "1.1")])).await;
    mount_gitlab_page(
        &server,
        "commits",
        "1",
        "2",
        json!([
            commit("c3", "Work in progress", "2024-03-01T12:00:00Z"),
            commit("c2", "Update to 1.1", "2024-02-01T12:00:00Z"),
        ]),
    )
    .await;
    mount_gitlab_page(
        &server,
        "commits",
        "2",
        "",
        json!([commit("c1", "Initial import", "2024-01-01T12:00:00Z")]),
    )
    .await;
    mount_gitlab_page(
        &server,
        "tags",
        "1",
        "",
        json!([tag("1.1-1", "c2"), tag("1.0-1", "c1")]),
    )
    .await;

    let request = PackageRequest::parse("foo", None).unwrap();
    let resolved = resolver(&server)
        .history(&request, &default_selection())
        .await
        .unwrap();

    assert_eq!(resolved.provider, ProviderKind::Arch);
    let summaries: Vec<&str> = resolved.value.iter().map(|c| c.summary.as_str()).collect();
    assert_eq!(summaries, ["Update to 1.1", "Initial import"]);

    let tags: Vec<&str> = resolved.value.iter().map(|c| c.tag.as_str()).collect();
    assert_eq!(tags, ["1.1-1", "1.0-1"]);
    assert!(resolved.value.iter().all(|c| c.repo.is_empty()));
    assert!(resolved.value.iter().all(|c| c.message.is_empty()));
}

#[tokio::test]
async fn multi_repo_history_carries_provenance() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        "foo",
        json!([
            record("foo", "extra", "1.1"),
            record("foo", "extra-testing", "1.2"),
        ]),
    )
    .await;
    mount_gitlab_page(
        &server,
        "commits",
        "1",
        "",
        json!([
            commit("c3", "Update to 1.2", "2024-03-01T12:00:00Z"),
            commit("c2", "Update to 1.1", "2024-02-01T12:00:00Z"),
            commit("c1", "Tweak", "2024-01-01T12:00:00Z"),
        ]),
    )
    .await;
    mount_gitlab_page(
        &server,
        "tags",
        "1",
        "",
        json!([tag("1.2-1", "c3"), tag("1.1-1", "c2")]),
    )
    .await;

    let provider = ArchProvider::new(Transport::new().unwrap(), &Endpoints::all(server.uri()));
    let changes = provider.history("foo", None).await.unwrap();

    let repos: Vec<&str> = changes.iter().map(|c| c.repo.as_str()).collect();
    assert_eq!(repos, ["extra-testing", "extra", ""]);
}

#[tokio::test]
async fn unknown_to_arch_falls_back_to_aur() {
    let server = MockServer::start().await;
    mount_search(&server, "bar", json!([])).await;
    mount_aur_info(
        &server,
        "bar",
        json!([{ "Name": "bar", "PackageBase": "bar" }]),
    )
    .await;

    let feed = r#"<?xml version='1.0' encoding='UTF-8'?>
<feed xmlns='http://www.w3.org/2005/Atom'>
<title>aur.git, branch bar</title>
<entry>
<title>Initial upload</title>
<updated>2024-01-01T12:00:00Z</updated>
<author><name>Someone</name></author>
<content type='text'>Initial upload</content>
</entry>
</feed>
"#;
    Mock::given(method("GET"))
        .and(path("/cgit/aur.git/atom/"))
        .and(query_param("h", "bar"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed))
        .mount(&server)
        .await;

    let request = PackageRequest::parse("bar", None).unwrap();
    let resolved = resolver(&server)
        .history(&request, &default_selection())
        .await
        .unwrap();

    assert_eq!(resolved.provider, ProviderKind::Aur);
    assert_eq!(resolved.value.len(), 1);
    assert_eq!(resolved.value[0].summary, "Initial upload");
    assert_eq!(resolved.value[0].author, "Someone");
}

#[tokio::test]
async fn unmatched_repo_is_an_error_listing_candidates() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        "foo",
        json!([
            record("foo", "extra", "1.1"),
            record("foo", "extra-testing", "1.2"),
        ]),
    )
    .await;
    Mock::given(path("/rpc/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = PackageRequest::parse("core/foo", None).unwrap();
    let err = resolver(&server)
        .history(&request, &default_selection())
        .await
        .unwrap_err();

    assert!(!err.is_not_found());
    assert!(matches!(
        err,
        ResolveError::Provider {
            provider: ProviderKind::Arch,
            source: FetchError::RepoUnavailable { .. }
        }
    ));
    let message = err.to_string();
    assert!(message.contains("'extra'"), "{message}");
    assert!(message.contains("'extra-testing'"), "{message}");
    assert!(message.contains("'core'"), "{message}");
}

#[tokio::test]
async fn pinned_pkgbuild_is_read_at_release_tag() {
    let server = MockServer::start().await;
    mount_search(&server, "foo", json!([record("foo", "extra", "1.1")])).await;
    Mock::given(method("GET"))
        .and(path(format!("{FOO_PROJECT}/files/PKGBUILD/raw")))
        .and(query_param("ref", "1.1-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pkgname=foo\n"))
        .mount(&server)
        .await;

    let request = PackageRequest::parse("extra/foo", None).unwrap();
    let resolved = resolver(&server)
        .raw_file(&request, &default_selection())
        .await
        .unwrap();

    assert_eq!(resolved.provider, ProviderKind::Arch);
    assert_eq!(resolved.value.as_ref(), b"pkgname=foo\n");
}

#[tokio::test]
async fn arm_pkgbuild_comes_from_github() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/data/packages/list"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .and(body_string_contains("search%5Bvalue%5D=foo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [["aarch64", "alarm", "foo", "1.0-1", "desc", "1"]]
        })))
        .mount(&server)
        .await;
    mount_search(&server, "foo", json!([])).await;
    mount_aur_info(&server, "foo", json!([])).await;
    Mock::given(method("GET"))
        .and(path("/repos/archlinuxarm/PKGBUILDs/contents/alarm/foo/PKGBUILD"))
        .and(header("accept", "application/vnd.github.raw"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pkgname=foo # arm\n"))
        .mount(&server)
        .await;

    let request = PackageRequest::parse("foo", None).unwrap();
    let flags = ProviderFlags {
        arm_only: true,
        ..Default::default()
    };
    let resolved = resolver(&server)
        .raw_file(&request, &Selection::new(flags))
        .await
        .unwrap();

    assert_eq!(resolved.provider, ProviderKind::Arm);
    assert_eq!(resolved.value.as_ref(), b"pkgname=foo # arm\n");
}

#[tokio::test]
async fn server_error_does_not_fall_back() {
    let server = MockServer::start().await;
    Mock::given(path("/packages/search/json/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(path("/rpc/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = PackageRequest::parse("foo", None).unwrap();
    let err = resolver(&server)
        .history(&request, &default_selection())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ResolveError::Provider {
            provider: ProviderKind::Arch,
            source: FetchError::Status { .. }
        }
    ));
}

#[tokio::test]
async fn missing_everywhere_reports_both_providers() {
    let server = MockServer::start().await;
    mount_search(&server, "nope", json!([])).await;
    mount_aur_info(&server, "nope", json!([])).await;

    let request = PackageRequest::parse("nope", None).unwrap();
    let err = resolver(&server)
        .history(&request, &default_selection())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(
        err.to_string(),
        "package 'nope' could neither be found on Arch nor AUR"
    );
}
