use med_news_tui::api::{ApiError, ApiService};
use med_news_tui::internal::collection::{CollectionKind, CollectionOutcome};
use med_news_tui::internal::controller::{FetchApplied, QueryController, load_list};
use med_news_tui::internal::query::FilterUpdate;
use mockito::{Matcher, Server, ServerGuard};

const ARTICLES_PAGE: &str = r#"{
    "articles": [
        {
            "id": 41,
            "title": "독감 백신 접종률 상승",
            "description": null,
            "url": "https://news.example.com/41",
            "source": "의학신문",
            "category": "보건",
            "published_date": "2024-03-01T09:30:00",
            "confidence_score": 0.87,
            "keywords": ["백신", "독감"]
        }
    ],
    "total_pages": 3
}"#;

async fn mock_side_endpoints(server: &mut ServerGuard) -> Vec<mockito::Mock> {
    vec![
        server
            .mock("GET", "/api/articles/categories")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"categories": ["보건", "병원"]}"#)
            .create_async()
            .await,
        server
            .mock("GET", "/api/sources/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"sources": ["의학신문"]}"#)
            .create_async()
            .await,
        server
            .mock("GET", "/api/articles/stats")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"total_articles": 120, "today_articles": 7, "category_counts": {"보건": 80, "null": 40}}"#,
            )
            .create_async()
            .await,
    ]
}

fn service(server: &ServerGuard) -> ApiService {
    ApiService::with_base_url(format!("{}/api", server.url()))
}

#[tokio::test]
async fn test_load_list_collects_all_four_responses() {
    let mut server = Server::new_async().await;
    let _side = mock_side_endpoints(&mut server).await;
    let articles = server
        .mock("GET", "/api/articles/")
        .match_query(Matcher::Exact("page=1&per_page=12".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ARTICLES_PAGE)
        .create_async()
        .await;

    let mut controller = QueryController::new();
    let ticket = controller.mount();
    let snapshot = load_list(&service(&server), &ticket.query)
        .await
        .expect("all endpoints succeed");

    articles.assert_async().await;
    assert_eq!(snapshot.articles.len(), 1);
    assert_eq!(snapshot.articles[0].description, "");
    assert_eq!(snapshot.total_pages, 3);
    assert_eq!(snapshot.categories, vec!["보건", "병원"]);
    assert_eq!(snapshot.stats.category_total(), 2);

    assert_eq!(
        controller.apply_fetch(ticket.generation, Ok(snapshot)),
        FetchApplied::Applied
    );
    assert_eq!(controller.pagination().total_pages, 3);
}

#[tokio::test]
async fn test_second_page_sends_only_paging_params() {
    let mut server = Server::new_async().await;
    let _side = mock_side_endpoints(&mut server).await;
    let _first = server
        .mock("GET", "/api/articles/")
        .match_query(Matcher::Exact("page=1&per_page=12".to_string()))
        .with_status(200)
        .with_body(ARTICLES_PAGE)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/api/articles/")
        .match_query(Matcher::Exact("page=2&per_page=12".to_string()))
        .with_status(200)
        .with_body(r#"{"articles": [], "total_pages": 3}"#)
        .expect(1)
        .create_async()
        .await;

    let api = service(&server);
    let mut controller = QueryController::new();
    let ticket = controller.mount();
    let first = load_list(&api, &ticket.query).await;
    controller.apply_fetch(ticket.generation, first);

    let ticket = controller.set_page(2).expect("page 2 exists");
    let result = load_list(&api, &ticket.query).await;
    controller.apply_fetch(ticket.generation, result);

    second.assert_async().await;
    assert!(controller.articles().is_empty());
    assert!(controller.banner().is_none());
}

#[tokio::test]
async fn test_category_filter_is_sent_encoded() {
    let mut server = Server::new_async().await;
    let _side = mock_side_endpoints(&mut server).await;
    let filtered = server
        .mock("GET", "/api/articles/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".to_string(), "1".to_string()),
            Matcher::UrlEncoded("per_page".to_string(), "12".to_string()),
            Matcher::UrlEncoded("category".to_string(), "오피니언".to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"articles": [], "total_pages": 0}"#)
        .create_async()
        .await;

    let mut controller = QueryController::new();
    controller.mount();
    let ticket = controller
        .set_filter(FilterUpdate::Category(Some("오피니언".to_string())))
        .unwrap();
    let snapshot = load_list(&service(&server), &ticket.query).await.unwrap();

    filtered.assert_async().await;
    assert_eq!(snapshot.total_pages, 1);
}

#[tokio::test]
async fn test_one_failing_endpoint_fails_the_cycle() {
    let mut server = Server::new_async().await;
    let _articles = server
        .mock("GET", "/api/articles/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(ARTICLES_PAGE)
        .create_async()
        .await;
    let _categories = server
        .mock("GET", "/api/articles/categories")
        .with_status(200)
        .with_body(r#"{"categories": []}"#)
        .create_async()
        .await;
    let _sources = server
        .mock("GET", "/api/sources/")
        .with_status(200)
        .with_body(r#"{"sources": []}"#)
        .create_async()
        .await;
    let _stats = server
        .mock("GET", "/api/articles/stats")
        .with_status(500)
        .with_body(r#"{"error": "DB_UNAVAILABLE", "message": "database is locked"}"#)
        .create_async()
        .await;

    let mut controller = QueryController::new();
    let ticket = controller.mount();
    let result = load_list(&service(&server), &ticket.query).await;

    let err = result.clone().unwrap_err();
    assert_eq!(err.service().map(|s| s.error.as_str()), Some("DB_UNAVAILABLE"));

    assert_eq!(
        controller.apply_fetch(ticket.generation, result),
        FetchApplied::Failed
    );
    assert!(controller.banner().unwrap().contains("database is locked"));
}

#[tokio::test]
async fn test_collection_success_triggers_second_list_fetch() {
    let mut server = Server::new_async().await;
    let _side = mock_side_endpoints(&mut server).await;
    let articles = server
        .mock("GET", "/api/articles/")
        .match_query(Matcher::Exact("page=1&per_page=12".to_string()))
        .with_status(200)
        .with_body(ARTICLES_PAGE)
        .expect(2)
        .create_async()
        .await;
    let collect = server
        .mock("POST", "/api/scheduler/collect")
        .with_status(200)
        .with_body(r#"{"collected": 15, "saved": 9}"#)
        .create_async()
        .await;

    let api = service(&server);
    let mut controller = QueryController::new();
    let ticket = controller.mount();
    let result = load_list(&api, &ticket.query).await;
    controller.apply_fetch(ticket.generation, result);

    controller.request_collection(CollectionKind::Immediate);
    let outcome = api
        .trigger_collection()
        .await
        .map(CollectionOutcome::Immediate);
    let (resolution, ticket) = controller.complete_collection(CollectionKind::Immediate, outcome);

    let ticket = ticket.expect("success refreshes the list");
    let result = load_list(&api, &ticket.query).await;
    controller.apply_fetch(ticket.generation, result);

    collect.assert_async().await;
    articles.assert_async().await;
    assert!(resolution.notification.message.contains("Collected: 15"));
}

#[tokio::test]
async fn test_rate_limited_collection_does_not_refresh() {
    let mut server = Server::new_async().await;
    let collect = server
        .mock("POST", "/api/scheduler/collect")
        .with_status(200)
        .with_body(r#"{"error": "RATE_LIMITED", "message": "retry after 60s"}"#)
        .create_async()
        .await;

    let api = service(&server);
    let mut controller = QueryController::new();
    controller.mount();
    let generation = controller.generation();

    controller.request_collection(CollectionKind::Immediate);
    let outcome = api
        .trigger_collection()
        .await
        .map(CollectionOutcome::Immediate);
    let (resolution, ticket) = controller.complete_collection(CollectionKind::Immediate, outcome);

    collect.assert_async().await;
    assert!(ticket.is_none());
    assert_eq!(controller.generation(), generation);
    assert!(resolution.notification.message.contains("RATE_LIMITED"));
    assert!(resolution.notification.message.contains("retry after 60s"));
}

#[tokio::test]
async fn test_missing_article_is_not_found() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/api/articles/999")
        .with_status(404)
        .with_body(r#"{"error": "Article not found"}"#)
        .create_async()
        .await;

    let err = service(&server).get_article(999).await.unwrap_err();
    assert_eq!(err, ApiError::NotFound(999));
}
