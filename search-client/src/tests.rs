use crate::api::{SearchClient, SearchResponse};
use crate::auth::{AppCredentials, TokenStore};
use hashfeed_core::{CoreError, Post, SearchApiError};

fn client_with_token() -> SearchClient {
    let store = TokenStore::new();
    store.save("test-token".to_string());
    SearchClient::new(store, 15)
}

#[test]
fn test_query_params_with_both_bounds() {
    let client = client_with_token();
    let params = client.build_query("golang", Some(100), Some(89));
    assert_eq!(
        params,
        vec![
            ("q".to_string(), "#golang".to_string()),
            ("count".to_string(), "15".to_string()),
            ("since_id".to_string(), "100".to_string()),
            ("max_id".to_string(), "89".to_string()),
        ]
    );
}

#[test]
fn test_query_params_skip_absent_and_zero_bounds() {
    let client = client_with_token();
    let params = client.build_query("rustlang", Some(0), None);
    assert_eq!(
        params,
        vec![
            ("q".to_string(), "#rustlang".to_string()),
            ("count".to_string(), "15".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_empty_query_rejected_before_network() {
    let client = client_with_token();
    let err = client.fetch("   ", None, None).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput { .. }));
}

#[tokio::test]
async fn test_missing_token_fails_fast() {
    let client = SearchClient::new(TokenStore::new(), 15);
    let err = client.fetch("golang", None, None).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::SearchApi(SearchApiError::MissingToken)
    ));
}

#[test]
fn test_parse_search_response() {
    let raw = r#"{
        "statuses": [
            {
                "id": 100,
                "created_at": "Mon Sep 24 03:35:21 +0000 2012",
                "text": "learning #golang",
                "retweet_count": 3,
                "favorite_count": "12",
                "user": {
                    "name": "Ada Lovelace",
                    "screen_name": "ada",
                    "profile_image_url_https": "https://example.com/ada.png"
                }
            },
            {
                "id": 90,
                "text": "no user block here"
            }
        ]
    }"#;

    let page: SearchResponse = serde_json::from_str(raw).unwrap();
    let posts: Vec<Post> = page.statuses.into_iter().map(Post::from).collect();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, 100);
    assert_eq!(posts[0].author_name, "Ada Lovelace");
    assert_eq!(posts[0].display_handle(), "@ada");
    assert_eq!(posts[0].retweet_count, "3");
    assert_eq!(posts[0].favorite_count, "12");
    assert_eq!(posts[1].id, 90);
    assert_eq!(posts[1].author_name, "");
    assert_eq!(posts[1].image_url, "");
}

#[test]
fn test_parse_empty_statuses() {
    let page: SearchResponse = serde_json::from_str(r#"{"statuses": []}"#).unwrap();
    assert!(page.statuses.is_empty());
}

#[test]
fn test_basic_token_encoding() {
    let credentials = AppCredentials {
        consumer_key: "abc".to_string(),
        consumer_secret: "s e".to_string(),
    };
    // urlencode("abc") + ":" + urlencode("s e") = "abc:s+e"
    assert_eq!(credentials.basic_token(), "YWJjOnMrZQ==");
}

#[test]
fn test_token_store_round_trip() {
    let store = TokenStore::new();
    assert!(store.get().is_none());

    store.save("bearer-123".to_string());
    assert_eq!(store.get().as_deref(), Some("bearer-123"));

    store.clear();
    assert!(store.get().is_none());
}

#[test]
fn test_token_store_ignores_blank_token() {
    let store = TokenStore::new();
    store.save("   ".to_string());
    assert!(store.get().is_none());
}
