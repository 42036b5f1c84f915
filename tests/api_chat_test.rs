//! Integration tests for the chat API endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::util::ServiceExt;

    use crate::test_utils::{TestApp, body_to_json, completion_path, gemini_body, test_app};

    fn json_request(method: &str, uri: &str, cookie: &str, body: Value) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method(method)
            .header("content-type", "application/json")
            .header("cookie", cookie)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str, cookie: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("cookie", cookie)
            .body(Body::empty())
            .unwrap()
    }

    async fn create_chat(app: &TestApp, cookie: &str, prompt: &str) -> String {
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                cookie,
                json!({ "prompt": prompt }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        body["data"]["_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn it_returns_the_api_version() {
        let app = test_app("http://127.0.0.1:1").await;
        let response = app
            .router
            .oneshot(Request::builder().uri("/api/chat").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = crate::test_utils::body_to_string(response.into_body()).await;
        assert_eq!(body, "Chat API v1");
    }

    #[tokio::test]
    async fn it_creates_a_chat_from_the_first_prompt() {
        let mut upstream = mockito::Server::new_async().await;
        let mock = upstream
            .mock("POST", completion_path().as_str())
            .match_body(mockito::Matcher::PartialJson(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Hello" }] }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(gemini_body("Hi there"))
            .create_async()
            .await;

        let app = test_app(&upstream.url()).await;
        let cookie = app.login("ada@example.com").await;

        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                &cookie,
                json!({ "prompt": "Hello" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["status"], 200);
        assert_eq!(body["data"]["content"], "Hi there");
        let chat_id = body["data"]["_id"].as_str().unwrap();
        assert_eq!(chat_id.len(), 24);
        assert!(chat_id.chars().all(|c| c.is_ascii_hexdigit()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn it_appends_to_an_existing_chat() {
        let mut upstream = mockito::Server::new_async().await;
        let _mock = upstream
            .mock("POST", completion_path().as_str())
            .with_status(200)
            .with_body(gemini_body("Sure"))
            .expect(2)
            .create_async()
            .await;

        let app = test_app(&upstream.url()).await;
        let cookie = app.login("ada@example.com").await;
        let chat_id = create_chat(&app, &cookie, "First").await;

        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/chat",
                &cookie,
                json!({ "prompt": "Second", "chatId": chat_id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["data"]["content"], "Sure");

        let response = app
            .router
            .clone()
            .oneshot(get_request(
                &format!("/api/chat/saved?chatId={}", chat_id),
                &cookie,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        let prompts: Vec<_> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["prompt"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(prompts, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn it_lists_history_titled_by_first_prompt() {
        let mut upstream = mockito::Server::new_async().await;
        let _mock = upstream
            .mock("POST", completion_path().as_str())
            .with_status(200)
            .with_body(gemini_body("Answer"))
            .create_async()
            .await;

        let app = test_app(&upstream.url()).await;
        let cookie = app.login("ada@example.com").await;
        let first = create_chat(&app, &cookie, "Older").await;
        let second = create_chat(&app, &cookie, "Newer").await;

        // Someone else's chats never show up
        let other = app.login("bob@example.com").await;
        create_chat(&app, &other, "Private").await;

        let response = app
            .router
            .clone()
            .oneshot(get_request("/api/chat/history", &cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        let history = body["data"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["chatId"], second.as_str());
        assert_eq!(history[0]["prompt"], "Newer");
        assert_eq!(history[1]["chatId"], first.as_str());
    }

    #[tokio::test]
    async fn it_rejects_requests_without_a_session() {
        let app = test_app("http://127.0.0.1:1").await;
        let response = app
            .router
            .oneshot(
                Request::builder()
                    .uri("/api/chat")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({ "prompt": "Hello" }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["message"], "Not Logged In");
    }

    #[tokio::test]
    async fn it_rejects_unknown_tokens() {
        let app = test_app("http://127.0.0.1:1").await;
        let response = app
            .router
            .oneshot(get_request("/api/chat/history", "userToken=nope"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["message"], "Invalid Token");
    }

    #[tokio::test]
    async fn it_rejects_empty_prompts() {
        let app = test_app("http://127.0.0.1:1").await;
        let cookie = app.login("ada@example.com").await;
        let response = app
            .router
            .oneshot(json_request(
                "POST",
                "/api/chat",
                &cookie,
                json!({ "prompt": "  " }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn it_returns_404_for_chats_of_other_users() {
        let mut upstream = mockito::Server::new_async().await;
        let mock = upstream
            .mock("POST", completion_path().as_str())
            .with_status(200)
            .with_body(gemini_body("Answer"))
            .expect(1)
            .create_async()
            .await;

        let app = test_app(&upstream.url()).await;
        let owner = app.login("ada@example.com").await;
        let chat_id = create_chat(&app, &owner, "Mine").await;
        let other = app.login("bob@example.com").await;

        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/chat",
                &other,
                json!({ "prompt": "Hi", "chatId": chat_id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .router
            .clone()
            .oneshot(get_request(
                &format!("/api/chat/saved?chatId={}", chat_id),
                &other,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // The update never reached the upstream
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn it_returns_502_when_the_model_returns_no_text() {
        let mut upstream = mockito::Server::new_async().await;
        let _mock = upstream
            .mock("POST", completion_path().as_str())
            .with_status(200)
            .with_body(r#"{"candidates": [{"content": {"parts": []}}]}"#)
            .create_async()
            .await;

        let app = test_app(&upstream.url()).await;
        let cookie = app.login("ada@example.com").await;
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/chat",
                &cookie,
                json!({ "prompt": "Hello" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["reason"], "empty");

        // Nothing is stored for a failed exchange
        let response = app
            .router
            .oneshot(get_request("/api/chat/history", &cookie))
            .await
            .unwrap();
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn it_deletes_all_chats() {
        let mut upstream = mockito::Server::new_async().await;
        let _mock = upstream
            .mock("POST", completion_path().as_str())
            .with_status(200)
            .with_body(gemini_body("Answer"))
            .create_async()
            .await;

        let app = test_app(&upstream.url()).await;
        let cookie = app.login("ada@example.com").await;
        create_chat(&app, &cookie, "One").await;

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/chat/all")
                    .method("DELETE")
                    .header("cookie", &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .router
            .oneshot(get_request("/api/chat/history", &cookie))
            .await
            .unwrap();
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["data"], json!([]));
    }
}
