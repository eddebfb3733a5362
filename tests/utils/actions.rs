use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

use super::setup::TestClient;

/// Status and decoded JSON body of one response
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    pub fn error_fields(&self) -> Vec<(String, String)> {
        self.body["errors"]
            .as_array()
            .map(|errors| {
                errors
                    .iter()
                    .map(|e| {
                        (
                            e["field"].as_str().unwrap_or_default().to_string(),
                            e["message"].as_str().unwrap_or_default().to_string(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn username(&self) -> Option<&str> {
        self.body["user"]["username"].as_str()
    }
}

impl TestClient {
    pub async fn register(&mut self, username: &str, password: &str) -> Reply {
        self.post_credentials("/register", username, password).await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Reply {
        self.post_credentials("/login", username, password).await
    }

    pub async fn me(&mut self) -> Reply {
        let request = self.request("GET", "/me").body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn logout(&mut self) -> Reply {
        let request = self.request("POST", "/logout").body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn post_credentials(&mut self, uri: &str, username: &str, password: &str) -> Reply {
        let body = serde_json::json!({ "username": username, "password": password });
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie.as_str()),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(request).await.unwrap();
        self.store_cookie(&response);

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply { status, body }
    }

    fn store_cookie(&mut self, response: &Response) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let value = value.to_str().unwrap();
            let pair = value.split(';').next().unwrap_or_default();
            if value.contains("Max-Age=0") {
                self.cookie = None;
            } else {
                self.cookie = Some(pair.to_string());
            }
        }
    }
}
