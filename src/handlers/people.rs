// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde_json::json;

use super::WorkspaceClient;
use crate::catalog::request::TokenArgs;
use crate::core::models::{HandlerResult, ToolContent};

pub async fn list_contacts(client: &WorkspaceClient, args: TokenArgs) -> HandlerResult {
    let url = format!("{}/people/me/connections", client.endpoints().people_base_url);
    let request = client
        .http()
        .get(url)
        .bearer_auth(&args.access_token)
        .query(&[("personFields", "names,emailAddresses")]);
    let data = client.fetch_json("list contacts", request).await?;
    let contacts = data.get("connections").cloned().unwrap_or_else(|| json!([]));
    Ok(vec![ToolContent::json(&contacts)])
}

pub async fn get_user_info(client: &WorkspaceClient, args: TokenArgs) -> HandlerResult {
    let request = client
        .http()
        .get(&client.endpoints().userinfo_url)
        .bearer_auth(&args.access_token);
    let info = client.fetch_json("get user info", request).await?;
    Ok(vec![ToolContent::json(&info)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{client_for, text_of};
    use mockito::Matcher;

    fn token() -> TokenArgs {
        TokenArgs {
            access_token: "X".to_string(),
        }
    }

    #[tokio::test]
    async fn test_get_user_info_forwards_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/oauth2/v2/userinfo")
            .match_header("authorization", "Bearer X")
            .with_status(200)
            .with_body(json!({"email": "me@example.com"}).to_string())
            .create_async()
            .await;

        let client = client_for(&server);
        let text = text_of(get_user_info(&client, token()).await);
        assert!(text.contains("me@example.com"));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_contacts_defaults_to_empty() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/people/me/connections")
            .match_query(Matcher::UrlEncoded(
                "personFields".into(),
                "names,emailAddresses".into(),
            ))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(text_of(list_contacts(&client, token()).await), "[]");
    }

    #[tokio::test]
    async fn test_user_info_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/oauth2/v2/userinfo")
            .with_status(401)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = get_user_info(&client, token()).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to get user info: 401 Unauthorized");
    }
}
