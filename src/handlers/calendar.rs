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

//! Calendar handlers, all against the user's `primary` calendar.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use reqwest::Url;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::{endpoint_url, WorkspaceClient};
use crate::catalog::request::{CreateEventArgs, DeleteEventArgs, ListEventsArgs, UpdateEventArgs};
use crate::core::constants::google;
use crate::core::errors::HandlerError;
use crate::core::models::{HandlerResult, ToolContent};

fn events_url(client: &WorkspaceClient) -> String {
    format!("{}/calendars/primary/events", client.endpoints().calendar_base_url)
}

fn event_url(
    client: &WorkspaceClient,
    action: &'static str,
    event_id: &str,
) -> Result<Url, HandlerError> {
    endpoint_url(
        action,
        &client.endpoints().calendar_base_url,
        &["calendars", "primary", "events", event_id],
    )
}

pub async fn list_events(client: &WorkspaceClient, args: ListEventsArgs) -> HandlerResult {
    let params = list_window(&args, Utc::now())?;
    let request = client
        .http()
        .get(events_url(client))
        .bearer_auth(&args.access_token)
        .query(&params);
    let listing = client.fetch_json("list events", request).await?;
    let items = listing.get("items").cloned().unwrap_or_else(|| json!([]));
    Ok(vec![ToolContent::json(&items)])
}

pub async fn create_event(client: &WorkspaceClient, args: CreateEventArgs) -> HandlerResult {
    let with_meet = args.include_google_meet_details.unwrap_or(false);
    let mut body = Map::new();
    body.insert("summary".to_string(), json!(args.summary));
    insert_opt(&mut body, "location", args.location);
    insert_opt(&mut body, "description", args.description);
    body.insert("start".to_string(), json!({ "dateTime": args.start }));
    body.insert("end".to_string(), json!({ "dateTime": args.end }));
    if let Some(attendees) = args.attendees {
        body.insert("attendees".to_string(), attendee_list(attendees));
    }
    if with_meet {
        body.insert("conferenceData".to_string(), meet_request());
    }

    let mut request = client
        .http()
        .post(events_url(client))
        .bearer_auth(&args.access_token)
        .json(&Value::Object(body));
    if with_meet {
        request = request.query(&[("conferenceDataVersion", "1")]);
    }
    let created = client.fetch_json("create event", request).await?;
    Ok(vec![ToolContent::json(&created)])
}

/// Patch only the fields the caller supplied.
pub async fn update_event(client: &WorkspaceClient, args: UpdateEventArgs) -> HandlerResult {
    let with_meet = args.include_google_meet_details.unwrap_or(false);
    let mut body = Map::new();
    insert_opt(&mut body, "summary", args.summary);
    insert_opt(&mut body, "location", args.location);
    insert_opt(&mut body, "description", args.description);
    if let Some(start) = args.start {
        body.insert("start".to_string(), json!({ "dateTime": start }));
    }
    if let Some(end) = args.end {
        body.insert("end".to_string(), json!({ "dateTime": end }));
    }
    if let Some(attendees) = args.attendees {
        body.insert("attendees".to_string(), attendee_list(attendees));
    }
    if with_meet {
        body.insert("conferenceData".to_string(), meet_request());
    }

    let url = event_url(client, "update event", &args.event_id)?;
    let mut request = client
        .http()
        .patch(url)
        .bearer_auth(&args.access_token)
        .json(&Value::Object(body));
    if with_meet {
        request = request.query(&[("conferenceDataVersion", "1")]);
    }
    let updated = client.fetch_json("update event", request).await?;
    Ok(vec![ToolContent::json(&updated)])
}

pub async fn delete_event(client: &WorkspaceClient, args: DeleteEventArgs) -> HandlerResult {
    let url = event_url(client, "delete event", &args.event_id)?;
    let request = client.http().delete(url).bearer_auth(&args.access_token);
    client.fetch_json("delete event", request).await?;
    Ok(vec![ToolContent::text(format!(
        "Event {} deleted successfully",
        args.event_id
    ))])
}

/// Offset `now` by whole days, failing instead of overflowing.
fn shift_days(now: DateTime<Utc>, days: i64, field: &str) -> Result<DateTime<Utc>, HandlerError> {
    let out_of_range = || HandlerError::InvalidArguments(format!("{} is out of range: {}", field, days));
    let delta = TimeDelta::try_days(days.abs()).ok_or_else(out_of_range)?;
    let shifted = if days < 0 {
        now.checked_sub_signed(delta)
    } else {
        now.checked_add_signed(delta)
    };
    shifted.ok_or_else(out_of_range)
}

fn list_window(
    args: &ListEventsArgs,
    now: DateTime<Utc>,
) -> Result<Vec<(&'static str, String)>, HandlerError> {
    let days_back = args.days_back.unwrap_or(0).max(0);
    let time_min = shift_days(now, -days_back, "daysBack")?;
    let mut params = vec![
        ("timeMin", time_min.to_rfc3339_opts(SecondsFormat::Secs, true)),
        (
            "maxResults",
            args.max_results.unwrap_or(google::DEFAULT_MAX_RESULTS).to_string(),
        ),
        ("singleEvents", "true".to_string()),
        ("orderBy", "startTime".to_string()),
    ];
    if let Some(days) = args.days_forward {
        let time_max = shift_days(now, days.max(0), "daysForward")?;
        params.push(("timeMax", time_max.to_rfc3339_opts(SecondsFormat::Secs, true)));
    }
    Ok(params)
}

fn insert_opt(body: &mut Map<String, Value>, key: &str, value: Option<String>) {
    if let Some(v) = value {
        body.insert(key.to_string(), Value::String(v));
    }
}

fn attendee_list(emails: Vec<String>) -> Value {
    Value::Array(emails.into_iter().map(|email| json!({ "email": email })).collect())
}

fn meet_request() -> Value {
    json!({
        "createRequest": {
            "requestId": Uuid::new_v4().to_string(),
            "conferenceSolutionKey": { "type": "hangoutsMeet" }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{client_for, text_of};
    use chrono::TimeZone;
    use mockito::Matcher;

    #[test]
    fn test_list_window_bounds() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let args = ListEventsArgs {
            access_token: "t".to_string(),
            max_results: Some(5),
            days_back: Some(2),
            days_forward: Some(7),
        };
        let params = list_window(&args, now).unwrap();
        assert!(params.contains(&("timeMin", "2026-03-08T12:00:00Z".to_string())));
        assert!(params.contains(&("timeMax", "2026-03-17T12:00:00Z".to_string())));
        assert!(params.contains(&("maxResults", "5".to_string())));
    }

    #[test]
    fn test_list_window_without_forward_has_no_max() {
        let args = ListEventsArgs {
            access_token: "t".to_string(),
            max_results: None,
            days_back: None,
            days_forward: None,
        };
        let params = list_window(&args, Utc::now()).unwrap();
        assert!(params.iter().all(|(k, _)| *k != "timeMax"));
    }

    #[test]
    fn test_list_window_rejects_overflowing_days() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        for (back, forward) in [(Some(i64::MAX), None), (None, Some(i64::MAX)), (Some(400_000_000), None)] {
            let args = ListEventsArgs {
                access_token: "t".to_string(),
                max_results: None,
                days_back: back,
                days_forward: forward,
            };
            let err = list_window(&args, now).unwrap_err();
            assert!(matches!(err, HandlerError::InvalidArguments(_)), "{:?}", err);
        }
    }

    #[tokio::test]
    async fn test_list_events_with_huge_window_is_a_tool_failure() {
        let server = mockito::Server::new_async().await;
        let client = client_for(&server);
        let args = ListEventsArgs {
            access_token: "t".to_string(),
            max_results: None,
            days_back: Some(i64::MAX),
            days_forward: None,
        };
        let err = list_events(&client, args).await.unwrap_err();
        assert!(err.to_string().contains("daysBack"));
    }

    #[tokio::test]
    async fn test_delete_event_escapes_event_id() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("DELETE", "/calendar/v3/calendars/primary/events/a%2Fb")
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server);
        let args = DeleteEventArgs {
            access_token: "tok".to_string(),
            event_id: "a/b".to_string(),
        };
        assert_eq!(text_of(delete_event(&client, args).await), "Event a/b deleted successfully");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_event_rejects_dot_segment_id() {
        let server = mockito::Server::new_async().await;
        let client = client_for(&server);
        let args = UpdateEventArgs {
            access_token: "tok".to_string(),
            event_id: "..".to_string(),
            summary: Some("x".to_string()),
            location: None,
            description: None,
            start: None,
            end: None,
            attendees: None,
            include_google_meet_details: None,
        };
        let err = update_event(&client, args).await.unwrap_err();
        assert!(matches!(err, HandlerError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_create_event_with_meet() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/calendar/v3/calendars/primary/events")
            .match_query(Matcher::UrlEncoded("conferenceDataVersion".into(), "1".into()))
            .match_body(Matcher::PartialJson(json!({
                "summary": "Standup",
                "attendees": [{"email": "a@example.com"}],
                "conferenceData": {"createRequest": {"conferenceSolutionKey": {"type": "hangoutsMeet"}}}
            })))
            .with_status(200)
            .with_body(json!({"id": "e1", "hangoutLink": "https://meet.google.com/x"}).to_string())
            .create_async()
            .await;

        let client = client_for(&server);
        let args = CreateEventArgs {
            access_token: "tok".to_string(),
            summary: "Standup".to_string(),
            location: None,
            description: None,
            start: "2026-03-10T09:00:00Z".to_string(),
            end: "2026-03-10T09:15:00Z".to_string(),
            attendees: Some(vec!["a@example.com".to_string()]),
            include_google_meet_details: Some(true),
        };
        let text = text_of(create_event(&client, args).await);
        assert!(text.contains("hangoutLink"));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_event_accepts_empty_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("DELETE", "/calendar/v3/calendars/primary/events/e1")
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server);
        let args = DeleteEventArgs {
            access_token: "tok".to_string(),
            event_id: "e1".to_string(),
        };
        assert_eq!(text_of(delete_event(&client, args).await), "Event e1 deleted successfully");
    }

    #[tokio::test]
    async fn test_update_event_patches_given_fields() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("PATCH", "/calendar/v3/calendars/primary/events/e2")
            .match_body(Matcher::Json(json!({"summary": "Renamed"})))
            .with_status(200)
            .with_body(json!({"id": "e2", "summary": "Renamed"}).to_string())
            .create_async()
            .await;

        let client = client_for(&server);
        let args = UpdateEventArgs {
            access_token: "tok".to_string(),
            event_id: "e2".to_string(),
            summary: Some("Renamed".to_string()),
            location: None,
            description: None,
            start: None,
            end: None,
            attendees: None,
            include_google_meet_details: None,
        };
        assert!(text_of(update_event(&client, args).await).contains("Renamed"));
        m.assert_async().await;
    }
}
