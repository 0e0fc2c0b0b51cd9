//! services/api/src/adapters/firestore.rs
//!
//! This module contains the document store adapter, which is the concrete
//! implementation of the `PersistenceService` port from the `core` crate. It
//! talks to the Firestore REST API: structured queries for the social
//! collections, and a single per-user document for the onboarding record.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use movie_diary_core::domain::{Activity, OnboardingRecord, ReviewRecord, TrendingEntry};
use movie_diary_core::ports::{PersistenceService, PortError, PortResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::check_status;

const REVIEWS: &str = "reviews";
const ACTIVITIES: &str = "activities";
const TRENDING: &str = "trending";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A document store adapter that implements the `PersistenceService` port.
#[derive(Clone)]
pub struct FirestoreAdapter {
    client: reqwest::Client,
    /// `{base}/projects/{project}/databases/(default)/documents`
    documents_url: String,
    auth_token: Option<String>,
}

impl FirestoreAdapter {
    /// Creates a new `FirestoreAdapter`.
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        project_id: &str,
        auth_token: Option<String>,
    ) -> Self {
        Self {
            client,
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                base_url.trim_end_matches('/'),
                project_id
            ),
            auth_token,
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn onboarding_url(&self, user_id: &str) -> PortResult<String> {
        if user_id.is_empty() || user_id.contains('/') {
            return Err(PortError::Unexpected(format!("Invalid user id '{}'", user_id)));
        }
        Ok(format!("{}/users/{}/settings/onboarding", self.documents_url, user_id))
    }

    /// Runs a newest-first query over `collection` ordered by `order_by`.
    async fn run_query<T: DeserializeOwned>(
        &self,
        collection: &str,
        order_by: &str,
        limit: usize,
    ) -> PortResult<Vec<T>> {
        debug!("Firestore query {} by {} (limit {})", collection, order_by, limit);
        let response = self
            .authorized(
                self.client
                    .post(format!("{}:runQuery", self.documents_url))
                    .json(&structured_query(collection, order_by, limit)),
            )
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let rows = check_status(response, &format!("Firestore query on {}", collection))?
            .json::<Vec<QueryRow>>()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(decode_rows(collection, rows))
    }
}

//=========================================================================================
// Firestore Wire Shapes
//=========================================================================================

#[derive(Deserialize)]
struct QueryRow {
    document: Option<Document>,
}

#[derive(Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl Document {
    /// Plain JSON object of the document's fields, with `id` taken from the
    /// document name when the fields do not carry one.
    fn into_json(self) -> Value {
        let mut object = decode_fields(&self.fields);
        if !object.contains_key("id") {
            let id = self.name.rsplit('/').next().unwrap_or_default().to_string();
            object.insert("id".to_string(), Value::String(id));
        }
        Value::Object(object)
    }
}

/// "Impure" onboarding document, as stored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OnboardingDoc {
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    skipped: bool,
    completed_at: Option<DateTime<Utc>>,
}

impl OnboardingDoc {
    fn to_domain(self) -> OnboardingRecord {
        OnboardingRecord {
            completed: self.completed,
            skipped: self.skipped,
            completed_at: self.completed_at.unwrap_or_default(),
        }
    }
}

fn structured_query(collection: &str, order_by: &str, limit: usize) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "orderBy": [{
                "field": { "fieldPath": order_by },
                "direction": "DESCENDING",
            }],
            "limit": limit,
        }
    })
}

/// Decodes query rows, dropping (and logging) documents that do not fit `T`.
fn decode_rows<T: DeserializeOwned>(collection: &str, rows: Vec<QueryRow>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| row.document)
        .filter_map(|document| {
            let name = document.name.clone();
            match serde_json::from_value::<T>(document.into_json()) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Skipping malformed {} document {}: {}", collection, name, e);
                    None
                }
            }
        })
        .collect()
}

fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

/// Converts one typed Firestore value (`{"integerValue": "3"}`, ...) to plain JSON.
fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Value::Null;
    };
    match kind.as_str() {
        "integerValue" => match inner {
            Value::String(raw) => raw.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            other => other.clone(),
        },
        "mapValue" => match inner.get("fields").and_then(Value::as_object) {
            Some(fields) => Value::Object(decode_fields(fields)),
            None => Value::Object(Map::new()),
        },
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "nullValue" => Value::Null,
        // stringValue, doubleValue, booleanValue, timestampValue, referenceValue, ...
        _ => inner.clone(),
    }
}

fn encode_onboarding(record: &OnboardingRecord) -> Value {
    json!({
        "fields": {
            "completed": { "booleanValue": record.completed },
            "skipped": { "booleanValue": record.skipped },
            "completedAt": {
                "timestampValue": record.completed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        }
    })
}

//=========================================================================================
// `PersistenceService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PersistenceService for FirestoreAdapter {
    async fn get_global_recent_reviews(&self, limit: usize) -> PortResult<Vec<ReviewRecord>> {
        self.run_query(REVIEWS, "createdAt", limit).await
    }

    async fn get_recent_activities(&self, limit: usize) -> PortResult<Vec<Activity>> {
        self.run_query(ACTIVITIES, "createdAt", limit).await
    }

    async fn get_unified_trending(&self, limit: usize) -> PortResult<Vec<TrendingEntry>> {
        self.run_query(TRENDING, "trendingScore", limit).await
    }

    async fn read_onboarding_record(&self, user_id: &str) -> PortResult<Option<OnboardingRecord>> {
        let url = self.onboarding_url(user_id)?;
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let document = match check_status(response, "Onboarding record") {
            Ok(response) => response
                .json::<Document>()
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?,
            Err(PortError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let record = serde_json::from_value::<OnboardingDoc>(document.into_json())
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Some(record.to_domain()))
    }

    async fn write_onboarding_record(
        &self,
        user_id: &str,
        record: &OnboardingRecord,
    ) -> PortResult<()> {
        let url = self.onboarding_url(user_id)?;
        let response = self
            .authorized(self.client.patch(url).json(&encode_onboarding(record)))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        check_status(response, "Onboarding record")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use movie_diary_core::domain::{ActivityType, MediaType};

    #[test]
    fn typed_values_decode_to_plain_json() {
        let fields = json!({
            "movieId": { "integerValue": "550" },
            "rating": { "doubleValue": 4.5 },
            "spoiler": { "booleanValue": false },
            "tags": { "arrayValue": { "values": [{ "stringValue": "noir" }] } },
            "author": { "mapValue": { "fields": { "name": { "stringValue": "minji" } } } },
            "deletedAt": { "nullValue": null },
            "createdAt": { "timestampValue": "2024-05-17T03:00:00Z" },
        });
        let decoded = decode_fields(fields.as_object().unwrap());
        assert_eq!(
            Value::Object(decoded),
            json!({
                "movieId": 550,
                "rating": 4.5,
                "spoiler": false,
                "tags": ["noir"],
                "author": { "name": "minji" },
                "deletedAt": null,
                "createdAt": "2024-05-17T03:00:00Z",
            })
        );
    }

    #[test]
    fn query_rows_become_records_with_document_ids() {
        let rows: Vec<QueryRow> = serde_json::from_value(json!([
            {
                "document": {
                    "name": "projects/p/databases/(default)/documents/reviews/r1",
                    "fields": {
                        "movieId": { "integerValue": "1399" },
                        "mediaType": { "stringValue": "tv" },
                        "content": { "stringValue": "Winter is coming." },
                        "userName": { "stringValue": "jisoo" },
                        "createdAt": { "timestampValue": "2024-05-17T03:00:00Z" },
                    }
                },
                "readTime": "2024-05-18T00:00:00Z"
            },
            {
                "document": {
                    "name": "projects/p/databases/(default)/documents/reviews/broken",
                    "fields": { "content": { "stringValue": "no movie id" } }
                }
            },
            { "readTime": "2024-05-18T00:00:00Z" }
        ]))
        .unwrap();

        let reviews: Vec<ReviewRecord> = decode_rows(REVIEWS, rows);
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].id, "r1");
        assert_eq!(reviews[0].movie_id, 1399);
        assert_eq!(reviews[0].media_type, MediaType::Tv);
        assert_eq!(reviews[0].movie_title, None);
    }

    #[test]
    fn activity_documents_decode_into_tagged_payloads() {
        let rows: Vec<QueryRow> = serde_json::from_value(json!([{
            "document": {
                "name": "projects/p/databases/(default)/documents/activities/a9",
                "fields": {
                    "type": { "stringValue": "connection" },
                    "userId": { "stringValue": "u1" },
                    "userName": { "stringValue": "minji" },
                    "targetUserId": { "stringValue": "u2" },
                    "targetUserName": { "stringValue": "jisoo" },
                    "createdAt": { "timestampValue": "2024-05-17T03:00:00Z" },
                }
            }
        }]))
        .unwrap();
        let activities: Vec<Activity> = decode_rows(ACTIVITIES, rows);
        assert_eq!(activities[0].id, "a9");
        assert_eq!(activities[0].kind(), ActivityType::Connection);
        assert_eq!(activities[0].summary(), "minji followed jisoo");
    }

    #[test]
    fn onboarding_record_encodes_typed_fields() {
        let at = DateTime::parse_from_rfc3339("2024-05-17T03:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let body = encode_onboarding(&OnboardingRecord::skipped(at));
        assert_eq!(body["fields"]["completed"]["booleanValue"], true);
        assert_eq!(body["fields"]["skipped"]["booleanValue"], true);
        assert_eq!(
            body["fields"]["completedAt"]["timestampValue"],
            "2024-05-17T03:00:00.000Z"
        );
    }

    #[test]
    fn onboarding_url_rejects_path_segments() {
        let adapter = FirestoreAdapter::new(reqwest::Client::new(), "https://fs.example/v1/", "diary", None);
        assert_eq!(
            adapter.onboarding_url("abc").unwrap(),
            "https://fs.example/v1/projects/diary/databases/(default)/documents/users/abc/settings/onboarding"
        );
        assert!(adapter.onboarding_url("a/b").is_err());
    }
}
