use crate::config::ApiCredentials;
use crate::confluence::{DocumentStore, Page};
use crate::http::ApiClient;
use crate::model::{Error, Result};
use serde_json::{json, Value};

const CONFLICT: u16 = 409;

#[derive(Debug, Clone)]
pub struct ConfluenceClient {
    api: ApiClient,
}

impl ConfluenceClient {
    pub fn new(credentials: ApiCredentials) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(credentials)?,
        })
    }

    async fn fetch(&self, page_id: &str, expand: &str) -> Result<Value> {
        self.api
            .get_json(
                &format!("/rest/api/content/{page_id}"),
                &[("expand", expand.to_string())],
            )
            .await
    }
}

impl DocumentStore for ConfluenceClient {
    async fn read_body(&self, page_id: &str) -> Result<String> {
        let response = self.fetch(page_id, "body.storage").await?;
        storage_value(&response)
    }

    async fn read_body_and_version(&self, page_id: &str) -> Result<Page> {
        let response = self.fetch(page_id, "body.storage,version").await?;
        let Some(version) = response["version"]["number"].as_u64() else {
            return Err(Error::UnexpectedResponse(
                "Not found 'version.number' field".into(),
            ));
        };
        Ok(Page {
            id: page_id.to_string(),
            title: response["title"].as_str().unwrap_or_default().to_string(),
            version,
            body: storage_value(&response)?,
        })
    }

    async fn write(
        &self,
        page_id: &str,
        title: &str,
        body: &str,
        expected_version: u64,
    ) -> Result<()> {
        let request = json!({
            "id": page_id,
            "type": "page",
            "title": title,
            "version": { "number": expected_version + 1 },
            "body": {
                "storage": {
                    "value": body,
                    "representation": "storage"
                }
            }
        });
        match self
            .api
            .put_json(&format!("/rest/api/content/{page_id}"), &request)
            .await
        {
            Ok(_) => Ok(()),
            Err(Error::Transport { status: CONFLICT, .. }) => Err(Error::VersionConflict {
                page_id: page_id.to_string(),
                expected: expected_version,
            }),
            Err(error) => Err(error),
        }
    }
}

fn storage_value(response: &Value) -> Result<String> {
    response["body"]["storage"]["value"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| Error::UnexpectedResponse("Not found 'body.storage.value' field".into()))
}
