use reqwest::{Client, Url};

use super::{
    auth::TokenSource,
    read_json,
    wire::{MessageRecord, PushResponse},
    FirebaseError,
};
use crate::infra::config::FirebaseConfig;

/// REST location of the message collection, without credentials.
pub(super) fn messages_url(config: &FirebaseConfig) -> Result<Url, FirebaseError> {
    let raw = format!(
        "{}/{}.json",
        config.database_url.trim_end_matches('/'),
        config.messages_path.trim_matches('/')
    );

    Url::parse(&raw).map_err(|error| FirebaseError::InvalidUrl(error.to_string()))
}

/// Appends a record under a server-generated push key and returns the key.
pub(super) async fn push(
    client: &Client,
    tokens: &TokenSource,
    collection: &Url,
    record: &MessageRecord,
) -> Result<String, FirebaseError> {
    let token = tokens.id_token().await?;
    let mut url = collection.clone();
    url.query_pairs_mut().append_pair("auth", &token);

    let response = client
        .post(url)
        .json(record)
        .send()
        .await
        .map_err(FirebaseError::transport)?;
    let pushed: PushResponse = read_json(response).await?;

    Ok(pushed.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_url_joins_database_and_path() {
        let config = FirebaseConfig {
            database_url: "https://demo-default-rtdb.firebaseio.com/".to_owned(),
            messages_path: "/rooms/general/".to_owned(),
            ..FirebaseConfig::default()
        };

        let url = messages_url(&config).expect("url should parse");

        assert_eq!(
            url.as_str(),
            "https://demo-default-rtdb.firebaseio.com/rooms/general.json"
        );
    }

    #[test]
    fn missing_database_url_is_invalid() {
        let config = FirebaseConfig::default();

        assert!(matches!(
            messages_url(&config),
            Err(FirebaseError::InvalidUrl(_))
        ));
    }
}
