use std::path::Path;

use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Client, Url,
};

use super::{auth::TokenSource, read_json, wire::UploadResponse, FirebaseError};
use crate::infra::config::FirebaseConfig;

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

pub(super) fn object_name(prefix: &str, file_name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        file_name.to_owned()
    } else {
        format!("{prefix}/{file_name}")
    }
}

pub(super) fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|extension| extension.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("heic") => "image/heic",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

fn bucket_objects_url(storage_url: &str, bucket: &str) -> Result<Url, FirebaseError> {
    let mut url =
        Url::parse(storage_url).map_err(|error| FirebaseError::InvalidUrl(error.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| FirebaseError::InvalidUrl("storage url cannot hold a path".to_owned()))?
        .pop_if_empty()
        .extend(["v0", "b", bucket, "o"]);

    Ok(url)
}

pub(super) fn upload_url(config: &FirebaseConfig, object_name: &str) -> Result<Url, FirebaseError> {
    let mut url = bucket_objects_url(&config.storage_url, &config.storage_bucket)?;
    url.query_pairs_mut().append_pair("name", object_name);
    Ok(url)
}

/// Public download location; the object name is a single escaped segment.
pub(super) fn download_url(
    storage_url: &str,
    bucket: &str,
    object_name: &str,
    download_token: Option<&str>,
) -> Result<Url, FirebaseError> {
    let mut url = bucket_objects_url(storage_url, bucket)?;
    url.path_segments_mut()
        .map_err(|()| FirebaseError::InvalidUrl("storage url cannot hold a path".to_owned()))?
        .push(object_name);

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("alt", "media");
        if let Some(token) = download_token {
            query.append_pair("token", token);
        }
    }

    Ok(url)
}

pub(super) async fn upload(
    client: &Client,
    tokens: &TokenSource,
    config: &FirebaseConfig,
    object_name: &str,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<String, FirebaseError> {
    let token = tokens.id_token().await?;

    let response = client
        .post(upload_url(config, object_name)?)
        .header(AUTHORIZATION, format!("Firebase {token}"))
        .header(CONTENT_TYPE, content_type)
        .body(bytes)
        .send()
        .await
        .map_err(FirebaseError::transport)?;
    let uploaded: UploadResponse = read_json(response).await?;

    let download_token = uploaded
        .download_tokens
        .as_deref()
        .and_then(|tokens| tokens.split(',').next())
        .filter(|token| !token.is_empty());

    download_url(
        &config.storage_url,
        &uploaded.bucket,
        &uploaded.name,
        download_token,
    )
    .map(String::from)
}
