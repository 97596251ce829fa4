//! HTTP client for the sharing backend

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use freeshare_session::SessionContext;

use crate::backend::ShareBackend;
use crate::disposition::filename_from_disposition;
use crate::error::ApiError;
use crate::types::{
    AuthRequest, AuthResponse, DownloadCredentials, DownloadedFile, FileRecord, ShareMetadata,
    UploadRequest, UploadResponse,
};
use crate::Result;

pub struct ApiClient {
    client: Client,
    base_url: Url,
    /// Identity attached to every request; anonymous sends no header
    session: SessionContext,
}

impl ApiClient {
    pub fn new(base_url: &str, session: SessionContext) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;

        Ok(Self {
            client: Client::new(),
            base_url,
            session,
        })
    }

    /// Same connection pool, different identity
    pub fn with_session(&self, session: SessionContext) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            session,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST /files/upload`
    pub async fn upload(&self, upload: UploadRequest) -> Result<UploadResponse> {
        let file_name = upload.file_name.clone();
        let size = upload.bytes.len();

        let mut form = Form::new()
            .part("file", Part::bytes(upload.bytes).file_name(upload.file_name))
            .text("encrypt", upload.encrypt.to_string());

        if upload.encrypt {
            if let Some(password) = upload.password {
                form = form.text("password", password);
            }
        }

        form = form.text("requires2FA", upload.requires_2fa.to_string());

        if let Some(email) = self.session.email().filter(|_| self.session.is_registered()) {
            form = form.text("userEmail", email.to_string());
        }

        let url = self.endpoint(&["files", "upload"])?;
        let response = self
            .request(Method::POST, url)
            .multipart(form)
            .send()
            .await?;

        let uploaded: UploadResponse = handle_response(response).await?;

        tracing::info!(
            file_name = %file_name,
            size,
            shared_link = %uploaded.shared_link,
            "Uploaded file"
        );

        Ok(uploaded)
    }

    /// `GET /files/my-files?userEmail=`
    pub async fn my_files(&self) -> Result<Vec<FileRecord>> {
        let email = match self.session.email() {
            Some(email) if self.session.is_registered() => email.to_string(),
            _ => return Err(ApiError::NotSignedIn),
        };

        let mut url = self.endpoint(&["files", "my-files"])?;
        url.query_pairs_mut().append_pair("userEmail", &email);

        let response = self.request(Method::GET, url).send().await?;
        handle_response(response).await
    }

    /// `POST /auth/login`
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        self.authenticate("login", email, password).await
    }

    /// `POST /auth/register`
    pub async fn register(&self, email: &str, password: &str) -> Result<AuthResponse> {
        self.authenticate("register", email, password).await
    }

    async fn authenticate(
        &self,
        action: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse> {
        let url = self.endpoint(&["auth", action])?;
        let response = self
            .request(Method::POST, url)
            .json(&AuthRequest { email, password })
            .send()
            .await?;

        let auth: AuthResponse = handle_response(response).await?;
        tracing::info!(email = %auth.email, action, "Authenticated");
        Ok(auth)
    }

    fn download_request(
        &self,
        shared_link: &str,
        credentials: &DownloadCredentials,
    ) -> Result<RequestBuilder> {
        let mut url = self.endpoint(&["files", "download", shared_link])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(password) = &credentials.password {
                query.append_pair("password", password);
            }
            if let Some(code) = &credentials.two_factor_code {
                query.append_pair("twoFactorCode", code);
            }
        }
        // An empty query_pairs_mut() still leaves a trailing '?'
        if url.query() == Some("") {
            url.set_query(None);
        }

        Ok(self.request(Method::GET, url))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.session.bearer() {
            Some(bearer) => builder.header(AUTHORIZATION, bearer),
            None => builder,
        }
    }
}

#[async_trait]
impl ShareBackend for ApiClient {
    async fn fetch_share(&self, shared_link: &str) -> Result<ShareMetadata> {
        let url = self.endpoint(&["files", "share", shared_link])?;
        let response = self.request(Method::GET, url).send().await?;
        handle_response(response).await
    }

    async fn download(
        &self,
        shared_link: &str,
        credentials: &DownloadCredentials,
    ) -> Result<DownloadedFile> {
        let response = self
            .download_request(shared_link, credentials)?
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let filename = header_str(&response, CONTENT_DISPOSITION.as_str())
            .and_then(|value| filename_from_disposition(&value));
        let content_type = header_str(&response, CONTENT_TYPE.as_str());
        let bytes = response.bytes().await?.to_vec();

        tracing::debug!(
            shared_link = %shared_link,
            size = bytes.len(),
            "Downloaded shared file"
        );

        Ok(DownloadedFile {
            bytes,
            filename,
            content_type,
        })
    }

    async fn delete_file(&self, id_or_link: &str) -> Result<()> {
        let url = self.endpoint(&["files", "delete", id_or_link])?;
        let response = self.request(Method::DELETE, url).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        tracing::info!(target_id = %id_or_link, "Deleted file");
        Ok(())
    }
}

impl Clone for ApiClient {
    fn clone(&self) -> Self {
        self.with_session(self.session.clone())
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim().trim_end_matches('/'))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}

fn header_str(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

async fn error_from_response(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ApiError::from_response_body(status, &body)
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }

    response
        .json()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}
