use anyhow::anyhow;
use log::info;
use rouille::{Request, Response, input::multipart::get_multipart_input};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    io::Read,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{
    config::{HttpConfig, UploadsConfig},
    domain::{
        id::TrackId,
        track::{NewTrack, Track, TrackUpdate},
    },
    http::error::ApiError,
    storage::{error::StorageError, operations::Storage, uploads},
};

pub struct HttpServer {
    storage: Arc<Mutex<Storage>>,
    uploads: UploadsConfig,
    pub config: HttpConfig,
}

impl HttpServer {
    pub fn new(storage: Storage, config: HttpConfig, uploads: UploadsConfig) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            uploads,
            config,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let response = rouille::router!(request,
            (GET) (/) => {
                Response::text("Hello, Ai!")
            },

            (GET) (/tracks) => {
                Self::respond(self.list_tracks())
            },
            (POST) (/tracks) => {
                Self::respond(self.add_track(request))
            },

            (GET) (/tracks/{id: String}) => {
                Self::respond(self.get_track(&id))
            },
            (PUT) (/tracks/{id: String}) => {
                Self::respond(self.update_track(&id, request))
            },
            (DELETE) (/tracks/{id: String}) => {
                Self::respond(self.delete_track(&id))
            },

            (POST) (/upload_library) => {
                Self::respond(self.upload_library(request))
            },
            _ => Response::empty_404()
        );

        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    fn respond(result: Result<Response, ApiError>) -> Response {
        result.unwrap_or_else(ApiError::into_response)
    }

    fn lock_storage(&self) -> Result<MutexGuard<'_, Storage>, ApiError> {
        self.storage.lock().map_err(|e| {
            StorageError::Internal(anyhow!("Could not access track storage under lock: {e}"))
                .into()
        })
    }

    fn parse_id(id: &str) -> Result<TrackId, ApiError> {
        id.parse::<TrackId>()
            .map_err(|_| StorageError::InvalidTrackId.into())
    }

    fn read_payload(request: &Request) -> Result<TrackPayload, ApiError> {
        rouille::input::json_input(request)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
    }

    fn message(text: &str) -> Response {
        Response::json(&json!({ "message": text }))
    }

    fn list_tracks(&self) -> Result<Response, ApiError> {
        let tracks = self.lock_storage()?.list_tracks()?;
        let body = tracks
            .iter()
            .map(TrackResponse::from_domain)
            .collect::<Vec<_>>();
        Ok(Response::json(&body))
    }

    fn get_track(&self, id: &str) -> Result<Response, ApiError> {
        let id = Self::parse_id(id)?;
        let track = self.lock_storage()?.get_track(id)?;
        Ok(Response::json(&TrackResponse::from_domain(&track)))
    }

    fn add_track(&self, request: &Request) -> Result<Response, ApiError> {
        let payload = Self::read_payload(request)?;
        let (name, description) = payload
            .name_and_description()
            .ok_or_else(|| ApiError::BadRequest("Name and description are required.".into()))?;

        let id = self.lock_storage()?.add_track(&NewTrack {
            name,
            description: Some(description),
            bpm: payload.bpm,
            track_key: payload.track_key,
            tags: payload.tags,
        })?;

        Ok(
            Response::json(&json!({ "message": "Track added successfully.", "id": id }))
                .with_status_code(201),
        )
    }

    fn update_track(&self, id: &str, request: &Request) -> Result<Response, ApiError> {
        let id = Self::parse_id(id)?;
        let payload = Self::read_payload(request)?;
        let (name, description) = payload
            .name_and_description()
            .ok_or_else(|| ApiError::BadRequest("Name and description are required".into()))?;

        self.lock_storage()?.update_track(
            id,
            &TrackUpdate {
                name,
                description,
                bpm: payload.bpm,
                track_key: payload.track_key,
                tags: payload.tags,
            },
        )?;

        Ok(Self::message("Track updated successfully"))
    }

    fn delete_track(&self, id: &str) -> Result<Response, ApiError> {
        let id = Self::parse_id(id)?;
        self.lock_storage()?.delete_track(id)?;
        Ok(Self::message("Track deleted successfully"))
    }

    /// expects a multipart form with the library file in the `file` field
    fn upload_library(&self, request: &Request) -> Result<Response, ApiError> {
        let file = Self::read_file_part(request)?;
        self.store_upload(file)
    }

    /// First part named `file` that carries a filename.
    ///
    /// The part's content type is ignored, `text/xml` parts count as files too.
    fn read_file_part(request: &Request) -> Result<Option<UploadedFile>, ApiError> {
        let mut multipart = get_multipart_input(request).map_err(|e| {
            log::debug!("upload rejected: {e}");
            ApiError::BadRequest("No file part in the request".into())
        })?;

        while let Some(mut field) = multipart.next() {
            if &*field.headers.name != "file" {
                continue;
            }
            let Some(filename) = field.headers.filename.clone() else {
                continue;
            };

            let mut data = Vec::new();
            field
                .data
                .read_to_end(&mut data)
                .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?;

            return Ok(Some(UploadedFile { filename, data }));
        }

        Ok(None)
    }

    fn store_upload(&self, file: Option<UploadedFile>) -> Result<Response, ApiError> {
        let file =
            file.ok_or_else(|| ApiError::BadRequest("No file part in the request".into()))?;

        if file.filename.is_empty() {
            return Err(ApiError::BadRequest("No selected file".into()));
        }

        uploads::save_library(&self.uploads.dir, &file.filename, &file.data)?;
        Ok(Self::message("File uploaded successfully"))
    }
}

/// file part of a multipart upload
#[derive(Debug)]
struct UploadedFile {
    filename: String,
    data: Vec<u8>,
}

/// JSON body accepted by `POST /tracks` and `PUT /tracks/{id}`
#[derive(Debug, Default, Deserialize)]
struct TrackPayload {
    name: Option<String>,
    description: Option<String>,
    bpm: Option<f64>,
    track_key: Option<String>,
    tags: Option<String>,
}

impl TrackPayload {
    /// both fields, only if neither is missing or empty
    fn name_and_description(&self) -> Option<(String, String)> {
        let name = self.name.clone().filter(|s| !s.is_empty())?;
        let description = self.description.clone().filter(|s| !s.is_empty())?;
        Some((name, description))
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct TrackResponse {
    id: i64,
    name: String,
    description: Option<String>,
    bpm: Option<f64>,
    track_key: Option<String>,
    tags: Option<String>,
}

impl TrackResponse {
    fn from_domain(track: &Track) -> Self {
        Self {
            id: track.id.get(),
            name: track.name.clone(),
            description: track.description.clone(),
            bpm: track.bpm,
            track_key: track.track_key.clone(),
            tags: track.tags.clone(),
        }
    }
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
