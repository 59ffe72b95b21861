//! Video upload.
//!
//! One upload runs the same five calls whatever the transfer mode:
//!
//! 1. `videos.upload.getQuota`: fail early if the file does not fit
//! 2. `videos.upload.getTicket`: single-use ticket, endpoint and size limit
//! 3. data transfer to the ticket endpoint, streamed or chunked
//! 4. `videos.upload.verifyChunks`: compare sizes, mismatches are advisory
//! 5. `videos.upload.complete`: yields the video id
//!
//! No step is retried.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::Method;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::request::text_of;
use crate::transport::HttpRequest;
use crate::{Client, Error, IntegrityError, Result, TransportError, UploadMode};

const GET_QUOTA: &str = "vimeo.videos.upload.getQuota";
const GET_TICKET: &str = "vimeo.videos.upload.getTicket";
const VERIFY_CHUNKS: &str = "vimeo.videos.upload.verifyChunks";
const COMPLETE: &str = "vimeo.videos.upload.complete";

const TICKET_ID_KEY: &str = "ticket_id";
const CHUNK_ID_KEY: &str = "chunk_id";

/// Type used for paths whose extension says nothing.
const FALLBACK_PATH_MIME: &str = "video";
const FALLBACK_READER_MIME: &str = "application/octet-stream";
const CHUNK_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    /// Replace the file of this existing video instead of creating one.
    pub replace_id: Option<String>,
    /// Overrides the type inferred from the file name.
    pub mime_type: Option<String>,
}

impl UploadOptions {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn replace<T: Into<String>>(self, video_id: T) -> Self {
        UploadOptions {
            replace_id: Some(video_id.into()),
            ..self
        }
    }

    pub fn mime_type<T: Into<String>>(self, mime_type: T) -> Self {
        UploadOptions {
            mime_type: Some(mime_type.into()),
            ..self
        }
    }
}

/// A finished upload. `integrity_errors` lists chunks whose size on the
/// server differs from what was sent; the video exists regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub video_id: String,
    pub integrity_errors: Vec<IntegrityError>,
}

/// Server-issued handle for one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Ticket {
    id: String,
    endpoint: String,
    max_file_size: u64,
}

impl Ticket {
    fn from_response(response: &Value) -> Result<Self> {
        let ticket = &response["ticket"];
        let id = non_empty(&ticket["id"]).ok_or_else(|| malformed(GET_TICKET, "ticket.id"))?;
        let endpoint = non_empty(&ticket["endpoint"])
            .ok_or_else(|| malformed(GET_TICKET, "ticket.endpoint"))?;
        let max_file_size = u64_of(&ticket["max_file_size"])
            .ok_or_else(|| malformed(GET_TICKET, "ticket.max_file_size"))?;
        Ok(Ticket {
            id,
            endpoint,
            max_file_size,
        })
    }
}

/// A range of the source as it went out.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SentChunk {
    id: String,
    size: u64,
}

impl Client {
    /// Upload the file at `path`.
    ///
    /// The type is inferred from the extension, `video` when unknown.
    pub fn upload_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        options: UploadOptions,
    ) -> Result<UploadOutcome> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("no usable file name in {}", path.display()),
                )
            })?
            .to_string();
        let mime_type = options
            .mime_type
            .clone()
            .or_else(|| guess_mime(&file_name))
            .unwrap_or_else(|| FALLBACK_PATH_MIME.to_string());
        let file = File::open(path)?;
        self.upload_source(file, &file_name, &mime_type, options.replace_id.as_deref())
    }

    /// Upload from any seekable source, named `file_name` on the service.
    pub fn upload_reader<R: Read + Seek>(
        &mut self,
        reader: R,
        file_name: &str,
        options: UploadOptions,
    ) -> Result<UploadOutcome> {
        let mime_type = options
            .mime_type
            .clone()
            .or_else(|| guess_mime(file_name))
            .unwrap_or_else(|| FALLBACK_READER_MIME.to_string());
        self.upload_source(reader, file_name, &mime_type, options.replace_id.as_deref())
    }

    fn upload_source<R: Read + Seek>(
        &mut self,
        mut source: R,
        file_name: &str,
        mime_type: &str,
        replace_id: Option<&str>,
    ) -> Result<UploadOutcome> {
        let size = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;

        tracing::debug!(file_name, size, "checking upload quota");
        let quota = self.call(GET_QUOTA, Vec::<(String, String)>::new())?;
        let free = u64_of(&quota["user"]["upload_space"]["free"])
            .ok_or_else(|| malformed(GET_QUOTA, "user.upload_space.free"))?;
        if free < size {
            return Err(Error::QuotaExceeded { free, size });
        }

        tracing::debug!("requesting upload ticket");
        let response = self
            .method(GET_TICKET)
            .optional_param("video_id", replace_id)
            .cache(false)
            .send_json()?;
        let ticket = Ticket::from_response(&response)?;
        if size > ticket.max_file_size {
            return Err(Error::SizeExceeded {
                max: ticket.max_file_size,
                size,
            });
        }

        let mode = self.config().upload_mode;
        let sent = match mode {
            UploadMode::Streaming => {
                self.put_stream(&mut source, size, mime_type, &ticket)?
            }
            UploadMode::Chunked { chunk_size } => {
                self.post_chunks(&mut source, chunk_size, &ticket)?
            }
        };

        tracing::debug!(ticket = %ticket.id, "verifying chunks");
        let verify = self
            .method(VERIFY_CHUNKS)
            .param(TICKET_ID_KEY, ticket.id.as_str())
            .cache(false)
            .send_json()?;
        let integrity_errors = compare_chunks(&reported_chunks(&verify), &sent);
        for e in &integrity_errors {
            tracing::warn!("upload integrity: {}", e);
        }

        tracing::debug!(ticket = %ticket.id, "completing upload");
        let complete = self
            .method(COMPLETE)
            .param("filename", file_name)
            .param(TICKET_ID_KEY, ticket.id.as_str())
            .cache(false)
            .send_json()?;
        let video_id = non_empty(&complete["ticket"]["video_id"])
            .ok_or_else(|| malformed(COMPLETE, "ticket.video_id"))?;

        tracing::info!(video_id = %video_id, "upload complete");
        Ok(UploadOutcome {
            video_id,
            integrity_errors,
        })
    }

    /// Single PUT of the whole file.
    fn put_stream<R: Read>(
        &self,
        source: &mut R,
        size: u64,
        mime_type: &str,
        ticket: &Ticket,
    ) -> Result<Vec<SentChunk>> {
        let mut body = Vec::with_capacity(size as usize);
        source.read_to_end(&mut body)?;
        let sent = body.len() as u64;

        tracing::debug!(endpoint = %ticket.endpoint, size = sent, "streaming file");
        let request = HttpRequest::new(Method::PUT, ticket.endpoint.as_str())
            .header(CONTENT_LENGTH, sent.to_string())
            .header(CONTENT_TYPE, mime_type)
            .body(body);
        let response = self.transport().send(request)?;
        if !response.is_success() {
            return Err(TransportError::Status {
                status: response.status,
                body: response.text(),
            }
            .into());
        }
        Ok(vec![SentChunk {
            id: "0".to_string(),
            size: sent,
        }])
    }

    /// One signed POST per `chunk_size` bytes, each staged in a temp file.
    fn post_chunks<R: Read>(
        &mut self,
        source: &mut R,
        chunk_size: u64,
        ticket: &Ticket,
    ) -> Result<Vec<SentChunk>> {
        let chunk_size = chunk_size.max(1);
        let mut sent = Vec::new();
        for index in 0u64.. {
            let mut staged = NamedTempFile::new()?;
            let size = io::copy(&mut source.by_ref().take(chunk_size), &mut staged)?;
            if size == 0 && index > 0 {
                release(staged);
                break;
            }
            let id = index.to_string();
            let result = self.post_chunk(&mut staged, &id, size, ticket);
            release(staged);
            result?;
            sent.push(SentChunk { id, size });
            if size < chunk_size {
                break;
            }
        }
        Ok(sent)
    }

    fn post_chunk(
        &mut self,
        staged: &mut NamedTempFile,
        id: &str,
        size: u64,
        ticket: &Ticket,
    ) -> Result<()> {
        staged.flush()?;
        let file = staged.as_file_mut();
        file.seek(SeekFrom::Start(0))?;
        let mut body = Vec::with_capacity(size as usize);
        file.read_to_end(&mut body)?;

        tracing::debug!(chunk = id, size, "posting chunk");
        self.request(Method::POST, ticket.endpoint.as_str())
            .param(TICKET_ID_KEY, ticket.id.as_str())
            .param(CHUNK_ID_KEY, id)
            .payload(CHUNK_MIME, body)
            .cache(false)
            .send()?;
        Ok(())
    }
}

/// Delete a staged chunk. Failures are logged so they never hide the
/// transfer result.
fn release(staged: NamedTempFile) {
    let path = staged.path().to_path_buf();
    if let Err(e) = staged.close() {
        tracing::warn!("failed to remove chunk file {}: {e}", path.display());
    }
}

/// Chunks as listed by `verifyChunks`: one object or an array of them.
fn reported_chunks(response: &Value) -> Vec<SentChunk> {
    let chunk = &response["ticket"]["chunks"]["chunk"];
    let items = match chunk {
        Value::Array(items) => items.iter().collect::<Vec<_>>(),
        Value::Object(_) => vec![chunk],
        _ => Vec::new(),
    };
    items
        .into_iter()
        .map(|item| SentChunk {
            id: text_of(&item["id"]),
            size: u64_of(&item["size"]).unwrap_or(0),
        })
        .collect()
}

/// Expected vs. actually transferred bytes, per chunk id. A lone chunk on
/// each side is compared directly, as the streaming endpoint may number it
/// differently.
fn compare_chunks(reported: &[SentChunk], sent: &[SentChunk]) -> Vec<IntegrityError> {
    if let ([server], [local]) = (reported, sent) {
        if server.size == local.size {
            return Vec::new();
        }
        return vec![IntegrityError {
            chunk_id: server.id.clone(),
            reported: server.size,
            uploaded: local.size,
        }];
    }

    let mut errors = Vec::new();
    for local in sent {
        let server_size = reported
            .iter()
            .find(|c| c.id == local.id)
            .map_or(0, |c| c.size);
        if server_size != local.size {
            errors.push(IntegrityError {
                chunk_id: local.id.clone(),
                reported: server_size,
                uploaded: local.size,
            });
        }
    }
    for server in reported {
        if !sent.iter().any(|c| c.id == server.id) {
            errors.push(IntegrityError {
                chunk_id: server.id.clone(),
                reported: server.size,
                uploaded: 0,
            });
        }
    }
    errors
}

fn guess_mime(file_name: &str) -> Option<String> {
    mime_guess::from_path(file_name)
        .first_raw()
        .map(str::to_string)
}

fn malformed(method: &str, field: &'static str) -> Error {
    Error::MalformedResponse {
        method: method.to_string(),
        field,
    }
}

fn non_empty(value: &Value) -> Option<String> {
    Some(text_of(value)).filter(|s| !s.is_empty())
}

fn u64_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
