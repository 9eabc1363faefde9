use crate::config::Config;
use crate::database::Databases;
use crate::header_tools::observed_ip;
use crate::ip_pattern::looks_like_ip;
use crate::lookup::{lookup, GeoLocation, LookupError};

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use std::borrow::Cow;
use std::net::IpAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Method {0} is not allowed")]
    MethodNotAllowed(Method),
    #[error("Path {0:?} is not found")]
    UnknownPath(String),
    #[error("Path segment {0:?} is not valid UTF-8")]
    InvalidPath(String),
    #[error(r#"Internal server error: "{0:?}""#)]
    Json(#[from] serde_json::Error),
    #[error(r#"Internal server error: "{0:?}""#)]
    InternalServerError(#[from] hyper::http::Error),
}

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    ClientIp,
    Favicon,
    Single(&'a str),
    Bulk(&'a str),
    Unknown,
}

impl<'a> From<&'a str> for Route<'a> {
    fn from(path: &'a str) -> Self {
        match path {
            "/" => Self::ClientIp,
            "/favicon.ico" => Self::Favicon,
            _ => {
                let Some(rest) = path.strip_prefix('/') else {
                    return Self::Unknown;
                };
                match rest.split_once('/') {
                    None => Self::Single(rest),
                    Some(("bulk", ips)) if !ips.contains('/') => Self::Bulk(ips),
                    Some(_) => Self::Unknown,
                }
            }
        }
    }
}

#[derive(Serialize)]
struct ClientIp {
    ip: Option<IpAddr>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl From<LookupError> for ErrorBody {
    fn from(error: LookupError) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum BulkEntry {
    Found(GeoLocation),
    Failed(ErrorBody),
}

impl From<Result<GeoLocation, LookupError>> for BulkEntry {
    fn from(result: Result<GeoLocation, LookupError>) -> Self {
        match result {
            Ok(location) => Self::Found(location),
            Err(error) => Self::Failed(error.into()),
        }
    }
}

fn lookup_status(error: LookupError) -> StatusCode {
    match error {
        LookupError::InvalidFormat => StatusCode::BAD_REQUEST,
        LookupError::NotFound => StatusCode::NOT_FOUND,
        LookupError::DatabasesNotLoaded => StatusCode::SERVICE_UNAVAILABLE,
        LookupError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn json_response<T: Serialize>(
    status: StatusCode,
    value: &T,
) -> Result<Response<Body>, ServiceError> {
    let body = serde_json::to_vec(value)?;
    let response = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(body.into())?;
    Ok(response)
}

fn decode_segment(segment: &str) -> Result<Cow<'_, str>, ServiceError> {
    urlencoding::decode(segment).map_err(|_| ServiceError::InvalidPath(segment.to_owned()))
}

pub struct GeoIpService {
    ip_headers: Vec<String>,
    ip_headers_recursive: bool,
    databases: Arc<Databases>,
}

impl GeoIpService {
    pub fn new(databases: Arc<Databases>) -> Self {
        Self {
            ip_headers: vec![],
            ip_headers_recursive: true,
            databases,
        }
    }

    pub fn from_config(config: &Config, databases: Arc<Databases>) -> Self {
        Self {
            ip_headers: config.ip_headers.clone(),
            ip_headers_recursive: config.ip_headers_recursive,
            databases,
        }
    }

    /// Shape check, then the merged lookup. A panic is contained to this one address.
    fn checked_lookup(&self, ip: &str) -> Result<GeoLocation, LookupError> {
        if !looks_like_ip(ip) {
            return Err(LookupError::InvalidFormat);
        }
        catch_unwind(AssertUnwindSafe(|| lookup(ip, &self.databases))).unwrap_or_else(|_| {
            log::error!("lookup of {ip:?} panicked");
            Err(LookupError::InternalError)
        })
    }

    fn single(&self, ip: &str) -> Result<Response<Body>, ServiceError> {
        let ip = decode_segment(ip)?;
        match self.checked_lookup(&ip) {
            Ok(location) => json_response(StatusCode::OK, &location),
            Err(error) => json_response(lookup_status(error), &ErrorBody::from(error)),
        }
    }

    fn bulk(&self, ips: &str) -> Result<Response<Body>, ServiceError> {
        let ips = decode_segment(ips)?;
        let entries: Vec<BulkEntry> = ips
            .split(',')
            .map(|ip| self.checked_lookup(ip.trim()).into())
            .collect();
        json_response(StatusCode::OK, &entries)
    }

    pub fn response(
        &self,
        socket_ip_addr: Option<IpAddr>,
        request: &Request<Body>,
    ) -> Result<Response<Body>, ServiceError> {
        if request.method() != Method::GET {
            return Err(ServiceError::MethodNotAllowed(request.method().clone()));
        }
        let path = request.uri().path();
        match Route::from(path) {
            Route::ClientIp => {
                let ip = observed_ip(
                    request.headers(),
                    &self.ip_headers,
                    self.ip_headers_recursive,
                    socket_ip_addr,
                );
                json_response(StatusCode::OK, &ClientIp { ip })
            }
            Route::Favicon => Ok(Response::builder()
                .status(StatusCode::NO_CONTENT)
                .body(Body::empty())?),
            Route::Single(ip) => self.single(ip),
            Route::Bulk(ips) => self.bulk(ips),
            Route::Unknown => Err(ServiceError::UnknownPath(path.to_owned())),
        }
    }
}

pub fn make_error_response(error: ServiceError) -> Response<Body> {
    let status = match &error {
        ServiceError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        ServiceError::UnknownPath(_) => StatusCode::NOT_FOUND,
        ServiceError::InvalidPath(_) => StatusCode::BAD_REQUEST,
        ServiceError::Json(_) | ServiceError::InternalServerError(_) => {
            log::error!("{error}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let message = match status {
        StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_owned(),
        _ => error.to_string(),
    };
    let body = serde_json::json!({ "error": message }).to_string();
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

pub fn log_response(
    socket_ip_addr: Option<IpAddr>,
    request: &Request<Body>,
    response: &Response<Body>,
) {
    log::info!(
        "{} {} {} {}",
        socket_ip_addr.map_or_else(|| "-".to_owned(), |ip| ip.to_string()),
        request.method(),
        request.uri(),
        response.status(),
    );
}
