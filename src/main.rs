mod helpers;

use std::convert::Infallible;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;

use log::{error, info};

use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use helpers::azure_storage::{get_azure_store, DataLake};
use helpers::config::Config;
use helpers::ingest::{IngestError, IngestSettings, Ingestor};

/// Files one posted device report. Any failure becomes a bare 500, success a bare 200.
async fn handler<B>(ingestor: Arc<Ingestor>, req: Request<B>) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Display,
{
    let invocation = ingestor.start_invocation();
    info!("[{}] AzureTriggerYggio was started.", invocation.id);

    if req.method() != Method::POST {
        info!("[{}] Rejected {} request", invocation.id, req.method());
        return Ok(empty_response(StatusCode::METHOD_NOT_ALLOWED));
    }

    let result = match req.into_body().collect().await {
        Ok(collected) => ingestor.ingest(&invocation, &collected.to_bytes()).await,
        Err(e) => Err(IngestError::Body(e.to_string())),
    };

    match result {
        Ok(_) => {
            info!("[{}] AzureTriggerYggio finished.", invocation.id);
            Ok(empty_response(StatusCode::OK))
        }
        Err(e) => {
            error!("[{}] AzureTriggerYggio failed: {}", invocation.id, e);
            Ok(empty_response(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    info!(
        "--- Data Lake: {}/{} (timezone {}, encoding {:?})",
        config.sas_url.endpoint, config.sas_url.container_name, config.timezone, config.encoding
    );

    let azure_store = get_azure_store(&config.sas_url)?;
    let ingestor = Arc::new(Ingestor::new(
        DataLake::new(azure_store),
        IngestSettings {
            timezone: config.timezone,
            encoding: config.encoding,
        },
    ));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Listening on http://{}", addr);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let ingestor = ingestor.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| handler(ingestor.clone(), req));
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                error!("Error serving connection: {:?}", err);
            }
        });
    }
}
