#[cfg(feature = "multi-thread")]
use geoip_proxy::config::ConfigThreads;
use geoip_proxy::config::{load_config, load_dotenv, Config};
use geoip_proxy::database::Databases;
use geoip_proxy::loader::spawn_loader;
use geoip_proxy::service::{log_response, make_error_response, GeoIpService};

use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Server};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

async fn async_main(config: Config, dotenv_error: Option<dotenvy::Error>) -> anyhow::Result<()> {
    simple_logger::init_with_level(config.log_level)?;
    if let Some(e) = dotenv_error {
        log::warn!("Failed to load .env file: {}", e);
    }

    let databases = Arc::new(Databases::new());
    let interval: Duration = config.retry_interval.into();
    let loader = spawn_loader(config.database_path.clone(), interval, databases.clone())?;
    if config.wait_for_databases {
        tokio::task::spawn_blocking(move || loader.join())
            .await?
            .map_err(|_| anyhow::anyhow!("database loader panicked"))?;
    }

    let geoip_service = Arc::new(GeoIpService::from_config(&config, databases));

    let make_service = make_service_fn(move |connection: &AddrStream| {
        let socket_remote_ip = Some(connection.remote_addr().ip());
        let geoip_service = geoip_service.clone();
        let service = service_fn(move |request: Request<Body>| {
            let geoip_service = geoip_service.clone();
            async move {
                let response = geoip_service
                    .response(socket_remote_ip, &request)
                    .unwrap_or_else(make_error_response);
                log_response(socket_remote_ip, &request, &response);
                Ok::<_, Infallible>(response)
            }
        });
        async move { Ok::<_, Infallible>(service) }
    });

    let host = config.socket_addr();
    let server = Server::try_bind(&host)?.serve(make_service);
    log::info!("GeoIP proxy is listening on {host}");

    if let Err(e) = server.await {
        log::error!("server error: {}", e);
    }
    Err(anyhow::anyhow!("server exited"))
}

fn main() -> anyhow::Result<()> {
    let dotenv_error = load_dotenv(None).err();

    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref())?;

    #[cfg(feature = "multi-thread")]
    let mut runtime_builder = match config.threads {
        ConfigThreads::Custom(threads) => match threads.into() {
            1 => tokio::runtime::Builder::new_current_thread(),
            threads => {
                let mut builder = tokio::runtime::Builder::new_multi_thread();
                builder.worker_threads(threads);
                builder
            }
        },
        ConfigThreads::Cores => tokio::runtime::Builder::new_multi_thread(),
    };
    #[cfg(not(feature = "multi-thread"))]
    let mut runtime_builder = tokio::runtime::Builder::new_current_thread();
    let runtime = runtime_builder.enable_all().build()?;

    let result = runtime.block_on(async_main(config, dotenv_error));
    runtime.shutdown_background();
    result
}
