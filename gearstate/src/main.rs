use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use actix_web::{middleware, rt, web, App, HttpServer};
use git_version::git_version;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use gearstate_lib::http::{Dispatcher, Request, ReqwestTransport};
use gearstate_lib::model::CurrentUserPayload;
use gearstate_lib::util::config::Config;
use gearstate_lib::util::metrics::Metrics;
use gearstate_lib::{Cache, EventApplier};

use crate::util::{serve_metrics, Context, ProcessStatus};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_VERSION: &str = git_version!(fallback = "unknown");

mod feed;
mod util;

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!("Gearstate v{} ({}) initializing!", VERSION, GIT_VERSION);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("GearPool")
        .build()?;
    let result = runtime.block_on(async_main());

    if result.is_ok() {
        info!("Main loop exited gracefully, giving the last tasks 30 seconds to finish cleaning up");
        runtime.shutdown_timeout(Duration::from_secs(30));
        info!("Shutdown complete!");
        return Ok(());
    }

    result
}

async fn async_main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = Config::from_env()?;
    let uuid = Uuid::new_v4();
    let metrics = Arc::new(Metrics::new(&uuid.to_string())?);
    let cache = Arc::new(Cache::new());

    let transport = ReqwestTransport::new(&config.api_base, config.token.as_deref(), config.request_timeout)?;
    let dispatcher = Dispatcher::new(transport, config.max_retries).with_metrics(metrics.clone());
    let context = Arc::new(Context::new(cache.clone(), dispatcher, metrics.clone(), uuid));
    info!("Instance id: {}", context.uuid);

    let c = context.clone();
    let metrics_addr = config.metrics_addr.clone();
    // start webserver on different thread
    thread::spawn(move || {
        let c2 = c.clone();
        let sys = rt::System::new();

        let srv = HttpServer::new(move || {
            App::new()
                .app_data(c.clone())
                .wrap(middleware::Logger::default())
                .route("/metrics", web::get().to(serve_metrics))
        })
        .bind(&metrics_addr)?
        .workers(1) // this is just metrics, doesn't need to be able to handle much at all
        .run();

        let res = sys.block_on(srv);
        if let Err(e) = &res {
            error!("Metrics server failed: {}", e);
        }

        // this shuts down on sigterm (actix installs its own signal handlers), take the rest down along with it
        c2.shutdown();

        res
    });

    if config.token.is_some() {
        let me: CurrentUserPayload = context
            .dispatcher
            .execute_json(&"/users/@me".into(), &Request::get("/users/@me"), &context.shutdown)
            .await?;
        info!("Token belongs to {} ({})", me.username, me.id);
    } else {
        warn!("No BOT_TOKEN configured, not talking to the api");
    }

    let mut applier = EventApplier::new(cache).with_metrics(metrics);
    context.set_status(ProcessStatus::Running);

    let summary = feed::run(&mut applier, config.event_file.as_deref(), &context.shutdown).await?;
    let stats = context.cache.stats();
    info!(
        "Event feed finished: {} changed, {} suppressed, {} conditions, {} skipped. Cache holds {} guilds, {} channels and {} members",
        summary.changed,
        summary.suppressed,
        summary.conditions,
        summary.skipped,
        context.cache.guild_ids().len(),
        stats.guild_channels + stats.private_channels,
        stats.members
    );

    context.shutdown();
    Ok(())
}
