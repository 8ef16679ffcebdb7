use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Responder};
use prometheus::{Encoder, TextEncoder};
use tracing::error;

use crate::util::Context;

pub async fn serve_metrics(request: HttpRequest) -> impl Responder {
    let Some(context) = request.app_data::<Arc<Context>>() else {
        return HttpResponse::InternalServerError().finish();
    };
    // cache gauges are only computed when someone asks for them
    context.metrics.observe_cache(&context.cache.stats());

    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = context.metrics.registry.gather();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok().content_type(encoder.format_type()).body(buffer)
}
