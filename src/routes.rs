use actix_cors::Cors;
use actix_web::{guard, web};

use crate::config::{AllowedOrigins, CorsPolicy, PreflightMode};
use crate::handlers::{self, PreflightOrigin};

pub fn cors(policy: &CorsPolicy) -> Cors {
    match &policy.origins {
        AllowedOrigins::Any => Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header(),
        // Unlisted origins are still served, just without CORS headers.
        AllowedOrigins::List(origins) => origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allow_any_header()
            .block_on_origin_mismatch(false)
            .max_age(3600),
    }
}

pub fn register(cfg: &mut web::ServiceConfig, policy: &CorsPolicy, liveness_route: bool) {
    if policy.preflight == PreflightMode::ManualHeaders {
        let origin = match &policy.origins {
            AllowedOrigins::List(origins) => origins.first().cloned(),
            AllowedOrigins::Any => None,
        }
        .unwrap_or_else(|| "*".to_string());

        // Registered outside the CORS-wrapped scope: the middleware must not
        // validate or rewrite manual preflight responses.
        cfg.app_data(web::Data::new(PreflightOrigin(origin)));
        cfg.service(
            web::resource("/predict")
                .guard(guard::Options())
                .to(handlers::preflight),
        );
    }

    let mut scope = web::scope("")
        .service(web::resource("/predict").route(web::post().to(handlers::predict)));
    if liveness_route {
        scope = scope.route("/", web::get().to(handlers::index));
    }

    cfg.service(scope.wrap(cors(policy)));
}
