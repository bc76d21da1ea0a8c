use rocket::http::Method;
use rocket_cors::{AllowedHeaders, AllowedOrigins, Cors, CorsOptions};

/// CORS policy for the browser front end that renders the board.
pub fn create_cors(allowed_origins: &[String]) -> Result<Cors, rocket_cors::Error> {
    CorsOptions {
        allowed_origins: AllowedOrigins::some_exact(allowed_origins),
        allowed_methods: [Method::Get, Method::Post, Method::Options]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: AllowedHeaders::some(&["Accept", "Content-Type"]),
        ..Default::default()
    }
    .to_cors()
}
