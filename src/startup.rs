use std::net::TcpListener;

use actix_web::{
    dev::Server,
    middleware::Logger,
    web::{self, Data},
    App, HttpServer,
};

use crate::{
    pipeline::Pipeline,
    routes::{default_route, lead_route},
    routes::lead_route::{ResultsCache, SharedApiKey},
};

pub fn run(
    listener: TcpListener,
    pipeline: Pipeline,
    shared_api_key: String,
) -> Result<Server, std::io::Error> {
    let pipeline = web::Data::new(pipeline);
    let shared_api_key = web::Data::new(SharedApiKey(shared_api_key));
    let results: Data<ResultsCache> = web::Data::new(ResultsCache::default());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::default)
            .service(lead_route::run_generator)
            .service(lead_route::get_results)
            .app_data(pipeline.clone())
            .app_data(shared_api_key.clone())
            .app_data(results.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
