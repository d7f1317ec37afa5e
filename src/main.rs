use actix_web::{middleware::Logger, web, App, HttpServer};
use color_eyre::eyre;

use hookgate::{config::Config, hooks, Gatekeeper};

#[actix_web::main]
async fn main() -> eyre::Result<()> {
    dotenv::dotenv().ok();
    color_eyre::install()?;
    tracing_log::LogTracer::init()?;
    tracing::subscriber::set_global_default(tracing_subscriber::fmt().finish())?;

    let config = Config::from_env()?;
    let gatekeeper = Gatekeeper::from_options(config.policy_options())?;
    tracing::info!(
        "Listening for webhooks on {}{} with {:?}",
        config.bind,
        config.path,
        gatekeeper.policy()
    );

    let Config {
        bind,
        path,
        payload_limit,
        ..
    } = config;
    HttpServer::new(move || {
        App::new()
            .app_data(web::PayloadConfig::new(payload_limit))
            .wrap(Logger::default())
            .service(gatekeeper.resource(&path).to(hooks::push_hook))
    })
    .bind(bind)?
    .run()
    .await
    .map_err(Into::into)
}
