mod cli;
mod demo;
mod infra;
mod routes;
mod server;
mod store;

use wellform::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
