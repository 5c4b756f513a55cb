pub mod ledger_controller;
pub mod webhook_controller;

use actix_web::web;

/// Configure payment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("/webhook", web::post().to(webhook_controller::receive_callback))
            .route(
                "/assignments/{id}/transactions",
                web::get().to(ledger_controller::list_assignment_transactions),
            ),
    );
}
