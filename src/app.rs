use std::sync::Arc;

use actix_web::web;
use sqlx::PgPool;

use crate::config::{FeeConfig, GatewayConfig};
use crate::middleware::{json_config, path_config, query_config};
use crate::modules::fee_rates::{self, FeeRateRepository, FeeRateService, PgFeeRateRepository};
use crate::modules::payments::{
    self, GatewayProfile, LedgerService, PaymentRepository, PgPaymentRepository,
    ReconciliationService, WebhookVerifier,
};
use crate::modules::reports::{self, ReportService};
use crate::modules::schools::{PgSchoolDirectory, SchoolDirectory};
use crate::modules::snapshots::{FeeSnapshotRecorder, FeeSnapshotRepository, PgFeeSnapshotRepository};

/// Storage collaborators the services are built from
#[derive(Clone)]
pub struct Stores {
    pub fee_rates: Arc<dyn FeeRateRepository>,
    pub schools: Arc<dyn SchoolDirectory>,
    pub payments: Arc<dyn PaymentRepository>,
    pub snapshots: Arc<dyn FeeSnapshotRepository>,
}

impl Stores {
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            fee_rates: Arc::new(PgFeeRateRepository::new(pool.clone())),
            schools: Arc::new(PgSchoolDirectory::new(pool.clone())),
            payments: Arc::new(PgPaymentRepository::new(pool.clone())),
            snapshots: Arc::new(PgFeeSnapshotRepository::new(pool.clone())),
        }
    }
}

/// Services shared by every worker
#[derive(Clone)]
pub struct AppServices {
    pub fee_rates: Arc<FeeRateService>,
    pub reconciliation: Arc<ReconciliationService>,
    pub ledger: Arc<LedgerService>,
    pub reports: Arc<ReportService>,
    pub verifier: Arc<WebhookVerifier>,
}

impl AppServices {
    pub fn new(stores: Stores, fees: &FeeConfig, gateway: &GatewayConfig) -> Self {
        let recorder = FeeSnapshotRecorder::new(fees.default_percentage, fees.mode);

        Self {
            fee_rates: Arc::new(FeeRateService::new(
                stores.fee_rates.clone(),
                stores.schools.clone(),
            )),
            reconciliation: Arc::new(ReconciliationService::new(
                stores.payments.clone(),
                stores.fee_rates.clone(),
                recorder,
                GatewayProfile::new(gateway.success_code.clone()),
            )),
            ledger: Arc::new(LedgerService::new(stores.payments.clone())),
            reports: Arc::new(ReportService::new(stores.snapshots.clone())),
            verifier: Arc::new(WebhookVerifier::new(gateway.webhook_secret.clone())),
        }
    }

    /// Register shared state, extractor configs and every API route
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.fee_rates.clone()))
            .app_data(web::Data::new(self.reconciliation.clone()))
            .app_data(web::Data::new(self.ledger.clone()))
            .app_data(web::Data::new(self.reports.clone()))
            .app_data(web::Data::new(self.verifier.clone()))
            .app_data(json_config())
            .app_data(query_config())
            .app_data(path_config())
            .configure(fee_rates::controllers::configure)
            .configure(payments::controllers::configure)
            .configure(reports::controllers::configure);
    }
}
