use std::sync::Arc;

use roadbook_catalog::TripCatalog;
use roadbook_core::provider::PaymentProvider;
use roadbook_ledger::SeatLedger;
use roadbook_payment::PaymentFlow;
use roadbook_store::MemoryStore;
use roadbook_ticket::TicketFlow;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub store: MemoryStore,
    pub catalog: Arc<TripCatalog<MemoryStore>>,
    pub ledger: Arc<SeatLedger<MemoryStore>>,
    pub tickets: Arc<TicketFlow<MemoryStore>>,
    pub payments: Arc<PaymentFlow<MemoryStore>>,
    pub auth: AuthConfig,
}

impl AppState {
    /// Wire every workflow over one shared store.
    pub fn new(store: MemoryStore, provider: Arc<dyn PaymentProvider>, auth: AuthConfig) -> Self {
        let shared = Arc::new(store.clone());
        Self {
            store,
            catalog: Arc::new(TripCatalog::new(shared.clone())),
            ledger: Arc::new(SeatLedger::new(shared.clone())),
            tickets: Arc::new(TicketFlow::new(shared.clone())),
            payments: Arc::new(PaymentFlow::new(shared, provider)),
            auth,
        }
    }
}
