pub mod access;
pub mod engine;
pub mod events;
pub mod ledger;
pub mod pending_pool;
pub mod types;

pub use access::AccessControl;
pub use engine::{predict_hackable_answer, Game};
pub use events::{EmittedEvent, EventEmitter, GameEvent};
pub use ledger::GameLedger;
pub use pending_pool::{PendingRequest, PendingRequests};
pub use types::*;
