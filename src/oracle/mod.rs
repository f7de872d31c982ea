//! Verifiable randomness: VRF proofs and a local coordinator

pub mod coordinator;
pub mod vrf;

pub use coordinator::{
    LocalVrfCoordinator, RandomWordsRequested, RandomnessDelivery, Subscription, DEFAULT_BASE_FEE,
};
pub use vrf::{VrfProofBundle, VrfProver};
