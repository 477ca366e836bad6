pub mod loaders;
pub mod personnel;
pub mod registry;
pub mod request;

pub use loaders::{load_requests, parse_requests};
pub use personnel::{PersonnelCandidate, PersonnelRecord, Role};
pub use registry::{
    CategoryRecord, CheckinPayload, ItemCode, ItemRecord, PersonRecord, SubmitResponse,
};
pub use request::{CareType, RegistrationRequest};
