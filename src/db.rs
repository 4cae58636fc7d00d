pub mod user_repo;
pub use user_repo::UserRepository;
pub mod vendor_repo;
pub use vendor_repo::VendorRepository;
pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod document_repo;
pub use document_repo::DocumentRepository;
pub mod payment_repo;
pub use payment_repo::PaymentRepository;
pub mod installation_repo;
pub use installation_repo::InstallationRepository;
