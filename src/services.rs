pub mod auth;
pub mod document_service;
pub mod installation_service;
pub mod lead_service;
pub mod payment_service;
pub mod user_service;
