pub mod auth;
pub mod document;
pub mod installation;
pub mod lead;
pub mod payment;
pub mod stages;
