pub mod cascade_service;
pub mod validation;
