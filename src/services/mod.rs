pub mod admin_service;
pub mod disk_storage;
pub mod document_service;
pub mod gemini_service;
pub mod helpchat_service;
pub mod json_store;
pub mod prompts;
pub mod signed_url;
pub mod token_service;
